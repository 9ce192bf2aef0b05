//! Domain types for lifetrack
//!
//! Core domain types: Habit, HabitStats, CoachContext and habit IDs.

mod context;
mod habit;
mod id;

pub use context::{COACH_CONTEXT_VERSION, CoachContext, HabitSummary};
pub use habit::{Frequency, Habit, HabitStats};
pub use id::{HabitId, IdResolver, generate_id};
