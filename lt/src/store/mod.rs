//! Habit storage with actor pattern
//!
//! HabitStore owns the in-memory HabitBook and processes messages via
//! channels, serializing all mutations.

mod book;
mod manager;
mod messages;

pub use book::HabitBook;
pub use manager::HabitStore;
pub use messages::{StoreCommand, StoreError, StoreResponse};
