//! Coaching context snapshot
//!
//! A CoachContext is rebuilt from the habit collection for every coaching
//! request. The serialized form is versioned so clients and the coach prompt
//! agree on the shape.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::habit::{Frequency, Habit};

/// Current CoachContext schema version
pub const COACH_CONTEXT_VERSION: u32 = 1;

fn default_version() -> u32 {
    COACH_CONTEXT_VERSION
}

/// Snapshot of habit data sent alongside a coaching request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachContext {
    /// Schema version; absent on the wire means the current version
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub total_habits: usize,

    #[serde(default)]
    pub habits: Vec<HabitSummary>,
}

/// The subset of a habit the coach gets to see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub completed: bool,
}

impl From<&Habit> for HabitSummary {
    fn from(habit: &Habit) -> Self {
        Self {
            name: habit.name.clone(),
            description: habit.description.clone(),
            frequency: habit.frequency,
            streak: habit.streak,
            completed: habit.completed,
        }
    }
}

impl CoachContext {
    /// Build a context from the current habit collection
    pub fn from_habits(habits: &[Habit]) -> Self {
        debug!(habit_count = habits.len(), "CoachContext::from_habits: called");
        Self {
            version: COACH_CONTEXT_VERSION,
            total_habits: habits.len(),
            habits: habits.iter().map(HabitSummary::from).collect(),
        }
    }

    /// Reject payloads written against a schema this build does not know
    pub fn check_version(&self) -> Result<(), String> {
        if self.version == COACH_CONTEXT_VERSION {
            Ok(())
        } else {
            Err(format!(
                "Unsupported context version {} (expected {})",
                self.version, COACH_CONTEXT_VERSION
            ))
        }
    }

    /// Pretty-printed JSON embedded in the coach system prompt
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            debug!(error = %e, "CoachContext::to_prompt_json: serialization failed");
            "No context available".to_string()
        })
    }
}
