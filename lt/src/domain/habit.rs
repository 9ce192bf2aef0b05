//! Habit record and derived statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::id::HabitId;

/// How often a habit is expected to be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Custom,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "d" => Ok(Self::Daily),
            "weekly" | "w" => Ok(Self::Weekly),
            "custom" | "c" => Ok(Self::Custom),
            _ => Err(format!("Unknown frequency: {}. Use: daily, weekly, or custom", s)),
        }
    }
}

/// A tracked recurring action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub frequency: Frequency,
    /// Count of completions; never decremented
    pub streak: u32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Time of the most recent false -> true transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Habit {
    /// Create a fresh habit with streak 0 and not completed
    ///
    /// The caller is responsible for validating the name.
    pub fn new(id: HabitId, name: impl Into<String>, frequency: Frequency) -> Self {
        let name = name.into();
        debug!(%id, %name, %frequency, "Habit::new: called");
        Self {
            id,
            name,
            description: None,
            frequency,
            streak: 0,
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Attach a free-form description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Flip the completed flag
    ///
    /// The streak grows only on the false -> true edge. Un-completing leaves
    /// the streak alone. Returns the new completed value.
    pub fn toggle(&mut self) -> bool {
        self.completed = !self.completed;
        if self.completed {
            self.streak += 1;
            self.completed_at = Some(Utc::now());
            debug!(id = %self.id, streak = self.streak, "Habit::toggle: completed");
        } else {
            debug!(id = %self.id, streak = self.streak, "Habit::toggle: uncompleted");
        }
        self.completed
    }

    /// Clear the completed flag for a new tracking period
    ///
    /// Returns true if the flag was set before the call.
    pub fn reset_period(&mut self) -> bool {
        let was_completed = self.completed;
        self.completed = false;
        was_completed
    }
}

/// Statistics derived from the current habit collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    pub total: usize,
    pub completed_today: usize,
    pub best_streak: u32,
}

impl HabitStats {
    pub fn from_habits(habits: &[Habit]) -> Self {
        Self {
            total: habits.len(),
            completed_today: habits.iter().filter(|h| h.completed).count(),
            best_streak: habits.iter().map(|h| h.streak).max().unwrap_or(0),
        }
    }
}
