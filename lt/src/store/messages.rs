//! Habit store messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{CoachContext, Frequency, Habit, HabitId, HabitStats};

/// Errors from habit store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Habit not found: {0}")]
    NotFound(String),

    #[error("Channel error")]
    ChannelError,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }
}

/// Response from habit store operations
pub type StoreResponse<T> = Result<T, StoreError>;

/// Commands sent to the HabitStore actor
#[derive(Debug)]
pub enum StoreCommand {
    Create {
        name: String,
        frequency: Frequency,
        description: Option<String>,
        reply: oneshot::Sender<StoreResponse<Habit>>,
    },
    Toggle {
        id: HabitId,
        reply: oneshot::Sender<StoreResponse<Habit>>,
    },
    Delete {
        id: HabitId,
        reply: oneshot::Sender<StoreResponse<()>>,
    },
    Get {
        id: HabitId,
        reply: oneshot::Sender<StoreResponse<Option<Habit>>>,
    },
    List {
        reply: oneshot::Sender<StoreResponse<Vec<Habit>>>,
    },
    Stats {
        reply: oneshot::Sender<StoreResponse<HabitStats>>,
    },
    Snapshot {
        reply: oneshot::Sender<StoreResponse<CoachContext>>,
    },
    Resolve {
        reference: String,
        reply: oneshot::Sender<StoreResponse<HabitId>>,
    },
    Rollover {
        frequency: Option<Frequency>,
        reply: oneshot::Sender<StoreResponse<usize>>,
    },

    // Shutdown
    Shutdown,
}
