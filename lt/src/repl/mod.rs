//! Interactive coaching REPL
//!
//! Slash commands manage habits in the in-memory store; any other line is
//! sent to the coach along with a snapshot of those habits.

mod commands;
mod session;

pub use commands::SlashCommand;
pub use session::ReplSession;

use std::sync::Arc;

use eyre::Result;

use crate::chat::Coaching;
use crate::config::Config;
use crate::gateway::CoachGateway;
use crate::store::HabitStore;

/// Run the interactive REPL
///
/// This is the main entry point for `lt coach`.
pub async fn run_interactive(config: &Config) -> Result<()> {
    // Validate credentials early
    let resolved = config.coach.resolve()?;

    let gateway = CoachGateway::from_config(&resolved).map_err(|e| eyre::eyre!("Failed to create coach: {}", e))?;
    let coaching = Coaching::new(HabitStore::spawn(), Arc::new(gateway));

    let mut session = ReplSession::new(coaching, resolved.model.clone());
    let result = session.run().await;
    session.shutdown().await;
    result
}
