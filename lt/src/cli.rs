//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// lifetrack - habit tracking with an AI coach
#[derive(Parser)]
#[command(
    name = "lt",
    about = "Habit tracker with an AI life coach, speech gateways and an HTTP API",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `coach`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the coach and speech endpoints over HTTP
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Start an interactive coaching session
    Coach,

    /// Transcribe an audio file
    Transcribe {
        /// Audio file to transcribe
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Synthesize speech from text
    Speak {
        /// Text to speak
        text: String,

        /// Where to write the audio
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Write a data: URI instead of raw audio bytes
        #[arg(long)]
        data_uri: bool,
    },

    /// Validate configuration and credentials
    Check,
}

/// Result of checking a required credential
pub struct CredentialCheck {
    pub service: &'static str,
    pub env_var: String,
    pub available: bool,
}

impl CredentialCheck {
    pub fn check(service: &'static str, env_var: &str) -> Self {
        debug!(service, env_var, "CredentialCheck::check: called");
        let available = std::env::var(env_var).is_ok_and(|v| !v.trim().is_empty());
        Self {
            service,
            env_var: env_var.to_string(),
            available,
        }
    }
}

/// Check the credentials named by the configuration
pub fn check_credentials(config: &Config) -> Vec<CredentialCheck> {
    debug!("check_credentials: called");
    vec![
        CredentialCheck::check("coach", &config.coach.api_key_env),
        CredentialCheck::check("speech", &config.speech.api_key_env),
    ]
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lifetrack")
        .join("logs")
        .join("lifetrack.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with credential checks and the log path
pub fn generate_after_help(config: &Config) -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Credentials:\n");
    for check in check_credentials(config) {
        let icon = if check.available { "\u{2705}" } else { "\u{274C}" };
        help.push_str(&format!("  {} {:<8} {}\n", icon, check.service, check.env_var));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));

    help
}
