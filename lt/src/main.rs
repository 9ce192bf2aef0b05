//! lifetrack - habit tracking with an AI coach
//!
//! CLI entry point: interactive coaching, the HTTP gateway server and
//! one-shot speech commands.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result};
use tracing::{debug, info};

use lifetrack::cli::{Cli, Command, check_credentials, generate_after_help, get_log_path};
use lifetrack::config::Config;
use lifetrack::gateway::{CoachGateway, HuggingFaceClient, Synthesizer, Transcriber, retry_cold_start};
use lifetrack::repl;
use lifetrack::server::{self, AppState};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Build command with dynamic after_help that shows credential status
    let cmd = Cli::command().after_help(generate_after_help(&Config::default()));

    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        coach_model = %config.coach.model,
        transcription_model = %config.speech.transcription_model,
        "lifetrack loaded config"
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Serve { bind }) => cmd_serve(&config, bind).await,
        Some(Command::Transcribe { file }) => cmd_transcribe(&config, &file).await,
        Some(Command::Speak { text, output, data_uri }) => cmd_speak(&config, &text, &output, data_uri).await,
        Some(Command::Check) => cmd_check(&config),
        Some(Command::Coach) | None => {
            debug!("main: launching coaching REPL");
            repl::run_interactive(&config).await
        }
    }
}

/// Run the HTTP server until Ctrl-C
async fn cmd_serve(config: &Config, bind: Option<String>) -> Result<()> {
    debug!(?bind, "cmd_serve: called");
    let mut server_config = config.server.clone();
    if let Some(bind) = bind {
        server_config.bind = bind;
    }
    let addr = server_config.socket_addr()?;

    let coach = config.coach.resolve()?;
    let speech = config.speech.resolve()?;

    let speech_client = Arc::new(HuggingFaceClient::from_config(&speech)?);
    let state = AppState {
        coach: Arc::new(CoachGateway::from_config(&coach)?),
        transcriber: speech_client.clone(),
        synthesizer: speech_client,
    };

    println!("lifetrack serving on http://{}", addr);
    println!("  POST /api/ai-coach");
    println!("  POST /api/speech-to-text");
    println!("  POST /api/text-to-speech");
    server::serve(addr, state, server_config.max_body_bytes).await
}

/// Transcribe an audio file, waiting out model cold starts
async fn cmd_transcribe(config: &Config, file: &Path) -> Result<()> {
    debug!(?file, "cmd_transcribe: called");
    let speech = config.speech.resolve()?;
    let audio = fs::read(file).context(format!("Failed to read {}", file.display()))?;
    if audio.is_empty() {
        eyre::bail!("{} is empty", file.display());
    }

    let client = HuggingFaceClient::from_config(&speech)?;
    let text = retry_cold_start(
        || client.transcribe(audio.clone()),
        speech.cold_start_retries,
        speech.max_cold_start_wait(),
    )
    .await
    .context("Failed to transcribe audio")?;

    println!("{}", text.trim());
    Ok(())
}

/// Synthesize speech to a file, waiting out model cold starts
async fn cmd_speak(config: &Config, text: &str, output: &Path, data_uri: bool) -> Result<()> {
    debug!(text_len = text.len(), ?output, data_uri, "cmd_speak: called");
    if text.trim().is_empty() {
        eyre::bail!("Text is required");
    }
    let speech = config.speech.resolve()?;

    let client = HuggingFaceClient::from_config(&speech)?;
    let audio = retry_cold_start(
        || client.synthesize(text),
        speech.cold_start_retries,
        speech.max_cold_start_wait(),
    )
    .await
    .context("Failed to generate speech")?;

    let written = if data_uri {
        fs::write(output, audio.to_data_uri())
    } else {
        fs::write(output, &audio.bytes)
    };
    written.context(format!("Failed to write {}", output.display()))?;

    info!(bytes = audio.bytes.len(), mime = %audio.mime, ?output, "cmd_speak: wrote audio");
    println!("Wrote {} bytes of {} to {}", audio.bytes.len(), audio.mime, output.display());
    Ok(())
}

/// Validate configuration and report credential status
fn cmd_check(config: &Config) -> Result<()> {
    debug!("cmd_check: called");
    println!("Coach:  {} via {}", config.coach.model, config.coach.base_url);
    println!(
        "Speech: {} / {} via {}",
        config.speech.transcription_model, config.speech.synthesis_model, config.speech.base_url
    );
    println!("Server: {}", config.server.bind);
    for check in check_credentials(config) {
        let status = if check.available { "set" } else { "missing" };
        println!("  {:<8} {:<24} {}", check.service, check.env_var, status);
    }

    config.validate()?;
    println!("Configuration OK");
    Ok(())
}
