//! REPL session management

use std::io::{self, Write};

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use super::SlashCommand;
use crate::chat::{ChatError, Coaching};
use crate::domain::Habit;
use crate::llm::Role;

/// Interactive coaching session
pub struct ReplSession {
    coaching: Coaching,
    model: String,
}

impl ReplSession {
    /// Create a new REPL session
    pub fn new(coaching: Coaching, model: String) -> Self {
        Self { coaching, model }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        // Create readline editor for proper line editing
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(SlashCommand::parse(input)).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.process_user_input(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Stop the habit store actor
    pub async fn shutdown(&self) {
        if let Err(e) = self.coaching.store().shutdown().await {
            debug!(error = %e, "shutdown: store already stopped");
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "lifetrack coach".bright_cyan().bold());
        println!("Model: {}", self.model);
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    pub(crate) async fn handle_slash_command(&mut self, command: SlashCommand) -> SlashResult {
        debug!(?command, "handle_slash_command: called");
        let store = self.coaching.store();

        match command {
            SlashCommand::Help => self.print_help(),
            SlashCommand::Quit => return SlashResult::Quit,
            SlashCommand::Clear => match self.coaching.clear().await {
                Ok(_) => println!("{}", "Conversation cleared.".dimmed()),
                Err(e) => print_error(&e),
            },
            SlashCommand::History => self.print_history().await,
            SlashCommand::List => match store.list().await {
                Ok(habits) => print_habits(&habits),
                Err(e) => print_error(&e),
            },
            SlashCommand::Stats => match store.stats().await {
                Ok(stats) => {
                    println!(
                        "  {} habits, {} completed, best streak {}",
                        stats.total.to_string().bright_white(),
                        stats.completed_today.to_string().bright_green(),
                        stats.best_streak.to_string().bright_yellow()
                    );
                }
                Err(e) => print_error(&e),
            },
            SlashCommand::Add { name, frequency } => match store.create(&name, frequency).await {
                Ok(habit) => println!("{} {} ({})", "Added".green(), habit.name.bright_white(), habit.id),
                Err(e) => print_error(&e),
            },
            SlashCommand::Done { reference } => {
                let result = match store.resolve(&reference).await {
                    Ok(id) => store.toggle(&id).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(habit) if habit.completed => println!(
                        "{} {} (streak {})",
                        "\u{2714}".green(),
                        habit.name.bright_white(),
                        habit.streak
                    ),
                    Ok(habit) => println!("{} {} marked not done", "\u{25cb}".dimmed(), habit.name),
                    Err(e) => print_error(&e),
                }
            }
            SlashCommand::Remove { reference } => {
                let result = match store.resolve(&reference).await {
                    Ok(id) => store.delete(&id).await.map(|_| id),
                    Err(e) => Err(e),
                };
                match result {
                    Ok(id) => println!("{} {}", "Removed".yellow(), id),
                    Err(e) => print_error(&e),
                }
            }
            SlashCommand::Rollover { frequency } => match store.rollover(frequency).await {
                Ok(count) => println!("{} {} habit(s) for a new period", "Reset".cyan(), count),
                Err(e) => print_error(&e),
            },
            SlashCommand::Usage(usage) => println!("{} {}", "Usage:".yellow(), usage),
            SlashCommand::Unknown(cmd) => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }

        SlashResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Habits:".bright_cyan());
        println!("  {:28} Track a new habit", "/add <name> [frequency]".yellow());
        println!("  {:28} Toggle a habit done/not done", "/done <habit>".yellow());
        println!("  {:28} Stop tracking a habit", "/rm <habit>".yellow());
        println!("  {:28} List habits", "/list".yellow());
        println!("  {:28} Show totals and best streak", "/stats".yellow());
        println!("  {:28} Start a new period", "/rollover [frequency]".yellow());
        println!();
        println!("{}", "Session:".bright_cyan());
        println!("  {:28} Show conversation history", "/history".yellow());
        println!("  {:28} Clear conversation history", "/clear".yellow());
        println!("  {:28} Show this help", "/help".yellow());
        println!("  {:28} Exit the REPL", "/quit".yellow());
        println!();
        println!("Anything else is sent to your coach.");
        println!();
    }

    async fn print_history(&self) {
        let transcript = self.coaching.transcript().await;
        if transcript.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, msg) in transcript.iter().enumerate() {
            let role = match msg.role {
                Role::User => "You".bright_green(),
                Role::Assistant => "Coach".bright_blue(),
            };
            let preview: String = msg.content.chars().take(60).collect();
            let ellipsis = if msg.content.chars().count() > 60 { "..." } else { "" };
            println!(
                "  {}. [{}] {}: {}{}",
                i + 1,
                msg.timestamp.format("%H:%M"),
                role,
                preview,
                ellipsis
            );
        }
        println!();
    }

    /// Send free text to the coach and print the reply
    async fn process_user_input(&mut self, input: &str) {
        print!("{}", "thinking...".dimmed());
        let _ = io::stdout().flush();

        let result = self.coaching.send(input).await;
        print!("\r{:12}\r", "");

        match result {
            Ok(reply) => {
                println!("{}", reply.content.bright_blue());
                println!();
            }
            Err(ChatError::Busy) => println!("{}", "Still waiting on the previous answer.".yellow()),
            Err(e) => {
                warn!(error = %e, "process_user_input: send failed");
                print_error(&e);
            }
        }
    }
}

fn print_habits(habits: &[Habit]) {
    if habits.is_empty() {
        println!("{}", "No habits yet. Try /add <name>.".dimmed());
        return;
    }
    for habit in habits {
        let mark = if habit.completed {
            "\u{2714}".green()
        } else {
            "\u{25cb}".dimmed()
        };
        println!(
            "  {} {:<24} {:<8} streak {:>3}  {}",
            mark,
            habit.name,
            habit.frequency.to_string(),
            habit.streak,
            habit.id.to_string().dimmed()
        );
    }
}

fn print_error(err: &dyn std::fmt::Display) {
    println!("{} {}", "Error:".red(), err);
}

/// Result of handling a slash command
pub(crate) enum SlashResult {
    Continue,
    Quit,
}
