//! Slash command parsing for the coaching REPL

use crate::domain::Frequency;

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Quit,
    Clear,
    History,
    List,
    Stats,
    Add { name: String, frequency: Frequency },
    Done { reference: String },
    Remove { reference: String },
    Rollover { frequency: Option<Frequency> },
    /// Known command with bad arguments; carries the usage line
    Usage(&'static str),
    Unknown(String),
}

/// Trailing word that names a frequency, matched as a full word only
fn frequency_word(word: &str) -> Option<Frequency> {
    match word.to_lowercase().as_str() {
        "daily" => Some(Frequency::Daily),
        "weekly" => Some(Frequency::Weekly),
        "custom" => Some(Frequency::Custom),
        _ => None,
    }
}

impl SlashCommand {
    /// Parse a line starting with '/'
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };

        match cmd {
            "/help" | "/h" => Self::Help,
            "/quit" | "/q" | "/exit" => Self::Quit,
            "/clear" | "/c" => Self::Clear,
            "/history" => Self::History,
            "/list" | "/ls" => Self::List,
            "/stats" => Self::Stats,
            "/add" | "/a" => {
                let words: Vec<&str> = rest.split_whitespace().collect();
                let Some((last, head)) = words.split_last() else {
                    return Self::Usage("/add <name> [daily|weekly|custom]");
                };
                match frequency_word(last) {
                    Some(frequency) if !head.is_empty() => Self::Add {
                        name: head.join(" "),
                        frequency,
                    },
                    _ => Self::Add {
                        name: words.join(" "),
                        frequency: Frequency::Daily,
                    },
                }
            }
            "/done" | "/d" | "/toggle" => match rest {
                "" => Self::Usage("/done <habit>"),
                reference => Self::Done {
                    reference: reference.to_string(),
                },
            },
            "/rm" | "/delete" => match rest {
                "" => Self::Usage("/rm <habit>"),
                reference => Self::Remove {
                    reference: reference.to_string(),
                },
            },
            "/rollover" => match rest {
                "" => Self::Rollover { frequency: None },
                word => match word.parse::<Frequency>() {
                    Ok(frequency) => Self::Rollover {
                        frequency: Some(frequency),
                    },
                    Err(_) => Self::Usage("/rollover [daily|weekly|custom]"),
                },
            },
            other => Self::Unknown(other.to_string()),
        }
    }
}
