//! lifetrack - habit tracking with an AI coach
//!
//! Habits live in an in-memory store owned by an actor task. A chat session
//! sends the user's messages to an OpenAI-compatible coach together with a
//! snapshot of those habits. Speech gateways proxy transcription and
//! synthesis to a Hugging Face style inference API.
//!
//! # Modules
//!
//! - [`domain`] - Habit, frequency, ids and the coach context snapshot
//! - [`store`] - HabitBook collection and the HabitStore actor
//! - [`chat`] - Chat session state machine and the Coaching orchestrator
//! - [`llm`] - LLM client trait and OpenAI-compatible implementation
//! - [`gateway`] - Coach, transcription and synthesis gateways
//! - [`server`] - HTTP endpoints for the gateways
//! - [`repl`] - Interactive coaching session
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod chat;
pub mod cli;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod llm;
pub mod repl;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use chat::{ChatError, ChatMessage, ChatSession, Coaching};
pub use config::{CoachConfig, Config, ConfigError, ServerConfig, SpeechConfig};
pub use domain::{CoachContext, Frequency, Habit, HabitId, HabitStats};
pub use gateway::{CoachGateway, GatewayError, HuggingFaceClient, SynthesizedAudio, Synthesizer, Transcriber};
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, OpenAIClient, create_client};
pub use store::{HabitBook, HabitStore, StoreError};
