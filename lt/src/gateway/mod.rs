//! Gateways to the external AI services
//!
//! Each gateway is a stateless adapter around one upstream call. They take
//! resolved configuration in their constructors and share no mutable state.

mod coach;
pub mod datauri;
mod error;
mod speech;

pub use coach::{CoachGateway, FALLBACK_REPLY, system_prompt};
pub use error::GatewayError;
pub use speech::{
    DEFAULT_COLD_START_ESTIMATE, HuggingFaceClient, SynthesizedAudio, Synthesizer, Transcriber, retry_cold_start,
};
