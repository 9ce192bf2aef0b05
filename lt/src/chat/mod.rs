//! Coaching chat: transcript state machine and the send orchestration

mod coaching;
mod message;
mod session;

pub use coaching::{Coaching, surrogate_reply};
pub use message::ChatMessage;
pub use session::{ChatError, ChatSession};
