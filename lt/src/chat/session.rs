//! ChatSession - ordered transcript with a single in-flight request
//!
//! State machine: Idle -> Pending (begin) -> Idle (finish). A second
//! `begin` while Pending is rejected with `ChatError::Busy`.

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::ChatMessage;

/// Errors from chat session operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Your coach is still answering the previous message")]
    Busy,
}

#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    transcript: Vec<ChatMessage>,
    pending: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        let id = Uuid::now_v7();
        debug!(%id, "ChatSession::new: called");
        Self {
            id,
            transcript: Vec::new(),
            pending: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Append a user turn; blank text is rejected
    pub fn append_user(&mut self, text: &str) -> Result<ChatMessage, ChatError> {
        debug!(text_len = text.len(), "append_user: called");
        if text.trim().is_empty() {
            return Err(ChatError::Validation("Message is required".to_string()));
        }
        let message = ChatMessage::user(text);
        self.transcript.push(message.clone());
        Ok(message)
    }

    /// Append an assistant turn
    pub fn append_assistant(&mut self, text: &str) -> ChatMessage {
        debug!(text_len = text.len(), "append_assistant: called");
        let message = ChatMessage::assistant(text);
        self.transcript.push(message.clone());
        message
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Record the user turn and enter Pending
    pub fn begin(&mut self, text: &str) -> Result<ChatMessage, ChatError> {
        debug!(pending = self.pending, "begin: called");
        if self.pending {
            return Err(ChatError::Busy);
        }
        let message = self.append_user(text)?;
        self.pending = true;
        Ok(message)
    }

    /// Record the assistant turn and return to Idle
    pub fn finish(&mut self, reply: &str) -> ChatMessage {
        debug!(pending = self.pending, "finish: called");
        let message = self.append_assistant(reply);
        self.pending = false;
        message
    }

    /// Return to Idle without an assistant turn; the user turn stays
    pub fn abandon(&mut self) {
        debug!(pending = self.pending, "abandon: called");
        self.pending = false;
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn len(&self) -> usize {
        self.transcript.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// Drop the transcript; refused while a request is in flight
    pub fn clear(&mut self) -> Result<usize, ChatError> {
        if self.pending {
            return Err(ChatError::Busy);
        }
        let dropped = self.transcript.len();
        self.transcript.clear();
        debug!(dropped, "clear: transcript cleared");
        Ok(dropped)
    }
}
