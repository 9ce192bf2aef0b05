//! Coaching - sends chat turns to the coach with a habit snapshot

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{ChatError, ChatMessage, ChatSession};
use crate::gateway::{CoachGateway, GatewayError};
use crate::store::HabitStore;

/// Assistant turn recorded when the coach cannot be reached
pub fn surrogate_reply(err: &GatewayError) -> String {
    format!("Sorry, I couldn't reach your coach right now ({}). Please try again.", err)
}

/// Clears Pending if a send is dropped before its reply is recorded
struct InFlight {
    session: Arc<Mutex<ChatSession>>,
    done: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        warn!("Coaching::send: cancelled before the coach replied");
        if let Ok(mut session) = self.session.try_lock() {
            session.abandon();
            return;
        }
        // Lock is held elsewhere; finish the reset on the runtime
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let session = self.session.clone();
            handle.spawn(async move {
                session.lock().await.abandon();
            });
        }
    }
}

/// Ties a chat session to the habit store and the coach gateway
#[derive(Clone)]
pub struct Coaching {
    session: Arc<Mutex<ChatSession>>,
    store: HabitStore,
    gateway: Arc<CoachGateway>,
}

impl Coaching {
    pub fn new(store: HabitStore, gateway: Arc<CoachGateway>) -> Self {
        Self {
            session: Arc::new(Mutex::new(ChatSession::new())),
            store,
            gateway,
        }
    }

    pub fn store(&self) -> &HabitStore {
        &self.store
    }

    /// Send a user turn and wait for the assistant turn
    ///
    /// Gateway failures become an assistant surrogate, so the returned
    /// message is always the assistant's. Fails with `Busy` while another
    /// send is in flight. Dropping the future returns the session to Idle
    /// and keeps the user turn.
    pub async fn send(&self, text: &str) -> Result<ChatMessage, ChatError> {
        debug!(text_len = text.len(), "Coaching::send: called");
        self.session.lock().await.begin(text)?;
        let mut in_flight = InFlight {
            session: self.session.clone(),
            done: false,
        };

        let context = match self.store.snapshot().await {
            Ok(context) => Some(context),
            Err(e) => {
                warn!(error = %e, "Coaching::send: snapshot failed, sending without context");
                None
            }
        };

        let reply = match self.gateway.complete(text, context.as_ref()).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Coaching::send: coach unavailable");
                surrogate_reply(&e)
            }
        };

        let message = self.session.lock().await.finish(&reply);
        in_flight.done = true;
        info!(reply_len = message.content.len(), "Coaching::send: reply recorded");
        Ok(message)
    }

    pub async fn is_pending(&self) -> bool {
        self.session.lock().await.is_pending()
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.session.lock().await.transcript().to_vec()
    }

    pub async fn clear(&self) -> Result<usize, ChatError> {
        self.session.lock().await.clear()
    }
}
