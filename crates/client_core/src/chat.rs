use std::{cell::RefCell, rc::Rc};

use chrono::Utc;
use shared::domain::{ChatMessage, SessionId};
use tracing::{debug, info, warn};

use crate::{
    admission::{Admission, BusyFlag},
    BackendGateway,
};

/// Assistant text appended when the chat request itself fails.
pub const CHAT_FALLBACK_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// Owns the append-only chat transcript of one session.
pub struct ChatController {
    gateway: Rc<dyn BackendGateway>,
    session_id: SessionId,
    transcript: RefCell<Vec<ChatMessage>>,
    draft: RefCell<String>,
    busy: BusyFlag,
}

impl ChatController {
    pub fn new(gateway: Rc<dyn BackendGateway>, session_id: SessionId) -> Self {
        Self {
            gateway,
            session_id,
            transcript: RefCell::new(Vec::new()),
            draft: RefCell::new(String::new()),
            busy: BusyFlag::new(),
        }
    }

    /// Fills an empty transcript with the server's history.
    ///
    /// The replace only happens if the transcript is still empty when the
    /// history arrives; messages sent in the meantime win.
    pub async fn load_history(&self) {
        if !self.transcript.borrow().is_empty() {
            debug!(session_id = %self.session_id, "chat: history already loaded, skipping fetch");
            return;
        }

        match self.gateway.fetch_history(&self.session_id).await {
            Ok(history) => {
                let mut transcript = self.transcript.borrow_mut();
                if transcript.is_empty() {
                    info!(
                        session_id = %self.session_id,
                        messages = history.len(),
                        "chat: history loaded"
                    );
                    *transcript = history;
                } else {
                    debug!(
                        session_id = %self.session_id,
                        local_messages = transcript.len(),
                        "chat: local messages arrived first, dropping fetched history"
                    );
                }
            }
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "chat: history unavailable");
            }
        }
    }

    pub async fn send_message(&self, text: &str) -> Admission {
        let text = text.trim();
        if text.is_empty() {
            return Admission::EmptyInput;
        }
        let Some(guard) = self.busy.try_acquire() else {
            debug!(session_id = %self.session_id, "chat: send rejected, request in flight");
            return Admission::Busy;
        };

        self.transcript
            .borrow_mut()
            .push(ChatMessage::user(text, Utc::now()));
        debug!(session_id = %self.session_id, chars = text.len(), "chat: message submitted");

        let reply = match self
            .gateway
            .submit_chat_message(&self.session_id, text)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "chat: reply failed");
                CHAT_FALLBACK_TEXT.to_string()
            }
        };

        self.transcript
            .borrow_mut()
            .push(ChatMessage::assistant(reply, Utc::now()));
        self.draft.borrow_mut().clear();
        drop(guard);
        Admission::Accepted
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        *self.draft.borrow_mut() = text.into();
    }

    pub fn draft(&self) -> String {
        self.draft.borrow().clone()
    }

    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }
}

#[cfg(test)]
#[path = "tests/chat_tests.rs"]
mod tests;
