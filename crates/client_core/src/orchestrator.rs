use std::rc::Rc;

use shared::domain::SessionId;
use tracing::info;

use crate::{
    admission::Admission,
    analysis::AnalysisController,
    chat::ChatController,
    session::create_session_id,
    types::{ChartImage, InteractionState},
    BackendGateway,
};

/// Chat and chart analysis for one anonymous session.
///
/// The two controllers share only the gateway handle and the session id, so
/// a pending chat reply never blocks an upload and vice versa.
pub struct InteractionOrchestrator {
    session_id: SessionId,
    chat: ChatController,
    analysis: AnalysisController,
}

impl InteractionOrchestrator {
    /// Starts a fresh session and loads its (normally empty) history.
    pub async fn new(gateway: Rc<dyn BackendGateway>) -> Self {
        Self::start(gateway, create_session_id(), false).await
    }

    /// Resumes a session whose id the caller already holds.
    pub async fn with_session(gateway: Rc<dyn BackendGateway>, session_id: SessionId) -> Self {
        Self::start(gateway, session_id, true).await
    }

    async fn start(gateway: Rc<dyn BackendGateway>, session_id: SessionId, resumed: bool) -> Self {
        info!(session_id = %session_id, resumed, "session: started");
        let orchestrator = Self {
            chat: ChatController::new(Rc::clone(&gateway), session_id.clone()),
            analysis: AnalysisController::new(gateway, session_id.clone()),
            session_id,
        };
        orchestrator.load_history().await;
        orchestrator
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub async fn load_history(&self) {
        self.chat.load_history().await;
    }

    pub async fn send_message(&self, text: &str) -> Admission {
        self.chat.send_message(text).await
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.chat.set_draft(text);
    }

    pub fn is_chat_busy(&self) -> bool {
        self.chat.is_busy()
    }

    pub async fn analyze(&self, image: ChartImage) -> Admission {
        self.analysis.analyze(image).await
    }

    pub fn snapshot(&self) -> InteractionState {
        InteractionState {
            session_id: self.session_id.to_string(),
            transcript: self.chat.transcript(),
            chat_busy: self.chat.is_busy(),
            draft: self.chat.draft(),
            analysis_result: self.analysis.current(),
            analysis_busy: self.analysis.is_busy(),
        }
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
