use async_trait::async_trait;
use shared::domain::{ChartAnalysis, ChatMessage, SessionId};
use thiserror::Error;

pub mod admission;
pub mod analysis;
pub mod chat;
pub mod config;
pub mod orchestrator;
pub mod session;
pub mod transport;
pub mod types;

pub use admission::Admission;
pub use analysis::{AnalysisController, ANALYSIS_FALLBACK_TEXT};
pub use chat::{ChatController, CHAT_FALLBACK_TEXT};
pub use orchestrator::InteractionOrchestrator;
pub use session::create_session_id;
pub use transport::HttpGateway;
pub use types::{ChartImage, InteractionState};

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The backend was unreachable or refused the request.
    #[error("transport failure: {message}")]
    Transport { message: String },
    /// The backend processed the request but could not analyze the input.
    #[error("analysis failed: {detail}")]
    Analysis { detail: String },
}

impl GatewayError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn analysis(detail: impl Into<String>) -> Self {
        Self::Analysis {
            detail: detail.into(),
        }
    }

    /// Human-readable detail supplied by the backend, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Analysis { detail } => Some(detail.as_str()),
            Self::Transport { .. } => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

/// Remote operations the orchestrator depends on.
///
/// Futures are driven on a single thread, so implementations are not
/// required to be `Send`.
#[async_trait(?Send)]
pub trait BackendGateway {
    async fn fetch_history(&self, session_id: &SessionId) -> GatewayResult<Vec<ChatMessage>>;
    async fn submit_chat_message(&self, session_id: &SessionId, text: &str)
        -> GatewayResult<String>;
    async fn submit_image_for_analysis(
        &self,
        session_id: &SessionId,
        image: &ChartImage,
    ) -> GatewayResult<ChartAnalysis>;
}

#[cfg(test)]
#[path = "tests/fake_gateway.rs"]
pub(crate) mod fake_gateway;
