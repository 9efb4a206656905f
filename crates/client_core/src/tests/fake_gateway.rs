//! Scripted in-memory gateway used by the controller and orchestrator tests.

use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
};

use async_trait::async_trait;
use shared::domain::{ChartAnalysis, ChatMessage, SessionId};
use tokio::sync::oneshot;

use crate::{types::ChartImage, BackendGateway, GatewayError, GatewayResult};

struct Scripted<T> {
    outcome: GatewayResult<T>,
    gate: Option<oneshot::Receiver<()>>,
}

impl<T> Scripted<T> {
    async fn resolve(self) -> GatewayResult<T> {
        if let Some(gate) = self.gate {
            let _ = gate.await;
        }
        self.outcome
    }
}

/// Answers each call with the next scripted outcome for that operation.
///
/// Gated outcomes stay pending until the returned sender fires (or is
/// dropped), which lets tests observe state while a request is in flight.
/// Unscripted calls fall back to an empty history, an echo reply and a
/// numbered analysis.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    history: RefCell<VecDeque<Scripted<Vec<ChatMessage>>>>,
    replies: RefCell<VecDeque<Scripted<String>>>,
    analyses: RefCell<VecDeque<Scripted<ChartAnalysis>>>,
    history_calls: Cell<usize>,
    chat_calls: RefCell<Vec<String>>,
    analysis_calls: RefCell<Vec<String>>,
    session_ids: RefCell<Vec<SessionId>>,
}

fn gate() -> (oneshot::Sender<()>, Option<oneshot::Receiver<()>>) {
    let (tx, rx) = oneshot::channel();
    (tx, Some(rx))
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_history(&self, outcome: GatewayResult<Vec<ChatMessage>>) {
        self.history
            .borrow_mut()
            .push_back(Scripted { outcome, gate: None });
    }

    pub(crate) fn push_history_gated(
        &self,
        outcome: GatewayResult<Vec<ChatMessage>>,
    ) -> oneshot::Sender<()> {
        let (tx, gate) = gate();
        self.history.borrow_mut().push_back(Scripted { outcome, gate });
        tx
    }

    pub(crate) fn push_reply(&self, outcome: GatewayResult<String>) {
        self.replies
            .borrow_mut()
            .push_back(Scripted { outcome, gate: None });
    }

    pub(crate) fn push_reply_gated(&self, outcome: GatewayResult<String>) -> oneshot::Sender<()> {
        let (tx, gate) = gate();
        self.replies.borrow_mut().push_back(Scripted { outcome, gate });
        tx
    }

    pub(crate) fn push_analysis(&self, outcome: GatewayResult<ChartAnalysis>) {
        self.analyses
            .borrow_mut()
            .push_back(Scripted { outcome, gate: None });
    }

    pub(crate) fn push_analysis_gated(
        &self,
        outcome: GatewayResult<ChartAnalysis>,
    ) -> oneshot::Sender<()> {
        let (tx, gate) = gate();
        self.analyses.borrow_mut().push_back(Scripted { outcome, gate });
        tx
    }

    pub(crate) fn history_calls(&self) -> usize {
        self.history_calls.get()
    }

    pub(crate) fn chat_calls(&self) -> Vec<String> {
        self.chat_calls.borrow().clone()
    }

    pub(crate) fn analysis_calls(&self) -> Vec<String> {
        self.analysis_calls.borrow().clone()
    }

    pub(crate) fn session_ids(&self) -> Vec<SessionId> {
        self.session_ids.borrow().clone()
    }
}

#[async_trait(?Send)]
impl BackendGateway for ScriptedGateway {
    async fn fetch_history(&self, session_id: &SessionId) -> GatewayResult<Vec<ChatMessage>> {
        self.history_calls.set(self.history_calls.get() + 1);
        self.session_ids.borrow_mut().push(session_id.clone());
        let scripted = self.history.borrow_mut().pop_front();
        match scripted {
            Some(scripted) => scripted.resolve().await,
            None => Ok(Vec::new()),
        }
    }

    async fn submit_chat_message(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> GatewayResult<String> {
        self.chat_calls.borrow_mut().push(text.to_string());
        self.session_ids.borrow_mut().push(session_id.clone());
        let scripted = self.replies.borrow_mut().pop_front();
        match scripted {
            Some(scripted) => scripted.resolve().await,
            None => Ok(format!("reply to {text}")),
        }
    }

    async fn submit_image_for_analysis(
        &self,
        session_id: &SessionId,
        image: &ChartImage,
    ) -> GatewayResult<ChartAnalysis> {
        self.analysis_calls.borrow_mut().push(image.filename.clone());
        self.session_ids.borrow_mut().push(session_id.clone());
        let call = self.analysis_calls.borrow().len();
        let scripted = self.analyses.borrow_mut().pop_front();
        match scripted {
            Some(scripted) => scripted.resolve().await,
            None => Ok(sample_analysis(&format!("analysis #{call}"))),
        }
    }
}

pub(crate) fn sample_analysis(narrative: &str) -> ChartAnalysis {
    ChartAnalysis {
        detected_patterns: vec!["Doji".to_string(), "Hammer".to_string()],
        recommendations: HashMap::from([(
            "risk_management".to_string(),
            "Stop loss recommended".to_string(),
        )]),
        narrative: narrative.to_string(),
    }
}

pub(crate) fn transport_error() -> GatewayError {
    GatewayError::transport("connection refused")
}

pub(crate) fn chart(name: &str) -> ChartImage {
    ChartImage::new(name, vec![0x89, b'P', b'N', b'G'])
}
