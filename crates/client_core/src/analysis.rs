use std::{cell::RefCell, rc::Rc};

use shared::domain::{AnalysisResult, SessionId};
use tracing::{debug, info, warn};

use crate::{
    admission::{Admission, BusyFlag},
    types::ChartImage,
    BackendGateway,
};

/// Failure text used when the backend gave no usable detail.
pub const ANALYSIS_FALLBACK_TEXT: &str = "Failed to analyze image. Please try again.";

/// Owns the single "current analysis" slot of one session.
pub struct AnalysisController {
    gateway: Rc<dyn BackendGateway>,
    session_id: SessionId,
    current: RefCell<Option<AnalysisResult>>,
    busy: BusyFlag,
}

impl AnalysisController {
    pub fn new(gateway: Rc<dyn BackendGateway>, session_id: SessionId) -> Self {
        Self {
            gateway,
            session_id,
            current: RefCell::new(None),
            busy: BusyFlag::new(),
        }
    }

    pub async fn analyze(&self, image: ChartImage) -> Admission {
        if image.is_empty() {
            return Admission::EmptyInput;
        }
        let Some(guard) = self.busy.try_acquire() else {
            debug!(session_id = %self.session_id, "analysis: upload rejected, request in flight");
            return Admission::Busy;
        };

        // No stale result while the new one is pending.
        self.current.replace(None);
        debug!(
            session_id = %self.session_id,
            filename = %image.filename,
            bytes = image.bytes.len(),
            "analysis: image submitted"
        );

        let result = match self
            .gateway
            .submit_image_for_analysis(&self.session_id, &image)
            .await
        {
            Ok(analysis) => {
                info!(
                    session_id = %self.session_id,
                    patterns = analysis.detected_patterns.len(),
                    "analysis: completed"
                );
                AnalysisResult::Success(analysis)
            }
            Err(err) => {
                warn!(session_id = %self.session_id, error = %err, "analysis: failed");
                AnalysisResult::Failure {
                    message: err
                        .detail()
                        .map(str::to_string)
                        .unwrap_or_else(|| ANALYSIS_FALLBACK_TEXT.to_string()),
                }
            }
        };

        self.current.replace(Some(result));
        drop(guard);
        Admission::Accepted
    }

    pub fn current(&self) -> Option<AnalysisResult> {
        self.current.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }
}

#[cfg(test)]
#[path = "tests/analysis_tests.rs"]
mod tests;
