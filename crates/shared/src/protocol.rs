use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChartAnalysis, ChatMessage};

/// Prefix the backend puts in the narrative when the model call failed but
/// the endpoint still answered 200.
pub const ANALYSIS_FAILURE_MARKER: &str = "Error analyzing image:";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// One stored exchange: the user's message and the assistant's reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatRecord {
    pub fn into_messages(self) -> [ChatMessage; 2] {
        [
            ChatMessage::user(self.message, self.timestamp),
            ChatMessage::assistant(self.response, self.timestamp),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    #[serde(default)]
    pub chats: Vec<ChatRecord>,
    #[serde(default)]
    pub session_id: String,
}

impl ChatHistoryResponse {
    /// Flattens stored exchanges into transcript order.
    pub fn into_transcript(self) -> Vec<ChatMessage> {
        self.chats
            .into_iter()
            .flat_map(ChatRecord::into_messages)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandlestickAnalysisResponse {
    pub analysis: String,
    #[serde(default)]
    pub patterns_detected: Vec<String>,
    #[serde(default)]
    pub recommendations: HashMap<String, String>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl CandlestickAnalysisResponse {
    pub fn is_in_band_failure(&self) -> bool {
        self.analysis.trim_start().starts_with(ANALYSIS_FAILURE_MARKER)
    }
}

impl From<CandlestickAnalysisResponse> for ChartAnalysis {
    fn from(value: CandlestickAnalysisResponse) -> Self {
        Self {
            detected_patterns: value.patterns_detected,
            recommendations: value.recommendations,
            narrative: value.analysis,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub analysis: String,
    #[serde(default)]
    pub patterns_detected: Vec<String>,
    #[serde(default)]
    pub indicators: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub recommendations: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisHistoryResponse {
    #[serde(default)]
    pub analyses: Vec<AnalysisRecord>,
    #[serde(default)]
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Sender;

    #[test]
    fn history_records_expand_to_user_then_assistant() {
        let raw = r#"{
            "chats": [
                {"_id": "65f0", "id": "a", "session_id": "s", "message": "what is a doji?",
                 "response": "an indecision candle", "timestamp": "2025-03-01T10:00:00.123456+00:00"},
                {"id": "b", "session_id": "s", "message": "and a hammer?",
                 "response": "a reversal candle", "timestamp": "2025-03-01T10:05:00+00:00"}
            ],
            "session_id": "s"
        }"#;
        let history: ChatHistoryResponse = serde_json::from_str(raw).expect("parse");
        let transcript = history.into_transcript();

        let senders: Vec<Sender> = transcript.iter().map(|m| m.sender).collect();
        assert_eq!(
            senders,
            vec![Sender::User, Sender::Assistant, Sender::User, Sender::Assistant]
        );
        assert_eq!(transcript[0].text, "what is a doji?");
        assert_eq!(transcript[3].text, "a reversal candle");
        assert_eq!(transcript[0].timestamp, transcript[1].timestamp);
    }

    #[test]
    fn empty_history_body_parses() {
        let history: ChatHistoryResponse =
            serde_json::from_str(r#"{"session_id":"s"}"#).expect("parse");
        assert!(history.into_transcript().is_empty());
    }

    #[test]
    fn analysis_response_maps_narrative_and_patterns() {
        let raw = r#"{
            "analysis": "A bullish engulfing near support. Stop loss below 180.",
            "patterns_detected": ["Engulfing"],
            "recommendations": {"risk_management": "Stop loss recommended"},
            "session_id": "s",
            "filename": "chart.png"
        }"#;
        let response: CandlestickAnalysisResponse = serde_json::from_str(raw).expect("parse");
        assert!(!response.is_in_band_failure());

        let analysis = ChartAnalysis::from(response);
        assert_eq!(analysis.detected_patterns, vec!["Engulfing".to_string()]);
        assert_eq!(
            analysis.recommendations.get("risk_management").map(String::as_str),
            Some("Stop loss recommended")
        );
        assert!(analysis.narrative.starts_with("A bullish engulfing"));
    }

    #[test]
    fn in_band_failure_is_detected() {
        let response = CandlestickAnalysisResponse {
            analysis: "Error analyzing image: model unavailable".into(),
            patterns_detected: Vec::new(),
            recommendations: HashMap::new(),
            session_id: "s".into(),
            filename: None,
        };
        assert!(response.is_in_band_failure());
    }
}
