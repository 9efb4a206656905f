use serde::{Deserialize, Serialize};

/// Error body returned by the analysis backend on non-2xx responses.
///
/// `detail` is usually a string, but request validation failures carry a
/// list of objects instead, so it is kept as raw JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ApiErrorBody {
    pub fn detail_message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            other => Some(other.to_string()),
        }
    }
}
