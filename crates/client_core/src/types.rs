use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use shared::domain::{AnalysisResult, ChatMessage};

const FALLBACK_IMAGE_MIME: &str = "image/png";

/// Chart image picked by the user for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ChartImage {
    /// The backend refuses anything that is not `image/*`, so unknown or
    /// non-image extensions are sent as PNG.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first()
            .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| FALLBACK_IMAGE_MIME.to_string());
        Self {
            filename,
            mime_type,
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read chart image '{}'", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chart.png".to_string());
        Ok(Self::new(filename, bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Consistent view of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionState {
    pub session_id: String,
    pub transcript: Vec<ChatMessage>,
    pub chat_busy: bool,
    pub draft: String,
    pub analysis_result: Option<AnalysisResult>,
    pub analysis_busy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_mime_follows_extension() {
        assert_eq!(ChartImage::new("btc.jpg", vec![1]).mime_type, "image/jpeg");
        assert_eq!(ChartImage::new("eth.webp", vec![1]).mime_type, "image/webp");
    }

    #[test]
    fn non_image_names_fall_back_to_png() {
        assert_eq!(ChartImage::new("notes.txt", vec![1]).mime_type, "image/png");
        assert_eq!(ChartImage::new("capture", vec![1]).mime_type, "image/png");
    }

    #[test]
    fn empty_bytes_count_as_empty() {
        assert!(ChartImage::new("chart.png", Vec::new()).is_empty());
        assert!(!ChartImage::new("chart.png", vec![0x89]).is_empty());
    }

    #[tokio::test]
    async fn missing_file_reports_path() {
        let err = ChartImage::from_path("/definitely/not/here/chart.png")
            .await
            .expect_err("missing file");
        assert!(err.to_string().contains("/definitely/not/here/chart.png"));
    }
}
