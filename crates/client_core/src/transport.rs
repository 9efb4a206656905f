use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    domain::{ChartAnalysis, ChatMessage, SessionId},
    error::ApiErrorBody,
    protocol::{
        AnalysisHistoryResponse, AnalysisRecord, CandlestickAnalysisResponse, ChatHistoryResponse,
        ChatRequest, ChatResponse, HealthResponse,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::{config::Settings, types::ChartImage, BackendGateway, GatewayError, GatewayResult};

/// [`BackendGateway`] speaking the analysis backend's HTTP API under `/api`.
pub struct HttpGateway {
    http: Client,
    api_base: Url,
}

impl HttpGateway {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build http client")?;
        Self::with_client(http, &settings.backend_url)
    }

    pub fn with_client(http: Client, backend_url: &str) -> anyhow::Result<Self> {
        let mut api_base = Url::parse(backend_url)
            .with_context(|| format!("invalid backend url '{backend_url}'"))?;
        api_base
            .path_segments_mut()
            .map_err(|_| anyhow!("backend url '{backend_url}' cannot be a base"))?
            .pop_if_empty()
            .push("api");
        Ok(Self { http, api_base })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        // `with_client` rejected cannot-be-a-base urls.
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    pub async fn health_check(&self) -> GatewayResult<String> {
        let response = self.http.get(self.endpoint(&[""])).send().await?;
        let response = ensure_success(response, "health check").await?;
        let body: HealthResponse = response.json().await?;
        Ok(body.message)
    }

    /// Past analyses of the session, newest first.
    pub async fn fetch_analysis_history(
        &self,
        session_id: &SessionId,
    ) -> GatewayResult<Vec<AnalysisRecord>> {
        let response = self
            .http
            .get(self.endpoint(&["analysis-history", session_id.as_str()]))
            .send()
            .await?;
        let response = ensure_success(response, "analysis history").await?;
        let body: AnalysisHistoryResponse = response.json().await?;
        Ok(body.analyses)
    }
}

#[async_trait(?Send)]
impl BackendGateway for HttpGateway {
    async fn fetch_history(&self, session_id: &SessionId) -> GatewayResult<Vec<ChatMessage>> {
        let response = self
            .http
            .get(self.endpoint(&["chat-history", session_id.as_str()]))
            .send()
            .await?;
        let response = ensure_success(response, "chat history").await?;
        let body: ChatHistoryResponse = response.json().await?;
        debug!(session_id = %session_id, records = body.chats.len(), "http: chat history fetched");
        Ok(body.into_transcript())
    }

    async fn submit_chat_message(
        &self,
        session_id: &SessionId,
        text: &str,
    ) -> GatewayResult<String> {
        let response = self
            .http
            .post(self.endpoint(&["chat"]))
            .json(&ChatRequest {
                message: text.to_string(),
                session_id: session_id.to_string(),
            })
            .send()
            .await?;
        let response = ensure_success(response, "chat").await?;
        let body: ChatResponse = response.json().await?;
        Ok(body.response)
    }

    async fn submit_image_for_analysis(
        &self,
        session_id: &SessionId,
        image: &ChartImage,
    ) -> GatewayResult<ChartAnalysis> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.filename.clone())
            .mime_str(&image.mime_type)?;
        let form = Form::new()
            .text("session_id", session_id.to_string())
            .part("file", part);

        let response = self
            .http
            .post(self.endpoint(&["analyze-candlestick"]))
            .query(&[("session_id", session_id.as_str())])
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match error_detail(response).await {
                Some(detail) => GatewayError::analysis(detail),
                None => GatewayError::transport(format!("analysis request failed with {status}")),
            });
        }

        let body: CandlestickAnalysisResponse = response.json().await?;
        if body.is_in_band_failure() {
            return Err(GatewayError::analysis(body.analysis.trim()));
        }
        Ok(body.into())
    }
}

async fn ensure_success(response: Response, operation: &str) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = error_detail(response).await;
    warn!(
        %status,
        operation,
        detail = detail.as_deref().unwrap_or("-"),
        "http: backend rejected request"
    );
    Err(GatewayError::transport(format!(
        "{operation} request failed with {status}"
    )))
}

async fn error_detail(response: Response) -> Option<String> {
    response
        .json::<ApiErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail_message())
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
