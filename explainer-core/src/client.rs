use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::{
    config::ExplainerConfig,
    error::{ExplainError, Result},
    models::{AnalysisRequest, AnalysisResult, ExtractedText},
};

pub const EXPLAIN_ENDPOINT: &str = "explain-report";
pub const GENERIC_FAILURE: &str = "Analysis failed";

/// Anything that can turn report text into an explanation.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, text: &ExtractedText) -> Result<AnalysisResult>;
}

/// HTTP client for `POST /explain-report`. One request per call, no retries.
#[derive(Clone)]
pub struct AnalysisClient {
    http: Client,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl AnalysisClient {
    pub fn new(config: &ExplainerConfig) -> Result<Self> {
        let endpoint = config
            .base_url()?
            .join(EXPLAIN_ENDPOINT)
            .map_err(|e| ExplainError::Config(e.to_string()))?;

        let timeout = config.timeout();
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ExplainError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> ExplainError {
        match self.timeout {
            Some(timeout) if err.is_timeout() => ExplainError::AnalysisFailed(format!(
                "Request timed out after {}s",
                timeout.as_secs()
            )),
            _ => ExplainError::AnalysisFailed(err.to_string()),
        }
    }
}

#[async_trait]
impl AnalysisBackend for AnalysisClient {
    async fn analyze(&self, text: &ExtractedText) -> Result<AnalysisResult> {
        info!(
            "Sending report for analysis ({} characters) to {}",
            text.as_str().len(),
            self.endpoint
        );

        let payload = AnalysisRequest {
            report_text: text.as_str().to_string(),
        };

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = error_detail(&body).unwrap_or_else(|| GENERIC_FAILURE.to_string());
            warn!("Analysis request failed with {}: {}", status, message);
            return Err(ExplainError::AnalysisFailed(message));
        }

        let result = parse_analysis(&body)?;
        info!(
            "Analysis received with {} citations",
            result.citations.len()
        );
        Ok(result)
    }
}

/// The `detail` string of an error body, when the body is JSON and carries one.
fn error_detail(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("detail")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn parse_analysis(body: &[u8]) -> Result<AnalysisResult> {
    serde_json::from_slice(body).map_err(|e| ExplainError::MalformedResponse(e.to_string()))
}
