//! fal.ai queue provider.
//!
//! A generation is three calls against the queue API: submit the input,
//! poll the status URL (with logs) until the job completes, then fetch the
//! result from the response URL. The resolved value mirrors the fal client
//! SDK: `{"data": <result>, "requestId": <id>}`.

use super::{ProviderError, QueueUpdateSender, VideoProvider};
use crate::models::{ProviderLog, QueueStatus, QueueUpdate};
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

pub const DEFAULT_QUEUE_URL: &str = "https://queue.fal.run";
pub const DEFAULT_MODEL: &str = "fal-ai/veo3";

/// Builder for [`FalVideoProvider`].
#[derive(Debug, Clone)]
pub struct FalVideoProviderBuilder {
    api_key: Option<SecretString>,
    model: String,
    queue_url: String,
    poll_interval: Duration,
}

impl Default for FalVideoProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            queue_url: DEFAULT_QUEUE_URL.to_string(),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl FalVideoProviderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, key: SecretString) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the queue application id, e.g. `fal-ai/veo3`.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the queue base URL. Trailing slashes are ignored.
    pub fn queue_url(mut self, url: impl Into<String>) -> Self {
        self.queue_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn build(self) -> Result<FalVideoProvider, ProviderError> {
        let api_key = self
            .api_key
            .ok_or_else(|| ProviderError::NotConfigured("no fal.ai API key provided".into()))?;

        Ok(FalVideoProvider {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            queue_url: self.queue_url,
            poll_interval: self.poll_interval,
        })
    }
}

/// fal.ai queue client.
///
/// Holds no per-request state, so one instance serves any number of
/// concurrent generations.
#[derive(Debug)]
pub struct FalVideoProvider {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    queue_url: String,
    poll_interval: Duration,
}

impl FalVideoProvider {
    pub fn builder() -> FalVideoProviderBuilder {
        FalVideoProviderBuilder::new()
    }

    fn authorization(&self) -> String {
        format!("Key {}", self.api_key.expose_secret())
    }

    async fn submit(&self, input: &Value) -> Result<FalSubmitResponse, ProviderError> {
        let url = format!("{}/{}", self.queue_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.authorization())
            .json(input)
            .send()
            .await?;

        let response = error_for_status(response).await?;
        response.json::<FalSubmitResponse>().await.map_err(|e| {
            ProviderError::UnexpectedResponse(format!("invalid submit response: {e}"))
        })
    }

    /// Poll until the job reports `COMPLETED`, publishing each status.
    async fn poll_until_complete(
        &self,
        submit: &FalSubmitResponse,
        updates: &QueueUpdateSender,
    ) -> Result<(), ProviderError> {
        let start = Instant::now();
        let mut logs_seen = 0usize;

        loop {
            let response = self
                .client
                .get(&submit.status_url)
                .query(&[("logs", "1")])
                .header("Authorization", self.authorization())
                .send()
                .await?;

            let raw: Value = error_for_status(response).await?.json().await?;
            let status: FalStatusResponse = serde_json::from_value(raw.clone()).map_err(|e| {
                ProviderError::UnexpectedResponse(format!("invalid status response: {e}"))
            })?;

            let logs = status.logs.unwrap_or_default();
            let fresh: Vec<ProviderLog> = logs.iter().skip(logs_seen).cloned().collect();
            logs_seen = logs_seen.max(logs.len());

            // A closed receiver only means nobody is listening; the job continues.
            let _ = updates.send(QueueUpdate {
                status: status.status.clone(),
                queue_position: status.queue_position,
                logs: fresh,
            });

            match status.status {
                QueueStatus::Completed => {
                    if let Some(message) = status.error {
                        return Err(ProviderError::Failed {
                            message,
                            body: Some(raw),
                        });
                    }
                    return Ok(());
                }
                QueueStatus::Failed => {
                    return Err(ProviderError::Failed {
                        message: status
                            .error
                            .unwrap_or_else(|| "fal.ai video generation failed".to_string()),
                        body: Some(raw),
                    });
                }
                QueueStatus::InQueue | QueueStatus::InProgress => {
                    tracing::debug!(
                        request_id = %submit.request_id,
                        status = %status.status,
                        elapsed_secs = start.elapsed().as_secs(),
                        "polling fal.ai video generation"
                    );
                }
                QueueStatus::Other(ref label) => {
                    tracing::warn!(
                        request_id = %submit.request_id,
                        status = %label,
                        "fal.ai returned unknown queue status"
                    );
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn fetch_result(&self, response_url: &str) -> Result<Value, ProviderError> {
        let response = self
            .client
            .get(response_url)
            .header("Authorization", self.authorization())
            .send()
            .await?;

        let response = error_for_status(response).await?;
        response.json::<Value>().await.map_err(|e| {
            ProviderError::UnexpectedResponse(format!("invalid result payload: {e}"))
        })
    }
}

#[async_trait]
impl VideoProvider for FalVideoProvider {
    async fn subscribe(
        &self,
        input: Value,
        updates: QueueUpdateSender,
    ) -> Result<Value, ProviderError> {
        let submit = self.submit(&input).await?;
        tracing::debug!(
            request_id = %submit.request_id,
            model = %self.model,
            "submitted fal.ai video generation request"
        );

        self.poll_until_complete(&submit, &updates).await?;
        drop(updates);

        let data = self.fetch_result(&submit.response_url).await?;
        tracing::debug!(request_id = %submit.request_id, "fetched fal.ai video result");

        Ok(json!({
            "data": data,
            "requestId": submit.request_id,
        }))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Pass 2xx responses through; turn anything else into [`ProviderError::Api`].
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(parse_error(status, &text))
}

/// Build an API error from a failed response body.
///
/// The message is the body's `detail` or `message` string when present,
/// otherwise the HTTP reason phrase. The body itself becomes the details.
fn parse_error(status: StatusCode, text: &str) -> ProviderError {
    let body: Option<Value> = serde_json::from_str(text).ok();

    let message = body
        .as_ref()
        .and_then(|b| {
            b.get("detail")
                .and_then(Value::as_str)
                .or_else(|| b.get("message").and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    let body = body.or_else(|| (!text.is_empty()).then(|| Value::String(text.to_string())));

    ProviderError::Api {
        status: status.as_u16(),
        message,
        body,
    }
}

// Response types

#[derive(Debug, Deserialize)]
struct FalSubmitResponse {
    request_id: String,
    status_url: String,
    response_url: String,
}

#[derive(Debug, Deserialize)]
struct FalStatusResponse {
    status: QueueStatus,
    #[serde(default)]
    queue_position: Option<u64>,
    #[serde(default)]
    logs: Option<Vec<ProviderLog>>,
    #[serde(default)]
    error: Option<String>,
}
