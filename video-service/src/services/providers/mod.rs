//! Video generation provider abstraction.
//!
//! Handlers only see [`VideoProvider`]; the fal.ai queue client and the
//! scripted mock used in tests both implement it.

pub mod fal;
pub mod mock;

use crate::models::QueueUpdate;
use async_trait::async_trait;
use serde_json::Value;
use service_core::error::AppError;
use thiserror::Error;
use tokio::sync::mpsc;

/// Fallback `details` value when a provider error carries no payload.
pub const NO_ADDITIONAL_DETAILS: &str = "No additional details";

/// Channel on which in-flight progress is published.
pub type QueueUpdateSender = mpsc::UnboundedSender<QueueUpdate>;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    #[error("Generation failed: {message}")]
    Failed { message: String, body: Option<Value> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ProviderError {
    /// Message reported to the caller as `error`.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } | Self::Failed { message, .. } => message.clone(),
            Self::NotConfigured(msg) | Self::UnexpectedResponse(msg) => msg.clone(),
            Self::Network(err) => err.to_string(),
        }
    }

    /// Payload the provider returned alongside the failure, if any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            Self::Api { body, .. } | Self::Failed { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        let details = err
            .details()
            .cloned()
            .unwrap_or_else(|| Value::String(NO_ADDITIONAL_DETAILS.to_string()));
        AppError::Provider {
            message: err.message(),
            details,
        }
    }
}

/// Trait for video generation providers.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Submit `input` and wait for the job to resolve.
    ///
    /// Progress is published on `updates` until the call returns; the
    /// sender is dropped on return so consumers can drain and stop.
    async fn subscribe(&self, input: Value, updates: QueueUpdateSender)
        -> Result<Value, ProviderError>;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;
}
