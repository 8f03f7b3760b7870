use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Number of prompt characters echoed into the log.
const PROMPT_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum RequestBodyError {
    #[error("request body is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("request body must be a JSON object or array")]
    NotObjectOrArray,
}

/// Body of `POST /api/generate-video`.
///
/// The provider owns the schema, so the body is forwarded untouched.
/// Only `prompt` is read, and only for logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GenerationRequest {
    body: Value,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            body: Value::Object(Map::new()),
        }
    }
}

impl GenerationRequest {
    /// Build from the raw request body.
    ///
    /// A body that is empty or not sent as JSON becomes `{}`. A JSON body
    /// must be an object or an array.
    pub fn from_body(is_json: bool, bytes: &[u8]) -> Result<Self, RequestBodyError> {
        if !is_json || bytes.is_empty() {
            return Ok(Self::default());
        }
        Self::try_from(serde_json::from_slice::<Value>(bytes)?)
    }

    pub fn prompt(&self) -> Option<&str> {
        self.body.get("prompt").and_then(Value::as_str)
    }

    /// First 100 characters of the prompt followed by `...`.
    pub fn prompt_preview(&self) -> String {
        let head: String = self
            .prompt()
            .map(|p| p.chars().take(PROMPT_PREVIEW_CHARS).collect())
            .unwrap_or_default();
        format!("{head}...")
    }

    pub fn into_input(self) -> Value {
        self.body
    }
}

impl TryFrom<Value> for GenerationRequest {
    type Error = RequestBodyError;

    fn try_from(body: Value) -> Result<Self, Self::Error> {
        match body {
            Value::Object(_) | Value::Array(_) => Ok(Self { body }),
            _ => Err(RequestBodyError::NotObjectOrArray),
        }
    }
}
