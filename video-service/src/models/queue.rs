use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle label reported by the provider queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueueStatus {
    InQueue,
    InProgress,
    Completed,
    Failed,
    /// A label this service does not know; carried verbatim.
    Other(String),
}

impl QueueStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::InQueue => "IN_QUEUE",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for QueueStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "IN_QUEUE" => Self::InQueue,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "FAILED" | "ERROR" => Self::Failed,
            _ => Self::Other(label),
        }
    }
}

impl From<QueueStatus> for String {
    fn from(status: QueueStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One log line emitted by the model while it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderLog {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Progress notification for one in-flight generation.
///
/// `logs` holds only lines not carried by an earlier update for the same call.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueUpdate {
    pub status: QueueStatus,
    pub queue_position: Option<u64>,
    pub logs: Vec<ProviderLog>,
}

impl QueueUpdate {
    pub fn new(status: QueueStatus) -> Self {
        Self {
            status,
            queue_position: None,
            logs: Vec::new(),
        }
    }
}
