pub mod generation;
pub mod queue;

pub use generation::{GenerationRequest, RequestBodyError};
pub use queue::{ProviderLog, QueueStatus, QueueUpdate};
