pub mod metrics;
pub mod progress;
pub mod providers;

pub use progress::relay_queue_updates;
pub use providers::{ProviderError, QueueUpdateSender, VideoProvider};
