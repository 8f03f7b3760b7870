//! HTTP handlers for the video service.

pub mod generate;
pub mod health;
pub mod metrics;
pub mod status;

pub use generate::generate_video;
pub use health::health_check;
pub use metrics::metrics;
pub use status::status;
