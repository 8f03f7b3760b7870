pub mod credentials;

pub use credentials::{load_fal_key, CredentialError, FAL_KEY_MARKER};

use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct VideoConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub fal: FalConfig,
    /// Directory served at `/` and as the static fallback.
    pub static_dir: PathBuf,
    /// OTLP collector; tracing stays local when unset.
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FalConfig {
    /// File holding the `FAL_KEY=` line, relative to the working directory.
    pub credentials_path: PathBuf,
    /// Queue application id, e.g. `fal-ai/veo3`.
    pub model: String,
    pub queue_url: String,
    pub poll_interval_ms: u64,
}

impl FalConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl VideoConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(VideoConfig {
            common: common_config,
            fal: FalConfig {
                credentials_path: get_env("FAL_ENV_PATH", Some("fal.env"), is_prod)?.into(),
                model: get_env("FAL_MODEL", Some("fal-ai/veo3"), is_prod)?,
                queue_url: get_env("FAL_QUEUE_URL", Some("https://queue.fal.run"), is_prod)?,
                poll_interval_ms: parse_poll_interval(&get_env(
                    "FAL_POLL_INTERVAL_MS",
                    Some(&DEFAULT_POLL_INTERVAL_MS.to_string()),
                    is_prod,
                )?)?,
            },
            static_dir: match env::var("STATIC_DIR") {
                Ok(dir) => PathBuf::from(dir),
                Err(_) => default_static_dir(),
            },
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
        })
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            fal: FalConfig {
                credentials_path: PathBuf::from("fal.env"),
                model: "fal-ai/veo3".to_string(),
                queue_url: "https://queue.fal.run".to_string(),
                poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            },
            static_dir: PathBuf::from("public"),
            otlp_endpoint: None,
        }
    }
}

/// `public/` next to the crate, whether started from the workspace root or
/// from inside `video-service/`.
fn default_static_dir() -> PathBuf {
    match env::current_dir() {
        Ok(base) if !base.ends_with("video-service") && base.join("video-service").is_dir() => {
            base.join("video-service").join("public")
        }
        _ => PathBuf::from("public"),
    }
}

fn parse_poll_interval(raw: &str) -> Result<u64, AppError> {
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "FAL_POLL_INTERVAL_MS must be a whole number of milliseconds, got {:?}: {}",
            raw,
            e
        ))
    })
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
