//! Application configuration

use crate::extractor::Quality;
use crate::http::{ClientConfig, RetryPolicy};
use crate::utils::platform::settings_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Download location
    pub download_location: PathBuf,

    /// Preferred video quality
    pub quality: Quality,

    /// Per-request timeout, also used as the per-chunk read timeout
    pub timeout_secs: u64,

    /// Attempts per request or stream transfer
    pub retry_attempts: usize,

    /// Base delay of the exponential backoff
    pub retry_delay_ms: u64,

    /// Items per UP listing page
    pub page_size: usize,

    /// Pause between listing pages
    pub page_delay_ms: u64,

    /// Explicit ffmpeg binary, otherwise looked up on PATH
    pub ffmpeg_path: Option<PathBuf>,

    /// Fixed User-Agent instead of a random desktop one
    pub user_agent: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            download_location: PathBuf::from("./downloads"),
            quality: Quality::default(),
            timeout_secs: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            page_size: crate::extractor::uploader::DEFAULT_PAGE_SIZE,
            page_delay_ms: 500,
            ffmpeg_path: None,
            user_agent: None,
        }
    }
}

impl AppSettings {
    /// Load settings from `path`, or from the default settings file if it exists.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::read(path)?,
            None => {
                let default_path = settings_path();
                if default_path.is_file() {
                    Self::read(&default_path)?
                } else {
                    debug!("No settings file at {}, using defaults", default_path.display());
                    Self::default()
                }
            }
        };
        Ok(settings.sanitized())
    }

    fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: AppSettings = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Enforce sane minimums
    pub fn sanitized(mut self) -> Self {
        self.timeout_secs = self.timeout_secs.max(1);
        self.retry_attempts = self.retry_attempts.max(1);
        self.page_size = self.page_size.max(1);
        if self.user_agent.as_deref().is_some_and(|ua| ua.trim().is_empty()) {
            self.user_agent = None;
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn client_config(&self) -> ClientConfig {
        let config = match &self.user_agent {
            Some(ua) => ClientConfig::with_user_agent(ua.clone()),
            None => ClientConfig::new(),
        };
        config.timeout(self.timeout())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}
