//! # Notification Configuration
//!
//! Lives under the `[notifications]` table of the API config file.
//!
//! ```toml
//! [notifications]
//! enabled = true
//! gateway_url = "https://push.example.com/v1/send"
//! server_key = "..."
//! low_stock_threshold = 2
//! timeout_secs = 10
//! ```
//!
//! With `enabled = false` (the default) alerts are still built and logged,
//! but nothing leaves the process.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use shopfloor_core::DEFAULT_LOW_STOCK_THRESHOLD;

use crate::error::{NotifyError, NotifyResult};

/// Push delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Deliver over HTTP. When false, alerts are only logged.
    #[serde(default)]
    pub enabled: bool,

    /// Endpoint that accepts `{ "message": { ... } }` JSON posts.
    #[serde(default)]
    pub gateway_url: Option<String>,

    /// Sent as `Authorization: Bearer <key>` when present.
    #[serde(default)]
    pub server_key: Option<String>,

    /// Remaining quantity at or below which an alert is sent.
    #[serde(default = "default_threshold")]
    pub low_stock_threshold: i64,

    /// Per-request timeout for the gateway.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

fn default_timeout() -> u64 {
    10
}

impl Default for NotifyConfig {
    fn default() -> Self {
        NotifyConfig {
            enabled: false,
            gateway_url: None,
            server_key: None,
            low_stock_threshold: default_threshold(),
            timeout_secs: default_timeout(),
        }
    }
}

impl NotifyConfig {
    /// Gateway request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Checks that an enabled config can actually deliver.
    pub fn validate(&self) -> NotifyResult<()> {
        if self.low_stock_threshold < 0 {
            return Err(NotifyError::InvalidConfig(
                "low_stock_threshold cannot be negative".into(),
            ));
        }

        if !self.enabled {
            return Ok(());
        }

        match self.gateway_url.as_deref() {
            None | Some("") => Err(NotifyError::InvalidConfig(
                "gateway_url is required when notifications are enabled".into(),
            )),
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                Err(NotifyError::InvalidConfig(format!(
                    "gateway_url must start with http:// or https://, got: {}",
                    url
                )))
            }
            Some(_) if self.timeout_secs == 0 => Err(NotifyError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            )),
            Some(_) => Ok(()),
        }
    }
}
