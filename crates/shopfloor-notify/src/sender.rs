//! # Push Senders
//!
//! [`PushSender`] is the seam between the dispatcher and the outside world.
//!
//! - [`HttpPushSender`] posts JSON to the configured gateway.
//! - [`LogPushSender`] only logs; used when push is disabled and in dev.
//!
//! Tests plug in their own recording or failing senders.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::NotifyConfig;
use crate::error::{NotifyError, NotifyResult};
use crate::message::{Envelope, PushMessage};

/// Delivers a push message to a device.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Sends `message` to `message.token`.
    ///
    /// # Returns
    /// * `Ok(())` once the gateway accepted the message
    /// * `Err(NotifyError)` on transport failure or rejection
    async fn send(&self, message: &PushMessage) -> NotifyResult<()>;
}

/// Picks the sender matching `config`.
pub fn sender_from_config(config: &NotifyConfig) -> NotifyResult<Arc<dyn PushSender>> {
    if !config.enabled {
        info!("Push notifications disabled; low-stock alerts will be logged only");
        return Ok(Arc::new(LogPushSender));
    }

    config.validate()?;
    Ok(Arc::new(HttpPushSender::new(config)?))
}

// =============================================================================
// HTTP
// =============================================================================

/// Posts `{ "message": ... }` to a push gateway.
#[derive(Clone)]
pub struct HttpPushSender {
    http_client: Client,
    gateway_url: String,
    server_key: Option<String>,
}

impl HttpPushSender {
    /// Creates a sender for the configured gateway.
    pub fn new(config: &NotifyConfig) -> NotifyResult<Self> {
        let gateway_url = config
            .gateway_url
            .clone()
            .ok_or_else(|| NotifyError::InvalidConfig("gateway_url is not set".into()))?;

        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(HttpPushSender {
            http_client,
            gateway_url,
            server_key: config.server_key.clone(),
        })
    }
}

#[async_trait]
impl PushSender for HttpPushSender {
    async fn send(&self, message: &PushMessage) -> NotifyResult<()> {
        let mut request = self
            .http_client
            .post(&self.gateway_url)
            .json(&Envelope { message });

        if let Some(key) = &self.server_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(message_id = %message.id, status = %status, "Push gateway accepted message");
            return Ok(());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(NotifyError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

// =============================================================================
// Log only
// =============================================================================

/// Writes the alert to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send(&self, message: &PushMessage) -> NotifyResult<()> {
        info!(
            message_id = %message.id,
            title = %message.notification.title,
            body = %message.notification.body,
            "Push delivery disabled; alert logged"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_builds_a_sender() {
        assert!(sender_from_config(&NotifyConfig::default()).is_ok());
    }

    #[test]
    fn test_enabled_without_gateway_is_rejected() {
        let config = NotifyConfig {
            enabled: true,
            ..NotifyConfig::default()
        };
        assert!(matches!(
            sender_from_config(&config),
            Err(NotifyError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_a_transport_error() {
        let config = NotifyConfig {
            enabled: true,
            gateway_url: Some("http://127.0.0.1:9/push".into()),
            timeout_secs: 2,
            ..NotifyConfig::default()
        };
        let sender = HttpPushSender::new(&config).unwrap();
        let level = shopfloor_core::StockLevel {
            pool: shopfloor_core::StockPool::Store,
            product_id: 1,
            name: "Sugar 1kg".into(),
            quantity: 0,
        };

        let err = sender
            .send(&PushMessage::low_stock("tok", &level))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
    }
}
