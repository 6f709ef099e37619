//! # Low-Stock Dispatcher
//!
//! Runs after a sale has committed.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CompletedSale.stock_levels                                            │
//! │       │                                                                 │
//! │       ▼  dispatch() keeps levels with quantity <= threshold             │
//! │  tokio::spawn per level ──► notify()                                   │
//! │                               │                                         │
//! │                               ├─ find_alert_recipient(business)         │
//! │                               │    none      → Delivery::NoRecipient    │
//! │                               │    no token  → Delivery::NoPushToken    │
//! │                               │                                         │
//! │                               └─ PushSender::send(low_stock message)    │
//! │                                    ok        → Delivery::Sent           │
//! │                                    err       → warn!, dropped           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use shopfloor_core::StockLevel;
use shopfloor_db::Database;

use crate::error::NotifyResult;
use crate::message::PushMessage;
use crate::sender::PushSender;

/// Outcome of a single alert that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Quantity is above the threshold; nothing to send.
    NotLow,
    /// Business has no SUPERADMIN.
    NoRecipient,
    /// The SUPERADMIN never registered a device.
    NoPushToken { user_id: i64 },
    /// Handed to the push gateway.
    Sent { user_id: i64 },
}

/// Sends low-stock alerts to a business owner.
#[derive(Clone)]
pub struct LowStockDispatcher {
    db: Database,
    sender: Arc<dyn PushSender>,
    threshold: i64,
}

impl LowStockDispatcher {
    /// Creates a dispatcher alerting at `quantity <= threshold`.
    pub fn new(db: Database, sender: Arc<dyn PushSender>, threshold: i64) -> Self {
        LowStockDispatcher {
            db,
            sender,
            threshold,
        }
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Fires one background task per low level and returns immediately.
    ///
    /// The handles are returned for tests; callers normally drop them.
    pub fn dispatch(&self, business_id: i64, levels: &[StockLevel]) -> Vec<JoinHandle<()>> {
        levels
            .iter()
            .filter(|level| level.is_low(self.threshold))
            .cloned()
            .map(|level| {
                let dispatcher = self.clone();
                tokio::spawn(async move {
                    match dispatcher.notify(business_id, &level).await {
                        Ok(delivery) => {
                            debug!(
                                business_id = %business_id,
                                product_id = %level.product_id,
                                delivery = ?delivery,
                                "Low-stock alert handled"
                            );
                        }
                        Err(e) => {
                            warn!(
                                business_id = %business_id,
                                product_id = %level.product_id,
                                pool = %level.pool,
                                error = %e,
                                "Low-stock alert failed"
                            );
                        }
                    }
                })
            })
            .collect()
    }

    /// Sends the alert for one level and reports what happened.
    ///
    /// A missing recipient or token is a normal outcome, not an error.
    pub async fn notify(&self, business_id: i64, level: &StockLevel) -> NotifyResult<Delivery> {
        if !level.is_low(self.threshold) {
            return Ok(Delivery::NotLow);
        }

        let Some(recipient) = self.db.businesses().find_alert_recipient(business_id).await? else {
            info!(business_id = %business_id, "No SUPERADMIN to receive low-stock alert");
            return Ok(Delivery::NoRecipient);
        };

        let Some(token) = recipient.token else {
            info!(
                business_id = %business_id,
                user_id = %recipient.user_id,
                "SUPERADMIN has no push token registered"
            );
            return Ok(Delivery::NoPushToken {
                user_id: recipient.user_id,
            });
        };

        let message = PushMessage::low_stock(token, level);
        self.sender.send(&message).await?;

        info!(
            business_id = %business_id,
            user_id = %recipient.user_id,
            product = %level.name,
            quantity = %level.quantity,
            message_id = %message.id,
            "Low-stock alert sent"
        );

        Ok(Delivery::Sent {
            user_id: recipient.user_id,
        })
    }
}
