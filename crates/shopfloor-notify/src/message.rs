//! # Push Message
//!
//! Wire shape posted to the gateway, wrapped as `{ "message": ... }`:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  token          device token of the recipient                          │
//! │  notification   { title, body }          shown by the OS               │
//! │  data           { type, productId, ... } read by the app (strings)     │
//! │  android        { priority: "high", notification: { sound } }          │
//! │  apns           { payload: { aps: { sound, badge } } }                 │
//! │  webpush        { headers: { Urgency: "high" } }                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use shopfloor_core::StockLevel;

/// Title shown on every low-stock alert.
pub const LOW_STOCK_TITLE: &str = "Low Stock Alert";

/// Value of `data.type` for low-stock alerts.
pub const LOW_STOCK_TYPE: &str = "LOW_STOCK";

/// Delivery priority hint for the platform push services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Normal,
    High,
}

/// A single push notification addressed to one device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    /// Local correlation id; only used in logs.
    #[serde(skip)]
    pub id: Uuid,
    pub token: String,
    pub notification: Notification,
    /// Push data payloads are string-to-string maps.
    pub data: BTreeMap<String, String>,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
    pub webpush: WebpushConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidConfig {
    pub priority: Priority,
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AndroidNotification {
    pub sound: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aps {
    pub sound: String,
    pub badge: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebpushConfig {
    pub headers: BTreeMap<String, String>,
}

/// Envelope the gateway expects.
#[derive(Debug, Serialize)]
pub(crate) struct Envelope<'a> {
    pub message: &'a PushMessage,
}

impl PushMessage {
    /// Builds the alert for a product that just dropped to `level.quantity`.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let msg = PushMessage::low_stock("fcm-token", &level);
    /// assert_eq!(msg.notification.body, "Sugar 1kg is down to 2 unit(s)!");
    /// ```
    pub fn low_stock(token: impl Into<String>, level: &StockLevel) -> Self {
        let mut data = BTreeMap::new();
        data.insert("type".to_string(), LOW_STOCK_TYPE.to_string());
        data.insert("productId".to_string(), level.product_id.to_string());
        data.insert("productName".to_string(), level.name.clone());
        data.insert("quantity".to_string(), level.quantity.to_string());
        data.insert("pool".to_string(), level.pool.as_str().to_string());

        PushMessage {
            id: Uuid::new_v4(),
            token: token.into(),
            notification: Notification {
                title: LOW_STOCK_TITLE.to_string(),
                body: format!("{} is down to {} unit(s)!", level.name, level.quantity),
            },
            data,
            android: AndroidConfig {
                priority: Priority::High,
                notification: AndroidNotification {
                    sound: "default".to_string(),
                },
            },
            apns: ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps {
                        sound: "default".to_string(),
                        badge: 1,
                    },
                },
            },
            webpush: WebpushConfig {
                headers: BTreeMap::from([("Urgency".to_string(), "high".to_string())]),
            },
        }
    }
}
