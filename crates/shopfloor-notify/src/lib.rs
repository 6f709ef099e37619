//! # shopfloor-notify: Low-Stock Push Alerts
//!
//! Tells a business owner when a sale leaves a product nearly sold out.
//!
//! ## Where It Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/pos/sell                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutRepository::complete_sale ──► COMMIT                          │
//! │       │                                                                 │
//! │       │  stock_levels (one per stock-backed line)                       │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               shopfloor-notify (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  LowStockDispatcher ──► find_alert_recipient ──► PushSender     │   │
//! │  │   (threshold, spawn)     (SUPERADMIN + token)    (HTTP / log)   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  201 to the till (never waits for delivery)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let sender = shopfloor_notify::sender_from_config(&config.notifications)?;
//! let alerts = LowStockDispatcher::new(db.clone(), sender, config.notifications.low_stock_threshold);
//!
//! let done = db.checkout().complete_sale(&ctx, &sale).await?;
//! alerts.dispatch(ctx.business_id, &done.stock_levels);
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod sender;

pub use config::NotifyConfig;
pub use dispatcher::{Delivery, LowStockDispatcher};
pub use error::{NotifyError, NotifyResult};
pub use message::PushMessage;
pub use sender::{sender_from_config, HttpPushSender, LogPushSender, PushSender};
