//! Shared setup for API tests: an in-memory shop behind the real router.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio::sync::Mutex;
use tower::ServiceExt;

use shopfloor_api::{create_router, AppState};
use shopfloor_core::UserRole;
use shopfloor_db::{Database, DbConfig};
use shopfloor_notify::{LowStockDispatcher, NotifyResult, PushMessage, PushSender};

/// Captures every alert instead of sending it.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<PushMessage>>,
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send(&self, message: &PushMessage) -> NotifyResult<()> {
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Database,
    pub alerts: Arc<RecordingSender>,
    pub business_id: i64,
    pub owner_id: i64,
    pub cashier_id: i64,
    pub store_id: i64,
    pub warehouse_id: i64,
    /// Store product, 10 in stock at 500.
    pub sugar_id: i64,
    /// Warehouse product, 4 in stock at 2500.
    pub rice_id: i64,
    pub customer_id: i64,
}

/// One business with an owner (push token registered), a cashier, a store,
/// a warehouse, one product in each and a customer.
pub async fn setup() -> TestApp {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let businesses = db.businesses();
    let business = businesses.create_business("Corner Shop").await.unwrap();
    let owner = businesses
        .create_user(Some(business.id), "Amina Owner", UserRole::Superadmin)
        .await
        .unwrap();
    let cashier = businesses
        .create_user(Some(business.id), "Tunde Till", UserRole::Cashier)
        .await
        .unwrap();
    businesses.set_push_token(owner.id, "owner-device").await.unwrap();
    let store = businesses.create_store(business.id, "Main Street").await.unwrap();
    let warehouse = businesses.create_warehouse(business.id, "Depot").await.unwrap();

    let inventory = db.inventory();
    let sugar = inventory
        .add_store_product(store.id, "Sugar 1kg", 10, 500)
        .await
        .unwrap();
    let rice = inventory
        .add_warehouse_product(warehouse.id, "Rice 50kg", 4, 2500)
        .await
        .unwrap();
    let customer = db
        .customers()
        .create(business.id, "Chidi Okafor", Some("08031234567"))
        .await
        .unwrap();

    let alerts = Arc::new(RecordingSender::default());
    let dispatcher = LowStockDispatcher::new(db.clone(), alerts.clone(), 2);
    let router = create_router(AppState::new(db.clone(), dispatcher));

    TestApp {
        router,
        db,
        alerts,
        business_id: business.id,
        owner_id: owner.id,
        cashier_id: cashier.id,
        store_id: store.id,
        warehouse_id: warehouse.id,
        sugar_id: sugar.id,
        rice_id: rice.id,
        customer_id: customer.id,
    }
}

impl TestApp {
    /// Sends a request as the cashier.
    pub async fn call(&self, method: &str, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", self.cashier_id.to_string())
            .header("x-business-id", self.business_id.to_string());
        self.send(request, body).await
    }

    pub async fn send(
        &self,
        request: axum::http::request::Builder,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn sell(&self, body: serde_json::Value) -> Response<Body> {
        self.call("POST", "/api/pos/sell", Some(body)).await
    }

    /// Posts an unparsed body to `/api/pos/sell`.
    pub async fn sell_raw(&self, body: &'static str) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri("/api/pos/sell")
            .header("x-user-id", self.cashier_id.to_string())
            .header("x-business-id", self.business_id.to_string())
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.call("GET", uri, None).await
    }

    pub async fn sugar_stock(&self) -> i64 {
        self.db
            .inventory()
            .get_store_product(self.business_id, self.sugar_id)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    pub async fn rice_stock(&self) -> i64 {
        self.db
            .inventory()
            .get_warehouse_product(self.business_id, self.rice_id)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    pub async fn sale_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(self.db.pool())
            .await
            .unwrap()
    }

    /// Waits for spawned alert tasks to deliver `n` messages.
    pub async fn wait_for_alerts(&self, n: usize) -> Vec<PushMessage> {
        for _ in 0..50 {
            {
                let sent = self.alerts.sent.lock().await;
                if sent.len() >= n {
                    return sent.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.alerts.sent.lock().await.clone()
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
