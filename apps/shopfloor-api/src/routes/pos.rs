//! # POS Routes
//!
//! Everything under `/api/pos`. All handlers are scoped to the caller's
//! business; a caller without one gets 400 "User has no business" before
//! any lookup happens.
//!
//! | Method | Path                   | Handler            |
//! |--------|------------------------|--------------------|
//! | POST   | `/sell`                | [`sell`]           |
//! | GET    | `/search`              | [`search_goods`]   |
//! | GET    | `/warehouse/search`    | [`search_warehouse_goods`] |
//! | GET    | `/receipt/{sale_id}`   | [`get_receipt`]    |
//! | GET    | `/customers/search`    | [`search_customers`] |
//! | GET    | `/sales`               | [`list_sales`]     |

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use shopfloor_core::validation::search_query;
use shopfloor_core::{
    normalize_sale, CustomerMatch, Money, Receipt, SaleSummary, StoreGood, WarehouseGood,
    CUSTOMER_SEARCH_LIMIT, GOODS_SEARCH_LIMIT,
};
use shopfloor_db::SaleContext;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::AppState;

/// Maximum rows returned by the sales list.
pub const SALES_LIST_LIMIT: i64 = 100;

/// Creates the POS routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sell", post(sell))
        .route("/search", get(search_goods))
        .route("/warehouse/search", get(search_warehouse_goods))
        .route("/receipt/{sale_id}", get(get_receipt))
        .route("/customers/search", get(search_customers))
        .route("/sales", get(list_sales))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// `?q=` for the search and list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// Confirmation of a committed sale.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellResponse {
    /// Present only for cart payloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub sale_id: i64,
    pub total: Money,
    pub paid: Money,
    pub balance: Money,
}

// ============================================================================
// Handlers
// ============================================================================

/// Completes a sale from a cart or legacy single-item body.
///
/// ## Flow
/// ```text
/// identity ─► business? ─► normalize_sale ─► complete_sale ─► 201
///                                                  │
///                                                  └─► alerts.dispatch (spawned)
/// ```
pub async fn sell(
    State(state): State<AppState>,
    identity: Identity,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<SellResponse>), ApiError> {
    let business_id = identity.business_id()?;
    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text()))?;

    let sale = normalize_sale(&body)?;
    debug!(
        business_id = %business_id,
        seller_id = %identity.user_id,
        lines = sale.line_count(),
        total = %sale.total,
        legacy = sale.is_legacy(),
        "Sale normalized"
    );

    let ctx = SaleContext {
        business_id,
        seller_id: identity.user_id,
    };
    let done = state.db.checkout().complete_sale(&ctx, &sale).await?;

    info!(
        sale_id = %done.sale_id,
        business_id = %business_id,
        total = %done.total,
        balance = %done.balance,
        "Sale completed"
    );

    state.alerts.dispatch(business_id, &done.stock_levels);

    Ok((
        StatusCode::CREATED,
        Json(SellResponse {
            message: (!sale.is_legacy()).then_some("Sale completed"),
            sale_id: done.sale_id,
            total: done.total,
            paid: done.amount_paid,
            balance: done.balance,
        }),
    ))
}

/// In-stock store goods whose name contains `q`.
pub async fn search_goods(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<StoreGood>>, ApiError> {
    let business_id = identity.business_id()?;
    let Some(q) = search_query(params.q.as_deref())? else {
        return Ok(Json(Vec::new()));
    };

    let goods = state
        .db
        .inventory()
        .search_store_goods(business_id, &q, GOODS_SEARCH_LIMIT)
        .await?;

    Ok(Json(goods))
}

/// In-stock warehouse goods whose name contains `q`.
pub async fn search_warehouse_goods(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<WarehouseGood>>, ApiError> {
    let business_id = identity.business_id()?;
    let Some(q) = search_query(params.q.as_deref())? else {
        return Ok(Json(Vec::new()));
    };

    let goods = state
        .db
        .inventory()
        .search_warehouse_goods(business_id, &q, GOODS_SEARCH_LIMIT)
        .await?;

    Ok(Json(goods))
}

/// Printable receipt with the customer's debt position.
pub async fn get_receipt(
    State(state): State<AppState>,
    identity: Identity,
    Path(sale_id): Path<String>,
) -> Result<Json<Receipt>, ApiError> {
    let business_id = identity.business_id()?;
    let sale_id = sale_id
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::validation("Invalid receipt ID"))?;

    let receipt = state
        .db
        .sales()
        .get_receipt(business_id, sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Receipt not found"))?;

    Ok(Json(receipt))
}

/// Customers whose name or phone contains `q`, with their open debt.
pub async fn search_customers(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<CustomerMatch>>, ApiError> {
    let business_id = identity.business_id()?;
    let Some(q) = search_query(params.q.as_deref())? else {
        return Ok(Json(Vec::new()));
    };

    let customers = state
        .db
        .customers()
        .search(business_id, &q, CUSTOMER_SEARCH_LIMIT)
        .await?;

    Ok(Json(customers))
}

/// Sales of the business, newest first; `q` filters on customer name.
pub async fn list_sales(
    State(state): State<AppState>,
    identity: Identity,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SaleSummary>>, ApiError> {
    let business_id = identity.business_id()?;
    let q = search_query(params.q.as_deref())?;

    let sales = state
        .db
        .sales()
        .list(business_id, q.as_deref(), SALES_LIST_LIMIT)
        .await?;

    Ok(Json(sales))
}
