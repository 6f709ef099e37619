//! # Cart Normalizer
//!
//! Turns a raw `/pos/sell` body into a fully validated [`NormalizedSale`]
//! or rejects it, before any database work happens.
//!
//! ## Payload Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Incoming JSON body                               │
//! │                               │                                         │
//! │      storeId != null  OR  storeItems / warehouseItems / outsideItems    │
//! │      is an array?                                                       │
//! │                 ┌─────────────┴─────────────┐                           │
//! │               yes                           no                          │
//! │                 ▼                           ▼                           │
//! │           CART PAYLOAD               LEGACY PAYLOAD                     │
//! │  { storeId,                    { storeProductId, quantity, price,       │
//! │    storeItems[],                 customerId?, customerName?,            │
//! │    warehouseItems[],             paymentStatus? }                       │
//! │    outsideItems[],                                                      │
//! │    amountPaid?, customerId?,   "credit" → amountPaid 0, balance total   │
//! │    customerName? }             otherwise → paid in full                 │
//! │                 │                           │                           │
//! │                 └─────────────┬─────────────┘                           │
//! │                               ▼                                         │
//! │                        NormalizedSale                                   │
//! │      origin, store/warehouse/outside lines, total, paid, balance,       │
//! │      customer                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Check Order
//! Checks run in a fixed order so the first reported problem is
//! deterministic: store id, empty cart, store items, warehouse items,
//! outside items (each in array order), then payment and customer rules.

use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::validation::{is_blank, is_unset, optional_text, whole_number};

/// `paymentStatus` value that marks a legacy sale as fully on credit.
pub const CREDIT_PAYMENT_STATUS: &str = "credit";

// =============================================================================
// Normalized Cart
// =============================================================================

/// The three item groups of a cart, used for positional labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineGroup {
    Store,
    Warehouse,
    Outside,
}

impl LineGroup {
    /// JSON key of the group's array.
    pub const fn key(&self) -> &'static str {
        match self {
            LineGroup::Store => "storeItems",
            LineGroup::Warehouse => "warehouseItems",
            LineGroup::Outside => "outsideItems",
        }
    }

    /// `"Store item 2"` for the second store line (positions are 1-based).
    pub fn label(&self, position: usize) -> String {
        let title = match self {
            LineGroup::Store => "Store",
            LineGroup::Warehouse => "Warehouse",
            LineGroup::Outside => "Outside",
        };
        format!("{} item {}", title, position)
    }
}

/// A line drawn from store stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLine {
    pub store_product_id: i64,
    pub quantity: i64,
    pub price: Money,
}

/// A line drawn from warehouse stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseLine {
    pub warehouse_product_id: i64,
    pub quantity: i64,
    pub price: Money,
}

/// An untracked line; no stock effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutsideLine {
    pub name: String,
    pub quantity: i64,
    pub price: Money,
}

/// Which request shape produced the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleOrigin {
    /// Explicit store id from a cart payload.
    Cart { store_id: i64 },
    /// Single-item payload; the store is the one owning the product.
    Legacy,
}

/// A validated sale, ready for the transaction engine.
///
/// ## Invariants
/// - at least one line
/// - every quantity and price is strictly positive
/// - `total = Σ quantity × price`
/// - `0 ≤ amount_paid ≤ total`, `balance = total - amount_paid`
/// - `balance > 0` implies `customer_id.is_some()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSale {
    pub origin: SaleOrigin,
    pub store_items: Vec<StoreLine>,
    pub warehouse_items: Vec<WarehouseLine>,
    pub outside_items: Vec<OutsideLine>,
    pub total: Money,
    pub amount_paid: Money,
    pub balance: Money,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
}

impl NormalizedSale {
    /// Store id named by a cart payload; `None` for legacy sales.
    pub fn store_id(&self) -> Option<i64> {
        match self.origin {
            SaleOrigin::Cart { store_id } => Some(store_id),
            SaleOrigin::Legacy => None,
        }
    }

    #[inline]
    pub fn is_legacy(&self) -> bool {
        self.origin == SaleOrigin::Legacy
    }

    pub fn line_count(&self) -> usize {
        self.store_items.len() + self.warehouse_items.len() + self.outside_items.len()
    }

    /// True when part of the total goes onto the customer's debt.
    #[inline]
    pub fn has_balance(&self) -> bool {
        self.balance.is_positive()
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// True when the body uses the multi-source cart shape.
pub fn is_cart_payload(body: &Map<String, Value>) -> bool {
    let store_id_given = body.get("storeId").is_some_and(|v| !v.is_null());
    store_id_given
        || [LineGroup::Store, LineGroup::Warehouse, LineGroup::Outside]
            .iter()
            .any(|group| body.get(group.key()).is_some_and(Value::is_array))
}

/// Normalizes a raw sale request.
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use shopfloor_core::cart::normalize_sale;
///
/// let sale = normalize_sale(&json!({
///     "storeId": 1,
///     "storeItems": [{ "storeProductId": 5, "quantity": 2, "price": 500 }],
///     "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 1000 }]
/// })).unwrap();
///
/// assert_eq!(sale.total.units(), 2000);
/// assert_eq!(sale.balance.units(), 0);
/// ```
pub fn normalize_sale(body: &Value) -> ValidationResult<NormalizedSale> {
    let body = body.as_object().ok_or(ValidationError::NotAnObject)?;

    if is_cart_payload(body) {
        normalize_cart(body)
    } else {
        normalize_legacy(body)
    }
}

// =============================================================================
// Cart Payload
// =============================================================================

fn normalize_cart(body: &Map<String, Value>) -> ValidationResult<NormalizedSale> {
    let store_id = whole_number(body.get("storeId"), "storeId")?;
    if store_id <= 0 {
        return Err(ValidationError::InvalidId {
            field: "storeId".to_string(),
        });
    }

    let raw_store = item_array(body, LineGroup::Store);
    let raw_warehouse = item_array(body, LineGroup::Warehouse);
    let raw_outside = item_array(body, LineGroup::Outside);

    if raw_store.is_empty() && raw_warehouse.is_empty() && raw_outside.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    let store_items = raw_store
        .iter()
        .enumerate()
        .map(|(i, item)| -> ValidationResult<StoreLine> {
            let line = LineGroup::Store.label(i + 1);
            let store_product_id = whole_number(
                item.get("storeProductId"),
                &format!("{line}: storeProductId"),
            )?;
            let (quantity, price) = quantity_and_price(item, &line)?;
            Ok(StoreLine {
                store_product_id,
                quantity,
                price,
            })
        })
        .collect::<ValidationResult<Vec<_>>>()?;

    let warehouse_items = raw_warehouse
        .iter()
        .enumerate()
        .map(|(i, item)| -> ValidationResult<WarehouseLine> {
            let line = LineGroup::Warehouse.label(i + 1);
            let warehouse_product_id = whole_number(
                item.get("warehouseProductId"),
                &format!("{line}: warehouseProductId"),
            )?;
            let (quantity, price) = quantity_and_price(item, &line)?;
            Ok(WarehouseLine {
                warehouse_product_id,
                quantity,
                price,
            })
        })
        .collect::<ValidationResult<Vec<_>>>()?;

    let outside_items = raw_outside
        .iter()
        .enumerate()
        .map(|(i, item)| -> ValidationResult<OutsideLine> {
            let line = LineGroup::Outside.label(i + 1);
            // Name is checked before the numbers.
            let name = optional_text(item.get("name")).ok_or_else(|| ValidationError::Required {
                field: format!("{line}: Name"),
            })?;
            let (quantity, price) = quantity_and_price(item, &line)?;
            Ok(OutsideLine {
                name,
                quantity,
                price,
            })
        })
        .collect::<ValidationResult<Vec<_>>>()?;

    let line_totals = store_items
        .iter()
        .map(|l| l.price.checked_line_total(l.quantity))
        .chain(
            warehouse_items
                .iter()
                .map(|l| l.price.checked_line_total(l.quantity)),
        )
        .chain(
            outside_items
                .iter()
                .map(|l| l.price.checked_line_total(l.quantity)),
        )
        .collect::<Option<Vec<_>>>();
    let total = line_totals
        .and_then(Money::checked_sum)
        .ok_or_else(total_too_large)?;

    let paid_input = body.get("amountPaid");
    let amount_paid = if is_blank(paid_input) {
        total
    } else {
        Money::from_units(whole_number(paid_input, "amountPaid")?)
    };

    if amount_paid.is_negative() {
        return Err(ValidationError::Negative {
            field: "amountPaid".to_string(),
        });
    }
    if amount_paid > total {
        return Err(ValidationError::Exceeds {
            field: "amountPaid".to_string(),
            limit: "total".to_string(),
        });
    }
    let balance = total - amount_paid;

    let customer_id = optional_customer_id(body)?;
    let customer_name = optional_text(body.get("customerName"));

    if balance.is_positive() && customer_id.is_none() {
        return Err(ValidationError::CustomerRequiredForBalance);
    }

    Ok(NormalizedSale {
        origin: SaleOrigin::Cart { store_id },
        store_items,
        warehouse_items,
        outside_items,
        total,
        amount_paid,
        balance,
        customer_id,
        customer_name,
    })
}

/// A group that is missing or not an array counts as empty.
fn item_array(body: &Map<String, Value>, group: LineGroup) -> &[Value] {
    body.get(group.key())
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn quantity_and_price(item: &Value, line: &str) -> ValidationResult<(i64, Money)> {
    let quantity = whole_number(item.get("quantity"), &format!("{line}: quantity"))?;
    let price = whole_number(item.get("price"), &format!("{line}: price"))?;

    if quantity <= 0 || price <= 0 {
        return Err(ValidationError::InvalidLine {
            line: line.to_string(),
        });
    }
    Ok((quantity, Money::from_units(price)))
}

/// Zero in any form (`0`, `"0"`, `"0.0"`) means no customer was picked.
fn optional_customer_id(body: &Map<String, Value>) -> ValidationResult<Option<i64>> {
    let raw = body.get("customerId");
    if is_unset(raw) {
        return Ok(None);
    }
    whole_number(raw, "customerId").map(|id| Some(id).filter(|id| *id != 0))
}

fn total_too_large() -> ValidationError {
    ValidationError::TooLarge {
        field: "Sale total".to_string(),
    }
}

// =============================================================================
// Legacy Payload
// =============================================================================

fn normalize_legacy(body: &Map<String, Value>) -> ValidationResult<NormalizedSale> {
    let store_product_id = whole_number(body.get("storeProductId"), "storeProductId")?;
    let quantity = whole_number(body.get("quantity"), "quantity")?;
    let price = whole_number(body.get("price"), "price")?;

    if quantity <= 0 || price <= 0 {
        return Err(ValidationError::InvalidSaleData);
    }

    let on_credit =
        body.get("paymentStatus").and_then(Value::as_str) == Some(CREDIT_PAYMENT_STATUS);

    let customer_id = optional_customer_id(body)?;
    if on_credit && customer_id.is_none() {
        return Err(ValidationError::CustomerRequiredForCredit);
    }

    let price = Money::from_units(price);
    let total = price
        .checked_line_total(quantity)
        .ok_or_else(total_too_large)?;
    let amount_paid = if on_credit { Money::zero() } else { total };

    Ok(NormalizedSale {
        origin: SaleOrigin::Legacy,
        store_items: vec![StoreLine {
            store_product_id,
            quantity,
            price,
        }],
        warehouse_items: Vec::new(),
        outside_items: Vec::new(),
        total,
        amount_paid,
        balance: total - amount_paid,
        customer_id,
        customer_name: optional_text(body.get("customerName")),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejected(body: Value) -> String {
        normalize_sale(&body).unwrap_err().to_string()
    }

    #[test]
    fn test_store_and_outside_paid_in_full() {
        let sale = normalize_sale(&json!({
            "storeId": 1,
            "storeItems": [{ "storeProductId": 5, "quantity": 2, "price": 500 }],
            "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 1000 }]
        }))
        .unwrap();

        assert_eq!(sale.origin, SaleOrigin::Cart { store_id: 1 });
        assert_eq!(sale.total, Money::from_units(2000));
        assert_eq!(sale.amount_paid, Money::from_units(2000));
        assert_eq!(sale.balance, Money::zero());
        assert_eq!(sale.line_count(), 2);
        assert_eq!(sale.outside_items[0].name, "Bag");
        assert!(!sale.has_balance());
    }

    #[test]
    fn test_part_payment_with_customer() {
        let sale = normalize_sale(&json!({
            "storeId": 1,
            "storeItems": [{ "storeProductId": 5, "quantity": 2, "price": 500 }],
            "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 1000 }],
            "amountPaid": 500,
            "customerId": 9
        }))
        .unwrap();

        assert_eq!(sale.amount_paid, Money::from_units(500));
        assert_eq!(sale.balance, Money::from_units(1500));
        assert_eq!(sale.customer_id, Some(9));
    }

    #[test]
    fn test_total_spans_all_three_groups() {
        let sale = normalize_sale(&json!({
            "storeId": "3",
            "storeItems": [
                { "storeProductId": 1, "quantity": 2, "price": 100 },
                { "storeProductId": 2, "quantity": "1", "price": "50" }
            ],
            "warehouseItems": [{ "warehouseProductId": 7, "quantity": 4, "price": 25 }],
            "outsideItems": [{ "name": "  Ice  ", "quantity": 3, "price": 10 }],
            "amountPaid": ""
        }))
        .unwrap();

        assert_eq!(sale.store_id(), Some(3));
        assert_eq!(sale.total.units(), 200 + 50 + 100 + 30);
        assert_eq!(sale.amount_paid, sale.total);
        assert_eq!(sale.outside_items[0].name, "Ice");
        assert_eq!(sale.warehouse_items[0].warehouse_product_id, 7);
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert_eq!(
            rejected(json!({ "storeId": 1, "storeItems": [], "warehouseItems": [] })),
            "No items to sell"
        );
        // Non-array groups count as empty.
        assert_eq!(
            rejected(json!({ "storeId": 1, "outsideItems": "Bag" })),
            "No items to sell"
        );
    }

    #[test]
    fn test_store_id_rules() {
        assert_eq!(
            rejected(json!({ "storeItems": [{ "storeProductId": 1, "quantity": 1, "price": 1 }] })),
            "storeId must be a whole number"
        );
        assert_eq!(
            rejected(json!({ "storeId": 0, "storeItems": [] })),
            "Invalid storeId"
        );
        assert_eq!(
            rejected(json!({ "storeId": 1.5, "storeItems": [] })),
            "storeId must be a whole number"
        );
    }

    #[test]
    fn test_positional_errors() {
        let body = json!({
            "storeId": 1,
            "storeItems": [
                { "storeProductId": 1, "quantity": 1, "price": 100 },
                { "storeProductId": 2, "quantity": 1.5, "price": 100 }
            ]
        });
        assert_eq!(rejected(body), "Store item 2: quantity must be a whole number");

        let body = json!({
            "storeId": 1,
            "warehouseItems": [{ "warehouseProductId": "x", "quantity": 1, "price": 1 }]
        });
        assert_eq!(
            rejected(body),
            "Warehouse item 1: warehouseProductId must be a whole number"
        );

        let body = json!({
            "storeId": 1,
            "warehouseItems": [{ "warehouseProductId": 4, "quantity": 1, "price": 0 }]
        });
        assert_eq!(rejected(body), "Warehouse item 1: Invalid quantity or price");
    }

    #[test]
    fn test_store_items_checked_before_outside_items() {
        let body = json!({
            "storeId": 1,
            "outsideItems": [{ "name": "", "quantity": 1, "price": 1 }],
            "storeItems": [{ "storeProductId": 1, "quantity": -1, "price": 1 }]
        });
        assert_eq!(rejected(body), "Store item 1: Invalid quantity or price");
    }

    #[test]
    fn test_outside_name_checked_first() {
        let body = json!({
            "storeId": 1,
            "outsideItems": [
                { "name": "Bag", "quantity": 1, "price": 1 },
                { "name": "   ", "quantity": "bad", "price": 1 }
            ]
        });
        assert_eq!(rejected(body), "Outside item 2: Name is required");
    }

    #[test]
    fn test_amount_paid_bounds() {
        let base = |paid: Value| {
            json!({
                "storeId": 1,
                "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 1000 }],
                "amountPaid": paid,
                "customerId": 9
            })
        };
        assert_eq!(rejected(base(json!(-1))), "amountPaid cannot be negative");
        assert_eq!(rejected(base(json!(1001))), "amountPaid cannot exceed total");
        assert_eq!(rejected(base(json!("ten"))), "amountPaid must be a whole number");

        let sale = normalize_sale(&base(json!(null))).unwrap();
        assert_eq!(sale.amount_paid, Money::from_units(1000));

        let sale = normalize_sale(&base(json!(0))).unwrap();
        assert_eq!(sale.balance, Money::from_units(1000));
    }

    #[test]
    fn test_balance_requires_customer_id() {
        let body = json!({
            "storeId": 1,
            "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 1000 }],
            "amountPaid": 400,
            "customerName": "Walk-in Ada"
        });
        assert_eq!(rejected(body), "Customer required for part payment");

        let body = json!({
            "storeId": 1,
            "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 1000 }],
            "amountPaid": 400,
            "customerId": 0
        });
        assert_eq!(rejected(body), "Customer required for part payment");
    }

    #[test]
    fn test_customer_fields() {
        let sale = normalize_sale(&json!({
            "storeId": 1,
            "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 10 }],
            "customerId": "12",
            "customerName": "  Ada  "
        }))
        .unwrap();
        assert_eq!(sale.customer_id, Some(12));
        assert_eq!(sale.customer_name.as_deref(), Some("Ada"));

        let sale = normalize_sale(&json!({
            "storeId": 1,
            "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 10 }],
            "customerId": false,
            "customerName": "   "
        }))
        .unwrap();
        assert_eq!(sale.customer_id, None);
        assert_eq!(sale.customer_name, None);
    }

    #[test]
    fn test_total_overflow_rejected() {
        let body = json!({
            "storeId": 1,
            "outsideItems": [
                { "name": "A", "quantity": 2, "price": i64::MAX / 2 },
                { "name": "B", "quantity": 2, "price": i64::MAX / 2 }
            ]
        });
        assert_eq!(rejected(body), "Sale total is too large");
    }

    #[test]
    fn test_classification() {
        let legacy = json!({ "storeId": null, "storeProductId": 5, "quantity": 1, "price": 500 });
        assert!(normalize_sale(&legacy).unwrap().is_legacy());

        let cart = json!({ "storeItems": [], "storeId": 2, "outsideItems": [{ "name": "x", "quantity": 1, "price": 1 }] });
        assert!(!normalize_sale(&cart).unwrap().is_legacy());

        assert_eq!(rejected(json!([1, 2])), "Request body must be a JSON object");
    }

    #[test]
    fn test_legacy_paid_in_full() {
        let sale = normalize_sale(&json!({
            "storeProductId": 5,
            "quantity": 3,
            "price": 200,
            "customerName": "Bola"
        }))
        .unwrap();

        assert_eq!(sale.origin, SaleOrigin::Legacy);
        assert_eq!(sale.store_id(), None);
        assert_eq!(sale.store_items, vec![StoreLine {
            store_product_id: 5,
            quantity: 3,
            price: Money::from_units(200),
        }]);
        assert_eq!(sale.total.units(), 600);
        assert_eq!(sale.amount_paid.units(), 600);
        assert_eq!(sale.balance, Money::zero());
        assert_eq!(sale.customer_name.as_deref(), Some("Bola"));
    }

    #[test]
    fn test_legacy_credit_sale() {
        let sale = normalize_sale(&json!({
            "storeProductId": 5,
            "quantity": 1,
            "price": 500,
            "paymentStatus": "credit",
            "customerId": 9
        }))
        .unwrap();

        assert_eq!(sale.amount_paid, Money::zero());
        assert_eq!(sale.balance, Money::from_units(500));
        assert_eq!(sale.customer_id, Some(9));
    }

    #[test]
    fn test_legacy_rejections() {
        assert_eq!(
            rejected(json!({ "storeProductId": 5, "quantity": 0, "price": 500 })),
            "Invalid sale data"
        );
        assert_eq!(
            rejected(json!({ "storeProductId": 5, "quantity": "two", "price": 500 })),
            "quantity must be a whole number"
        );
        assert_eq!(
            rejected(json!({ "quantity": 1, "price": 500 })),
            "storeProductId must be a whole number"
        );
        assert_eq!(
            rejected(json!({
                "storeProductId": 5, "quantity": 1, "price": 500, "paymentStatus": "credit"
            })),
            "Customer ID required for credit sales"
        );
        assert_eq!(
            rejected(json!({
                "storeProductId": 5, "quantity": 1, "price": 500,
                "paymentStatus": "credit", "customerId": "0"
            })),
            "Customer ID required for credit sales"
        );
    }

    #[test]
    fn test_zero_customer_id_means_no_customer() {
        for zero in [json!(0), json!("0"), json!("0.0"), json!(0.0)] {
            assert_eq!(
                rejected(json!({
                    "storeId": 1,
                    "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 1000 }],
                    "amountPaid": 400,
                    "customerId": zero
                })),
                "Customer required for part payment"
            );
        }

        let paid = normalize_sale(&json!({
            "storeId": 1,
            "outsideItems": [{ "name": "Bag", "quantity": 1, "price": 1000 }],
            "customerId": "0"
        }))
        .unwrap();
        assert_eq!(paid.customer_id, None);
    }
}
