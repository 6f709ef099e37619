//! # Seed Data Generator
//!
//! Populates a database with a demo business for development.
//!
//! ## Usage
//! ```bash
//! # Default database path
//! cargo run -p shopfloor-db --bin seed
//!
//! # Specify database path
//! cargo run -p shopfloor-db --bin seed -- --db ./data/shopfloor.db
//!
//! # Register a push token for the owner (for alert testing)
//! cargo run -p shopfloor-db --bin seed -- --push-token <TOKEN>
//! ```
//!
//! ## Generated Data
//! - One business with a SUPERADMIN owner and a cashier
//! - One store and one warehouse, each stocked with goods
//! - A few customers
//!
//! Some goods start at or near the low-stock threshold so a single sale
//! triggers an alert.

use std::env;

use shopfloor_core::UserRole;
use shopfloor_db::{Database, DbConfig};

/// Store goods: (name, quantity, price)
const STORE_GOODS: &[(&str, i64, i64)] = &[
    ("Sugar 1kg", 40, 1200),
    ("Rice 5kg", 25, 6500),
    ("Vegetable Oil 1L", 18, 2800),
    ("Bread Loaf", 30, 1000),
    ("Eggs (crate)", 6, 4500),
    ("Milk Powder 400g", 3, 3200),
    ("Tomato Paste", 50, 400),
    ("Spaghetti 500g", 60, 900),
    ("Noodles (pack)", 80, 250),
    ("Bottled Water", 120, 200),
];

/// Warehouse goods: (name, quantity, selling price)
const WAREHOUSE_GOODS: &[(&str, i64, i64)] = &[
    ("Rice 50kg", 12, 62000),
    ("Sugar 50kg", 8, 54000),
    ("Vegetable Oil 25L", 5, 58000),
    ("Flour 50kg", 3, 47000),
    ("Bottled Water (carton)", 40, 2200),
];

/// Customers: (full name, phone)
const CUSTOMERS: &[(&str, Option<&str>)] = &[
    ("Chidi Okafor", Some("08031234567")),
    ("Ngozi Eze", Some("08059876543")),
    ("Bola Adeyemi", None),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./shopfloor_dev.db");
    let mut push_token: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--push-token" | "-t" => {
                if i + 1 < args.len() {
                    push_token = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopfloor POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>            Database file path (default: ./shopfloor_dev.db)");
                println!("  -t, --push-token <TOKEN>   Register a push token for the owner");
                println!("  -h, --help                 Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Shopfloor POS Seed Data Generator");
    println!("====================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM businesses")
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("⚠ Database already has {} businesses", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let businesses = db.businesses();
    let business = businesses.create_business("Mama Put Provisions").await?;
    let owner = businesses
        .create_user(Some(business.id), "Adaeze Nwosu", UserRole::Superadmin)
        .await?;
    let cashier = businesses
        .create_user(Some(business.id), "Emeka Obi", UserRole::Cashier)
        .await?;
    let store = businesses.create_store(business.id, "Main Shop").await?;
    let warehouse = businesses.create_warehouse(business.id, "Back Depot").await?;

    println!();
    println!("✓ Business #{} \"{}\"", business.id, business.name);
    println!("  Owner:   #{} {}", owner.id, owner.full_name);
    println!("  Cashier: #{} {}", cashier.id, cashier.full_name);

    if let Some(token) = push_token {
        businesses.set_push_token(owner.id, &token).await?;
        println!("  Push token registered for owner");
    }

    let inventory = db.inventory();
    for (name, quantity, price) in STORE_GOODS {
        inventory.add_store_product(store.id, name, *quantity, *price).await?;
    }
    println!("✓ Store #{} stocked with {} goods", store.id, STORE_GOODS.len());

    for (name, quantity, price) in WAREHOUSE_GOODS {
        inventory
            .add_warehouse_product(warehouse.id, name, *quantity, *price)
            .await?;
    }
    println!(
        "✓ Warehouse #{} stocked with {} goods",
        warehouse.id,
        WAREHOUSE_GOODS.len()
    );

    let customers = db.customers();
    for (name, phone) in CUSTOMERS {
        customers.create(business.id, name, *phone).await?;
    }
    println!("✓ {} customers", CUSTOMERS.len());

    // Verify search
    println!();
    println!("Verifying search...");
    let results = inventory.search_store_goods(business.id, "rice", 10).await?;
    println!("  Search 'rice' returned {} store goods", results.len());
    for good in results.iter().take(3) {
        println!("    - {} @ {} ({} left)", good.name, good.price, good.quantity);
    }

    println!();
    println!("Try a sale:");
    println!("  curl -X POST http://127.0.0.1:8080/api/pos/sell \\");
    println!("    -H 'content-type: application/json' \\");
    println!("    -H 'x-user-id: {}' -H 'x-business-id: {}' \\", cashier.id, business.id);
    println!(
        "    -d '{{\"storeId\": {}, \"storeItems\": [{{\"storeProductId\": 1, \"quantity\": 1, \"price\": 1200}}]}}'",
        store.id
    );

    db.close().await;
    println!();
    println!("🎉 Seed complete!");

    Ok(())
}
