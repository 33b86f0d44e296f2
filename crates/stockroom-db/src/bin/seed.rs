//! # Seed Data Generator
//!
//! Populates the database with suppliers and products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 products (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stockroom-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//! ```
//!
//! ## Generated Data
//! One supplier per catalogue below, each with its products in a few
//! package sizes. Prices, stock and reorder thresholds are derived from a
//! running index, so two runs against empty databases produce identical data.
//! Roughly one product in seven starts at or below its reorder threshold.

use std::env;
use stockroom_core::{Money, NewProduct, NewSupplier, SupplierId};
use stockroom_db::{Database, DbConfig};

/// Supplier name, contact email, phone, and what they sell.
const CATALOGUES: &[(&str, &str, &str, &[&str])] = &[
    (
        "Acme Fasteners",
        "orders@acme-fasteners.com",
        "555-0100",
        &[
            "Wood Screws",
            "Machine Screws",
            "Hex Bolts",
            "Carriage Bolts",
            "Lock Washers",
            "Flat Washers",
            "Wing Nuts",
            "Hex Nuts",
            "Drywall Anchors",
            "Rivets",
        ],
    ),
    (
        "Northwind Paper Co",
        "sales@northwind-paper.com",
        "555-0142",
        &[
            "Copy Paper",
            "Cardstock",
            "Sticky Notes",
            "Legal Pads",
            "Envelopes",
            "Shipping Labels",
            "Receipt Rolls",
            "Index Cards",
        ],
    ),
    (
        "Globex Cleaning Supply",
        "supply@globex.com",
        "+1 (555) 013-3700",
        &[
            "Glass Cleaner",
            "Floor Cleaner",
            "Paper Towels",
            "Trash Bags",
            "Hand Soap",
            "Disinfectant Wipes",
            "Microfiber Cloths",
            "Mop Heads",
        ],
    ),
    (
        "Initech Electrical",
        "parts@initech.com",
        "555-0177",
        &[
            "AA Batteries",
            "AAA Batteries",
            "Extension Cord",
            "Power Strip",
            "LED Bulb",
            "Electrical Tape",
            "Wire Nuts",
            "Cable Ties",
        ],
    ),
];

/// Package sizes with price multipliers.
const SIZES: &[(&str, i64)] = &[("Small", 1), ("Medium", 2), ("Bulk", 5)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Maximum number of products (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockroom Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Products: up to {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.suppliers().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} suppliers", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating suppliers and products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'catalogues: for (name, email, phone, items) in CATALOGUES {
        let supplier = db
            .suppliers()
            .insert(&NewSupplier {
                name: name.to_string(),
                contact_email: email.to_string(),
                phone: phone.to_string(),
            })
            .await?;
        println!("  + {} (id {})", supplier.name, supplier.id);

        for item in items.iter() {
            for (size, multiplier) in SIZES {
                if generated >= count {
                    break 'catalogues;
                }

                let product = generate_product(supplier.id, item, size, *multiplier, generated);
                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.name, e);
                    continue;
                }

                generated += 1;
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let low = db.products().list_below_minimum().await?;
    println!("  {} products start at or below their reorder threshold", low.len());

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Generates a single product with deterministic data.
fn generate_product(
    supplier_id: SupplierId,
    name: &str,
    size: &str,
    multiplier: i64,
    seed: usize,
) -> NewProduct {
    // $0.99 - $8.98 per unit, scaled by package size
    let base_cents = 99 + ((seed * 37) % 800) as i64;
    let price = Money::from_cents(base_cents * multiplier);

    let minimum_stock = 5 + (seed % 4) as i64 * 5;
    let stock = if seed % 7 == 0 {
        (seed % 5) as i64
    } else {
        minimum_stock + 10 + ((seed * 13) % 90) as i64
    };

    NewProduct {
        name: format!("{} ({})", name, size),
        description: format!("{} pack of {}", size, name.to_lowercase()),
        supplier_id,
        price,
        stock,
        minimum_stock,
    }
}
