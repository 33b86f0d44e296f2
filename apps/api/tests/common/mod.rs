//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use stockroom_api::credentials::HashCost;
use stockroom_api::{ApiConfig, AppState};
use stockroom_core::{Money, NewProduct, NewSupplier, SupplierId};
use stockroom_db::{Database, DbConfig};

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> ApiConfig {
    ApiConfig {
        jwt_secret: TEST_SECRET.to_string(),
        ..ApiConfig::default()
    }
}

/// App state over a fresh in-memory database, with cheap password hashing.
pub async fn test_state() -> AppState {
    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database");
    AppState::with_hash_cost(db, &test_config(), HashCost::minimal()).expect("app state")
}

pub fn acme() -> NewSupplier {
    NewSupplier {
        name: "Acme".to_string(),
        contact_email: "a@acme.com".to_string(),
        phone: "555-0100".to_string(),
    }
}

pub fn widget(supplier_id: SupplierId) -> NewProduct {
    NewProduct {
        name: "Widget".to_string(),
        description: String::new(),
        supplier_id,
        price: Money::parse("19.99").expect("price"),
        stock: 10,
        minimum_stock: 2,
    }
}
