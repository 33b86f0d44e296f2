//! # Stockroom API
//!
//! Accounts, sessions and inventory over HTTP.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Stockroom API                                   │
//! │                                                                         │
//! │  ┌────────────────────────────────────────────────────────────────────┐ │
//! │  │                    routes (axum Router)                            │ │
//! │  │   /user-auth/*          /products/*          /suppliers/*          │ │
//! │  └──────────┬──────────────────────┬──────────────────────────────────┘ │
//! │             │                      │                                    │
//! │  ┌──────────▼─────────┐  ┌─────────▼──────────┐                         │
//! │  │  AuthService       │  │  InventoryService  │                         │
//! │  │                    │  │                    │                         │
//! │  │ • register         │  │ • suppliers CRUD   │                         │
//! │  │ • login            │  │ • products CRUD    │                         │
//! │  │ • authenticate     │  │ • stock, low-stock │                         │
//! │  └──┬──────────┬──────┘  └─────────┬──────────┘                         │
//! │     │          │                   │                                    │
//! │  ┌──▼───────┐ ┌▼────────────┐ ┌────▼───────────────────────────────┐    │
//! │  │Credential│ │ TokenIssuer │ │  stockroom-db (SQLite repositories) │    │
//! │  │Store     │ │ (HS256 JWT) │ │                                     │    │
//! │  │(Argon2id)│ │             │ │                                     │    │
//! │  └──────────┘ └─────────────┘ └─────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. `JWT_SECRET` (or `STOCKROOM_JWT_SECRET`) is
//! required; everything else has a default.

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod routes;
pub mod services;

use std::sync::Arc;

// Re-exports
pub use config::{ApiConfig, ConfigError};
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use services::{AuthService, InventoryService, LoginOutcome};

use stockroom_db::Database;

use crate::auth::TokenIssuer;
use crate::credentials::{CredentialError, CredentialStore, HashCost};

/// Shared application state.
///
/// Cloned into every request; all members are cheap handles.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: AuthService,
    pub inventory: InventoryService,
}

impl AppState {
    /// Wires the services over an open database.
    pub fn new(db: Database, config: &ApiConfig) -> Result<Self, CredentialError> {
        Self::with_hash_cost(db, config, HashCost::default())
    }

    /// Like [`Self::new`] with explicit password hashing cost.
    pub fn with_hash_cost(
        db: Database,
        config: &ApiConfig,
        cost: HashCost,
    ) -> Result<Self, CredentialError> {
        let tokens = Arc::new(TokenIssuer::new(&config.jwt_secret, config.token_lifetime()));
        let credentials = CredentialStore::new(cost)?;

        let auth = AuthService::new(
            db.clone(),
            credentials,
            tokens,
            config.cookie_secure,
            config.operation_timeout(),
        );
        let inventory = InventoryService::new(db.clone(), config.operation_timeout());

        Ok(AppState {
            db,
            auth,
            inventory,
        })
    }
}
