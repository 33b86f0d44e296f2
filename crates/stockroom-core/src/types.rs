//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐        ┌──────────────────┐   ┌─────────────────┐ │
//! │  │    Supplier     │◄───────│     Product      │   │      User       │ │
//! │  │  ─────────────  │  1..n  │  ──────────────  │   │  ─────────────  │ │
//! │  │  id (i64)       │        │  id (i64)        │   │  id (i64)       │ │
//! │  │  name           │        │  supplier_id (FK)│   │  email (unique) │ │
//! │  │  contact_email  │        │  price (Money)   │   │  password_hash  │ │
//! │  │  phone          │        │  stock >= 0      │   └─────────────────┘ │
//! │  │  deleted_at     │        │  minimum_stock   │                       │
//! │  └─────────────────┘        │  deleted_at      │                       │
//! │                             └──────────────────┘                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Ids are server-generated integers: immutable once assigned and never
//! supplied by clients on insert.
//!
//! ## Soft Delete
//! `deleted_at` is set by delete operations. Rows carrying a timestamp are
//! invisible to every read and update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Supplier primary key.
pub type SupplierId = i64;

/// Product primary key.
pub type ProductId = i64;

/// User primary key.
pub type UserId = i64;

// =============================================================================
// Supplier
// =============================================================================

/// A company products are bought from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    /// Server-generated identifier.
    pub id: SupplierId,

    /// Display name, never empty.
    pub name: String,

    /// Where purchase orders are sent.
    pub contact_email: String,

    pub phone: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Soft-delete marker.
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSupplier {
    pub name: String,
    pub contact_email: String,
    pub phone: String,
}

// =============================================================================
// Product
// =============================================================================

/// A stocked item, supplied by exactly one supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Server-generated identifier.
    pub id: ProductId,

    pub name: String,

    pub description: String,

    /// References a live supplier.
    pub supplier_id: SupplierId,

    /// Unit price as an exact decimal.
    #[ts(as = "String")]
    pub price: Money,

    /// Units on hand, never negative.
    pub stock: i64,

    /// Reorder threshold.
    pub minimum_stock: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// Soft-delete marker.
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    /// True once stock has fallen to or below the reorder threshold.
    #[inline]
    pub fn needs_reorder(&self) -> bool {
        self.stock <= self.minimum_stock
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub supplier_id: SupplierId,

    #[ts(as = "String")]
    pub price: Money,

    pub stock: i64,

    #[serde(default)]
    pub minimum_stock: i64,
}

// =============================================================================
// User
// =============================================================================

/// An account that can log in.
///
/// The password column only ever holds a salted hash; it is never
/// serialized.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: UserId,

    pub email: String,

    #[serde(skip_serializing)]
    #[ts(skip)]
    pub password_hash: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
