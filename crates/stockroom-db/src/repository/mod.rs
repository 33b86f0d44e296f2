//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  InventoryService / AuthService                                        │
//! │       │                                                                 │
//! │       │  db.products().update_stock(1, 7)                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── insert / get_by_id / list                                         │
//! │  ├── update_price / update_stock / adjust_stock                        │
//! │  └── delete (soft)                                                     │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Each repository owns the rows of exactly one table and holds a clone  │
//! │  of the pool handed to it at construction.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SupplierRepository`](supplier::SupplierRepository) - Supplier CRUD
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and stock
//! - [`UserRepository`](user::UserRepository) - Account lookup and creation

pub mod product;
pub mod supplier;
pub mod user;
