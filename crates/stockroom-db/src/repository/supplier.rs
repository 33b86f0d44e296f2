//! # Supplier Repository
//!
//! Database operations for suppliers.
//!
//! ## Key Operations
//! - Insert / get / list live suppliers
//! - Narrow single-field updates (email, phone)
//! - Soft delete, refused while live products still reference the supplier
//!
//! ## Delete Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 delete(id) inside one transaction                       │
//! │                                                                         │
//! │  UPDATE supplier SET deleted_at = now                                  │
//! │  WHERE id = ? AND deleted_at IS NULL                                   │
//! │    AND NOT EXISTS (live product with supplier_id = ?)                  │
//! │       │                                                                 │
//! │       ├── 1 row  ──► COMMIT, Ok(())                                    │
//! │       │                                                                 │
//! │       └── 0 rows ──► supplier still live?                              │
//! │                        ├── yes ──► SupplierInUse                       │
//! │                        └── no  ──► NotFound                            │
//! │                                                                         │
//! │  The guard and the write are one statement, so a product insert can    │
//! │  never slip in between the check and the delete.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::{NewSupplier, Supplier, SupplierId};

/// Repository for supplier database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = SupplierRepository::new(pool);
///
/// let acme = repo.insert(&new_supplier).await?;
/// repo.update_phone(acme.id, "555-0199").await?;
/// ```
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Inserts a new supplier and returns the stored row.
    ///
    /// ## Returns
    /// * `Ok(Supplier)` - Stored supplier with its generated id
    /// * `Err(DbError::ConstraintViolation)` - Empty name
    pub async fn insert(&self, supplier: &NewSupplier) -> DbResult<Supplier> {
        debug!(name = %supplier.name, "Inserting supplier");

        let stored = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO supplier (name, contact_email, phone, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, name, contact_email, phone, created_at, deleted_at
            "#,
        )
        .bind(&supplier.name)
        .bind(&supplier.contact_email)
        .bind(&supplier.phone)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        debug!(id = stored.id, "Supplier inserted");
        Ok(stored)
    }

    /// Gets a live supplier by its ID.
    ///
    /// ## Returns
    /// * `Ok(Supplier)` - Supplier found
    /// * `Err(DbError::NotFound)` - Missing or deleted
    pub async fn get_by_id(&self, id: SupplierId) -> DbResult<Supplier> {
        sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact_email, phone, created_at, deleted_at
            FROM supplier
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Lists all live suppliers, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, contact_email, phone, created_at, deleted_at
            FROM supplier
            WHERE deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = suppliers.len(), "Listed suppliers");
        Ok(suppliers)
    }

    /// Replaces a supplier's contact email.
    ///
    /// ## Returns
    /// * `Ok(Supplier)` - The row as stored after the update
    /// * `Err(DbError::NotFound)` - The update matched zero rows
    pub async fn update_email(&self, id: SupplierId, contact_email: &str) -> DbResult<Supplier> {
        debug!(id, "Updating supplier email");

        sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE supplier SET contact_email = ?2
            WHERE id = ?1 AND deleted_at IS NULL
            RETURNING id, name, contact_email, phone, created_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(contact_email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Replaces a supplier's phone number. Same contract as [`Self::update_email`].
    pub async fn update_phone(&self, id: SupplierId, phone: &str) -> DbResult<Supplier> {
        debug!(id, "Updating supplier phone");

        sqlx::query_as::<_, Supplier>(
            r#"
            UPDATE supplier SET phone = ?2
            WHERE id = ?1 AND deleted_at IS NULL
            RETURNING id, name, contact_email, phone, created_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Soft-deletes a supplier.
    ///
    /// ## Returns
    /// * `Ok(())` - Exactly one row was marked deleted
    /// * `Err(DbError::SupplierInUse)` - Live products still reference it
    /// * `Err(DbError::NotFound)` - Missing or already deleted
    pub async fn delete(&self, id: SupplierId) -> DbResult<()> {
        debug!(id, "Soft-deleting supplier");

        let mut tx = self.pool.begin().await?;

        // Write first: the statement takes the write lock before it reads,
        // so the follow-up probe below sees the same state it did.
        let result = sqlx::query(
            r#"
            UPDATE supplier SET deleted_at = ?2
            WHERE id = ?1
              AND deleted_at IS NULL
              AND NOT EXISTS (
                  SELECT 1 FROM products
                  WHERE supplier_id = ?1 AND deleted_at IS NULL
              )
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let live: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM supplier WHERE id = ?1 AND deleted_at IS NULL)",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            // Dropping the transaction rolls it back.
            return Err(if live {
                DbError::SupplierInUse { id }
            } else {
                DbError::not_found("Supplier", id)
            });
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Counts live suppliers (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM supplier WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
