//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Insert guarded by a live-supplier check in the same statement
//! - Narrow updates (price only, stock only, stock by delta)
//! - Low-stock report for reordering
//!
//! ## Affected-Row Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 How "not found" is detected                             │
//! │                                                                         │
//! │  ❌ WRONG: read, then write                                            │
//! │     SELECT ... WHERE id = 1      ← another request deletes here        │
//! │     UPDATE ... WHERE id = 1      ← silently touches nothing            │
//! │                                                                         │
//! │  ✅ CORRECT: write, then look at what the write touched                │
//! │     UPDATE ... WHERE id = 1 AND deleted_at IS NULL RETURNING ...       │
//! │     no row back → NotFound                                             │
//! │                                                                         │
//! │  Two racing deletes of the same id: one sees 1 row, the other 0.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Storage
//! Prices live in a TEXT column as canonical two-digit decimals ("19.99")
//! and are parsed back into [`Money`] on the way out.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};
use stockroom_core::{Money, NewProduct, Product, ProductId, SupplierId};

/// Raw `products` row; `price` is still text.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    supplier_id: SupplierId,
    price: String,
    stock: i64,
    minimum_stock: i64,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Money::parse(&row.price).map_err(|e| {
            warn!(id = row.id, price = %row.price, "Stored price does not parse");
            DbError::InvalidData(e.to_string())
        })?;

        Ok(Product {
            id: row.id,
            name: row.name,
            description: row.description,
            supplier_id: row.supplier_id,
            price,
            stock: row.stock,
            minimum_stock: row.minimum_stock,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> DbResult<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let widget = repo.insert(&new_product).await?;
/// repo.update_stock(widget.id, 7).await?;
/// let reorder = repo.list_below_minimum().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product and returns the stored row.
    ///
    /// The supplier check and the insert are a single
    /// `INSERT ... SELECT ... WHERE EXISTS` statement, so a supplier deleted
    /// concurrently can never end up with a dangling product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Stored product with its generated id
    /// * `Err(DbError::InvalidQuantity)` - `stock` or `minimum_stock` < 0
    /// * `Err(DbError::ConstraintViolation)` - Negative price
    /// * `Err(DbError::InvalidSupplier)` - Supplier missing or deleted
    pub async fn insert(&self, product: &NewProduct) -> DbResult<Product> {
        debug!(
            name = %product.name,
            supplier_id = product.supplier_id,
            "Inserting product"
        );

        if product.stock < 0 {
            return Err(DbError::invalid_quantity("stock", product.stock));
        }
        if product.minimum_stock < 0 {
            return Err(DbError::invalid_quantity(
                "minimum_stock",
                product.minimum_stock,
            ));
        }
        check_price(&product.price)?;

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (
                name, description, supplier_id, price,
                stock, minimum_stock, created_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7
            WHERE EXISTS (
                SELECT 1 FROM supplier WHERE id = ?3 AND deleted_at IS NULL
            )
            RETURNING
                id, name, description, supplier_id, price,
                stock, minimum_stock, created_at, deleted_at
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.supplier_id)
        .bind(product.price.to_storage_string())
        .bind(product.stock)
        .bind(product.minimum_stock)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::InvalidSupplier {
            supplier_id: product.supplier_id,
        })?;

        debug!(id = row.id, "Product inserted");
        Product::try_from(row)
    }

    /// Gets a live product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product found
    /// * `Err(DbError::NotFound)` - Missing or deleted
    pub async fn get_by_id(&self, id: ProductId) -> DbResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT
                id, name, description, supplier_id, price,
                stock, minimum_stock, created_at, deleted_at
            FROM products
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

        Product::try_from(row)
    }

    /// Lists all live products, oldest first.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT
                id, name, description, supplier_id, price,
                stock, minimum_stock, created_at, deleted_at
            FROM products
            WHERE deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed products");
        into_products(rows)
    }

    /// Lists the live products of one supplier.
    pub async fn list_by_supplier(&self, supplier_id: SupplierId) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT
                id, name, description, supplier_id, price,
                stock, minimum_stock, created_at, deleted_at
            FROM products
            WHERE supplier_id = ?1 AND deleted_at IS NULL
            ORDER BY id
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(supplier_id, count = rows.len(), "Listed supplier products");
        into_products(rows)
    }

    /// Lists live products at or below their reorder threshold, emptiest first.
    pub async fn list_below_minimum(&self) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT
                id, name, description, supplier_id, price,
                stock, minimum_stock, created_at, deleted_at
            FROM products
            WHERE deleted_at IS NULL AND stock <= minimum_stock
            ORDER BY stock - minimum_stock, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed products below minimum stock");
        into_products(rows)
    }

    /// Sets a product's unit price.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The row as stored after the update
    /// * `Err(DbError::ConstraintViolation)` - Negative price
    /// * `Err(DbError::NotFound)` - The update matched zero rows
    pub async fn update_price(&self, id: ProductId, price: &Money) -> DbResult<Product> {
        debug!(id, price = %price, "Updating product price");

        check_price(price)?;

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products SET price = ?2
            WHERE id = ?1 AND deleted_at IS NULL
            RETURNING
                id, name, description, supplier_id, price,
                stock, minimum_stock, created_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(price.to_storage_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

        Product::try_from(row)
    }

    /// Sets a product's stock to an absolute value.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The row as stored after the update
    /// * `Err(DbError::InvalidQuantity)` - `stock` < 0, nothing is written
    /// * `Err(DbError::NotFound)` - The update matched zero rows
    pub async fn update_stock(&self, id: ProductId, stock: i64) -> DbResult<Product> {
        debug!(id, stock, "Updating product stock");

        if stock < 0 {
            return Err(DbError::invalid_quantity("stock", stock));
        }

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products SET stock = ?2
            WHERE id = ?1 AND deleted_at IS NULL
            RETURNING
                id, name, description, supplier_id, price,
                stock, minimum_stock, created_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(stock)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", id))?;

        Product::try_from(row)
    }

    /// Changes a product's stock by `delta` (negative for sales, positive
    /// for deliveries).
    ///
    /// ## Delta Update
    /// ```text
    /// UPDATE products SET stock = stock + delta
    /// WHERE id = ? AND stock + delta >= 0
    /// ```
    /// The arithmetic happens inside SQLite, so two concurrent adjustments
    /// both land: 10 - 3 - 2 = 5, never 7 or 8.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The row as stored after the update
    /// * `Err(DbError::InvalidQuantity)` - Stock would drop below zero
    /// * `Err(DbError::NotFound)` - Missing or deleted
    pub async fn adjust_stock(&self, id: ProductId, delta: i64) -> DbResult<Product> {
        debug!(id, delta, "Adjusting product stock");

        let mut tx = self.pool.begin().await?;

        // typeof() rejects sums that overflowed into a REAL.
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products SET stock = stock + ?2
            WHERE id = ?1
              AND deleted_at IS NULL
              AND stock + ?2 >= 0
              AND typeof(stock + ?2) = 'integer'
            RETURNING
                id, name, description, supplier_id, price,
                stock, minimum_stock, created_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await?;

        let row = match row {
            Some(row) => row,
            None => {
                let current: Option<i64> = sqlx::query_scalar(
                    "SELECT stock FROM products WHERE id = ?1 AND deleted_at IS NULL",
                )
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

                return Err(match current {
                    Some(stock) => {
                        DbError::invalid_quantity("stock", stock.saturating_add(delta))
                    }
                    None => DbError::not_found("Product", id),
                });
            }
        };

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Product::try_from(row)
    }

    /// Soft-deletes a product.
    ///
    /// ## Returns
    /// * `Ok(())` - Exactly one row was marked deleted
    /// * `Err(DbError::NotFound)` - Zero rows affected
    pub async fn delete(&self, id: ProductId) -> DbResult<()> {
        debug!(id, "Soft-deleting product");

        let result = sqlx::query(
            r#"
            UPDATE products SET deleted_at = ?2
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts live products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

fn check_price(price: &Money) -> DbResult<()> {
    if price.is_negative() {
        return Err(DbError::ConstraintViolation {
            message: format!("price must not be negative (got {})", price),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockroom_core::NewSupplier;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_supplier(db: &Database) -> SupplierId {
        db.suppliers()
            .insert(&NewSupplier {
                name: "Acme".to_string(),
                contact_email: "a@acme.com".to_string(),
                phone: "555-0100".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn widget(supplier_id: SupplierId) -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            description: "Blue".to_string(),
            supplier_id,
            price: Money::parse("19.99").unwrap(),
            stock: 10,
            minimum_stock: 2,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;
        let repo = db.products();

        let stored = repo.insert(&widget(supplier_id)).await.unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(stored.price.to_string(), "19.99");
        assert_eq!(stored.stock, 10);

        let fetched = repo.get_by_id(stored.id).await.unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn test_price_is_stored_as_exact_text() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;

        let mut input = widget(supplier_id);
        input.price = Money::parse("0.1").unwrap();
        let stored = db.products().insert(&input).await.unwrap();

        let raw: String = sqlx::query_scalar("SELECT price FROM products WHERE id = ?1")
            .bind(stored.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(raw, "0.10");
    }

    #[tokio::test]
    async fn test_insert_negative_stock() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;

        let mut input = widget(supplier_id);
        input.stock = -1;
        let err = db.products().insert(&input).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidQuantity { value: -1, .. }));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_negative_price() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;

        let mut input = widget(supplier_id);
        input.price = Money::parse("-1.00").unwrap();
        let err = db.products().insert(&input).await.unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation { .. }));
    }

    #[tokio::test]
    async fn test_insert_unknown_supplier() {
        let db = test_db().await;

        let err = db.products().insert(&widget(999)).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidSupplier { supplier_id: 999 }));
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_deleted_supplier() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;
        db.suppliers().delete(supplier_id).await.unwrap();

        let err = db.products().insert(&widget(supplier_id)).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidSupplier { .. }));
    }

    #[tokio::test]
    async fn test_update_stock() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;
        let repo = db.products();
        let stored = repo.insert(&widget(supplier_id)).await.unwrap();

        let updated = repo.update_stock(stored.id, 7).await.unwrap();
        assert_eq!(updated.stock, 7);

        let err = repo.update_stock(stored.id, -1).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidQuantity { .. }));
        assert_eq!(repo.get_by_id(stored.id).await.unwrap().stock, 7);

        assert!(matches!(
            repo.update_stock(404, 3).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_update_price() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;
        let repo = db.products();
        let stored = repo.insert(&widget(supplier_id)).await.unwrap();

        let updated = repo
            .update_price(stored.id, &Money::parse("24.50").unwrap())
            .await
            .unwrap();
        assert_eq!(updated.price.to_string(), "24.50");
        assert_eq!(updated.stock, stored.stock);

        assert!(matches!(
            repo.update_price(404, &Money::from_cents(100)).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;
        let repo = db.products();
        let stored = repo.insert(&widget(supplier_id)).await.unwrap();

        assert_eq!(repo.adjust_stock(stored.id, -3).await.unwrap().stock, 7);
        assert_eq!(repo.adjust_stock(stored.id, 5).await.unwrap().stock, 12);

        let err = repo.adjust_stock(stored.id, -13).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidQuantity { value: -1, .. }));
        assert_eq!(repo.get_by_id(stored.id).await.unwrap().stock, 12);

        let err = repo.adjust_stock(stored.id, i64::MAX).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidQuantity { .. }));

        assert!(matches!(
            repo.adjust_stock(404, 1).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_adjustments_all_land() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;
        let repo = db.products();
        let stored = repo.insert(&widget(supplier_id)).await.unwrap();

        let (a, b) = tokio::join!(
            repo.adjust_stock(stored.id, -3),
            repo.adjust_stock(stored.id, -2)
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(repo.get_by_id(stored.id).await.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let acme = seed_supplier(&db).await;
        let globex = db
            .suppliers()
            .insert(&NewSupplier {
                name: "Globex".to_string(),
                contact_email: "sales@globex.com".to_string(),
                phone: "555-0200".to_string(),
            })
            .await
            .unwrap()
            .id;
        let repo = db.products();

        let full = repo.insert(&widget(acme)).await.unwrap();
        let mut low = widget(globex);
        low.name = "Gadget".to_string();
        low.stock = 1;
        let low = repo.insert(&low).await.unwrap();
        let mut gone = widget(acme);
        gone.stock = 0;
        let gone = repo.insert(&gone).await.unwrap();
        repo.delete(gone.id).await.unwrap();

        let all: Vec<_> = repo.list().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(all, vec![full.id, low.id]);

        let acme_products = repo.list_by_supplier(acme).await.unwrap();
        assert_eq!(acme_products.len(), 1);
        assert_eq!(acme_products[0].id, full.id);

        let reorder = repo.list_below_minimum().await.unwrap();
        assert_eq!(reorder.len(), 1);
        assert_eq!(reorder[0].id, low.id);
        assert!(reorder[0].needs_reorder());
    }

    #[tokio::test]
    async fn test_delete_twice_concurrently() {
        let db = test_db().await;
        let supplier_id = seed_supplier(&db).await;
        let repo = db.products();
        let stored = repo.insert(&widget(supplier_id)).await.unwrap();

        let (a, b) = tokio::join!(repo.delete(stored.id), repo.delete(stored.id));

        let outcomes = [a, b];
        let ok = outcomes.iter().filter(|r| r.is_ok()).count();
        let not_found = outcomes
            .iter()
            .filter(|r| matches!(r, Err(DbError::NotFound { .. })))
            .count();
        assert_eq!((ok, not_found), (1, 1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_delete_race_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("race.db")).max_connections(4))
            .await
            .unwrap();
        let supplier_id = seed_supplier(&db).await;
        let stored = db.products().insert(&widget(supplier_id)).await.unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let repo = db.products();
                tokio::spawn(async move { repo.delete(stored.id).await })
            })
            .collect();

        let mut ok = 0;
        let mut not_found = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(DbError::NotFound { .. }) => not_found += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(not_found, 3);
        db.close().await;
    }
}
