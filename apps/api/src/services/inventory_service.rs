//! Supplier and product management.
//!
//! Input rules (formats, lengths, non-negative prices) are checked here
//! before anything touches storage. Rules that depend on other rows, such as
//! "the supplier must exist" or "a supplier with products cannot be deleted",
//! are enforced by the repositories in a single statement so they hold under
//! concurrency.

use std::time::Duration;

use tracing::{debug, info};

use stockroom_core::validation::{
    validate_contact_email, validate_description, validate_name, validate_phone, validate_price,
};
use stockroom_core::{Money, NewProduct, NewSupplier, Product, ProductId, Supplier, SupplierId};
use stockroom_db::Database;

use crate::error::{ServiceError, ServiceResult};
use crate::services::with_deadline;

/// Inventory service.
#[derive(Debug, Clone)]
pub struct InventoryService {
    db: Database,
    operation_timeout: Duration,
}

impl InventoryService {
    pub fn new(db: Database, operation_timeout: Duration) -> Self {
        InventoryService {
            db,
            operation_timeout,
        }
    }

    // =========================================================================
    // Suppliers
    // =========================================================================

    /// Creates a supplier and returns the stored record.
    pub async fn create_supplier(&self, input: NewSupplier) -> ServiceResult<Supplier> {
        with_deadline(self.operation_timeout, async move {
            let input = clean_supplier(input)?;
            let supplier = self.db.suppliers().insert(&input).await?;
            info!(supplier_id = supplier.id, name = %supplier.name, "Supplier created");
            Ok(supplier)
        })
        .await
    }

    pub async fn get_supplier(&self, id: SupplierId) -> ServiceResult<Supplier> {
        with_deadline(self.operation_timeout, async move {
            Ok(self.db.suppliers().get_by_id(id).await?)
        })
        .await
    }

    pub async fn list_suppliers(&self) -> ServiceResult<Vec<Supplier>> {
        with_deadline(self.operation_timeout, async move {
            Ok(self.db.suppliers().list().await?)
        })
        .await
    }

    /// Replaces a supplier's contact email.
    pub async fn update_supplier_email(
        &self,
        id: SupplierId,
        contact_email: &str,
    ) -> ServiceResult<Supplier> {
        with_deadline(self.operation_timeout, async move {
            validate_contact_email(contact_email)?;
            let supplier = self
                .db
                .suppliers()
                .update_email(id, contact_email.trim())
                .await?;
            debug!(supplier_id = id, "Supplier email updated");
            Ok(supplier)
        })
        .await
    }

    /// Replaces a supplier's phone number.
    pub async fn update_supplier_phone(&self, id: SupplierId, phone: &str) -> ServiceResult<Supplier> {
        with_deadline(self.operation_timeout, async move {
            validate_phone(phone)?;
            let supplier = self.db.suppliers().update_phone(id, phone.trim()).await?;
            debug!(supplier_id = id, "Supplier phone updated");
            Ok(supplier)
        })
        .await
    }

    /// Deletes a supplier that no live product references.
    ///
    /// ## Errors
    /// * `NotFound` - No live supplier with this id
    /// * `SupplierInUse` - Products still reference it
    pub async fn delete_supplier(&self, id: SupplierId) -> ServiceResult<()> {
        with_deadline(self.operation_timeout, async move {
            self.db.suppliers().delete(id).await?;
            info!(supplier_id = id, "Supplier deleted");
            Ok(())
        })
        .await
    }

    /// Live products of one supplier.
    pub async fn supplier_products(&self, supplier_id: SupplierId) -> ServiceResult<Vec<Product>> {
        with_deadline(self.operation_timeout, async move {
            // An unknown supplier is NotFound, not an empty list
            self.db.suppliers().get_by_id(supplier_id).await?;
            Ok(self.db.products().list_by_supplier(supplier_id).await?)
        })
        .await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Creates a product and returns the stored record.
    ///
    /// ## Errors
    /// * `Validation` - Empty name, overlong description, negative price
    /// * `InvalidQuantity` - `stock` or `minimum_stock` below zero
    /// * `InvalidSupplier` - `supplier_id` is not a live supplier
    pub async fn create_product(&self, input: NewProduct) -> ServiceResult<Product> {
        with_deadline(self.operation_timeout, async move {
            let input = clean_product(input)?;
            let product = self.db.products().insert(&input).await?;
            info!(
                product_id = product.id,
                supplier_id = product.supplier_id,
                price = %product.price,
                stock = product.stock,
                "Product created"
            );
            Ok(product)
        })
        .await
    }

    pub async fn get_product(&self, id: ProductId) -> ServiceResult<Product> {
        with_deadline(self.operation_timeout, async move {
            Ok(self.db.products().get_by_id(id).await?)
        })
        .await
    }

    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        with_deadline(self.operation_timeout, async move {
            Ok(self.db.products().list().await?)
        })
        .await
    }

    pub async fn update_product_price(&self, id: ProductId, price: Money) -> ServiceResult<Product> {
        with_deadline(self.operation_timeout, async move {
            validate_price(&price)?;
            let product = self.db.products().update_price(id, &price).await?;
            debug!(product_id = id, price = %product.price, "Price updated");
            Ok(product)
        })
        .await
    }

    /// Sets the stock level to an absolute value.
    pub async fn update_product_stock(&self, id: ProductId, stock: i64) -> ServiceResult<Product> {
        with_deadline(self.operation_timeout, async move {
            let product = self.db.products().update_stock(id, stock).await?;
            debug!(product_id = id, stock = product.stock, "Stock set");
            Ok(product)
        })
        .await
    }

    /// Adds `delta` (negative to remove) to the stock level atomically.
    pub async fn adjust_stock(&self, id: ProductId, delta: i64) -> ServiceResult<Product> {
        with_deadline(self.operation_timeout, async move {
            let product = self.db.products().adjust_stock(id, delta).await?;
            debug!(product_id = id, delta, stock = product.stock, "Stock adjusted");
            Ok(product)
        })
        .await
    }

    pub async fn delete_product(&self, id: ProductId) -> ServiceResult<()> {
        with_deadline(self.operation_timeout, async move {
            self.db.products().delete(id).await?;
            info!(product_id = id, "Product deleted");
            Ok(())
        })
        .await
    }

    /// Products at or below their reorder threshold, most urgent first.
    pub async fn low_stock(&self) -> ServiceResult<Vec<Product>> {
        with_deadline(self.operation_timeout, async move {
            Ok(self.db.products().list_below_minimum().await?)
        })
        .await
    }
}

// =============================================================================
// Input Cleaning
// =============================================================================

fn clean_supplier(input: NewSupplier) -> Result<NewSupplier, ServiceError> {
    validate_name("name", &input.name)?;
    validate_contact_email(&input.contact_email)?;
    validate_phone(&input.phone)?;

    Ok(NewSupplier {
        name: input.name.trim().to_string(),
        contact_email: input.contact_email.trim().to_string(),
        phone: input.phone.trim().to_string(),
    })
}

fn clean_product(input: NewProduct) -> Result<NewProduct, ServiceError> {
    validate_name("name", &input.name)?;
    validate_description(&input.description)?;
    validate_price(&input.price)?;

    Ok(NewProduct {
        name: input.name.trim().to_string(),
        description: input.description.trim().to_string(),
        ..input
    })
}
