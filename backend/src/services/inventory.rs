//! Inventory reconciliation: product stock and cost driven by purchases
//!
//! Recording a purchase adds each line's quantity to the product's stock and
//! takes the line's unit price as the new cost. Deleting the purchase takes
//! the quantity back out (never below zero) and leaves cost alone. Sale
//! prices are never touched.
//!
//! Updates are read-modify-write per product with no locking, dispatched
//! together and awaited as a batch. There is no transaction across the
//! batch: when one update fails the rest are aborted, but whatever already
//! landed stays landed.

use std::collections::HashMap;
use std::sync::Arc;

use axum::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{ProductQuantity, Purchase};
use sqlx::{FromRow, PgPool};
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Stock-related columns of a product row
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct StockLevel {
    pub id: Uuid,
    pub name: String,
    pub stock_quantity: i32,
    pub cost_price: Decimal,
    pub sale_price: Decimal,
}

/// New stock for one product; `cost_price: None` keeps the current cost
#[derive(Debug, Clone, PartialEq)]
pub struct StockUpdate {
    pub product_id: Uuid,
    pub stock_quantity: i32,
    pub cost_price: Option<Decimal>,
}

/// Product rows as seen by the reconciler
#[async_trait]
pub trait ProductStock: Send + Sync + 'static {
    /// Rows for whichever of `product_ids` exist
    async fn stock_levels(&self, product_ids: &[Uuid]) -> AppResult<Vec<StockLevel>>;

    /// Overwrite stock (and cost, when given) for one product
    async fn write_stock(&self, update: StockUpdate) -> AppResult<()>;
}

/// One product's stock movement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockChange {
    pub product_id: Uuid,
    pub product_name: String,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub cost_price: Decimal,
}

/// What a reconciliation pass did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconciliationSummary {
    pub changes: Vec<StockChange>,
    /// Product ids on the purchase with no matching product row
    pub missing_products: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Apply,
    Revert,
}

/// Applies and reverts purchases against product stock
#[derive(Clone)]
pub struct InventoryReconciler {
    products: Arc<dyn ProductStock>,
}

impl InventoryReconciler {
    pub fn new(products: Arc<dyn ProductStock>) -> Self {
        Self { products }
    }

    /// Add purchased quantities to stock and take the unit price as cost
    pub async fn apply(&self, purchase: &Purchase) -> AppResult<ReconciliationSummary> {
        self.reconcile(purchase, Direction::Apply).await
    }

    /// Take purchased quantities back out of stock, floored at zero
    pub async fn revert(&self, purchase: &Purchase) -> AppResult<ReconciliationSummary> {
        self.reconcile(purchase, Direction::Revert).await
    }

    async fn reconcile(
        &self,
        purchase: &Purchase,
        direction: Direction,
    ) -> AppResult<ReconciliationSummary> {
        let quantities = purchase.quantities_by_product();
        if quantities.is_empty() {
            return Ok(ReconciliationSummary::default());
        }

        let ids: Vec<Uuid> = quantities.iter().map(|q| q.product_id).collect();
        let levels = self.products.stock_levels(&ids).await?;

        let (updates, summary) = plan(&quantities, levels, direction);

        if !summary.missing_products.is_empty() {
            warn!(
                purchase_id = purchase.id,
                missing = ?summary.missing_products,
                "Purchase references unknown products, skipping them"
            );
        }

        self.dispatch(updates).await?;

        info!(
            purchase_id = purchase.id,
            direction = ?direction,
            products = summary.changes.len(),
            "Inventory reconciled"
        );
        Ok(summary)
    }

    /// Run every update concurrently and wait for all of them
    async fn dispatch(&self, updates: Vec<StockUpdate>) -> AppResult<()> {
        let total = updates.len();
        let mut tasks = JoinSet::new();
        for update in updates {
            let products = Arc::clone(&self.products);
            tasks.spawn(async move { products.write_stock(update).await });
        }

        let mut completed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            // Returning drops the JoinSet, which aborts whatever is still running
            match joined {
                Ok(Ok(())) => completed += 1,
                Ok(Err(e)) => {
                    warn!(completed, total, error = %e, "Stock update failed, aborting batch");
                    return Err(e);
                }
                Err(join_error) => {
                    warn!(completed, total, error = %join_error, "Stock update task died, aborting batch");
                    return Err(AppError::Internal(format!(
                        "Stock update task failed: {}",
                        join_error
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Work out the new stock for each matched product
fn plan(
    quantities: &[ProductQuantity],
    levels: Vec<StockLevel>,
    direction: Direction,
) -> (Vec<StockUpdate>, ReconciliationSummary) {
    let levels: HashMap<Uuid, StockLevel> = levels.into_iter().map(|l| (l.id, l)).collect();
    let mut updates = Vec::with_capacity(quantities.len());
    let mut summary = ReconciliationSummary::default();

    for quantity in quantities {
        let Some(level) = levels.get(&quantity.product_id) else {
            summary.missing_products.push(quantity.product_id);
            continue;
        };

        let (new_stock, cost_price) = match direction {
            Direction::Apply => (
                level.stock_quantity.saturating_add(quantity.quantity),
                Some(quantity.unit_price),
            ),
            Direction::Revert => (
                level.stock_quantity.saturating_sub(quantity.quantity).max(0),
                None,
            ),
        };

        updates.push(StockUpdate {
            product_id: level.id,
            stock_quantity: new_stock,
            cost_price,
        });
        summary.changes.push(StockChange {
            product_id: level.id,
            product_name: level.name.clone(),
            previous_stock: level.stock_quantity,
            new_stock,
            cost_price: cost_price.unwrap_or(level.cost_price),
        });
    }

    (updates, summary)
}

/// Product stock backed by the `products` table
#[derive(Clone)]
pub struct PgProductStock {
    db: PgPool,
}

impl PgProductStock {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductStock for PgProductStock {
    async fn stock_levels(&self, product_ids: &[Uuid]) -> AppResult<Vec<StockLevel>> {
        let levels = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT id, name, stock_quantity, cost_price, sale_price
            FROM products
            WHERE id = ANY($1)
            "#,
        )
        .bind(product_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(levels)
    }

    async fn write_stock(&self, update: StockUpdate) -> AppResult<()> {
        // sale_price is never written here
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = $1,
                cost_price = COALESCE($2, cost_price),
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(update.stock_quantity)
        .bind(update.cost_price)
        .bind(update.product_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(stock: i32) -> StockLevel {
        StockLevel {
            id: Uuid::new_v4(),
            name: "Cefalexin".to_string(),
            stock_quantity: stock,
            cost_price: Decimal::from(7),
            sale_price: Decimal::from(15),
        }
    }

    #[test]
    fn test_plan_apply() {
        let l = level(3);
        let q = ProductQuantity {
            product_id: l.id,
            quantity: 5,
            unit_price: Decimal::from(10),
        };
        let (updates, summary) = plan(&[q], vec![l.clone()], Direction::Apply);
        assert_eq!(
            updates,
            vec![StockUpdate {
                product_id: l.id,
                stock_quantity: 8,
                cost_price: Some(Decimal::from(10)),
            }]
        );
        assert_eq!(summary.changes[0].previous_stock, 3);
        assert!(summary.missing_products.is_empty());
    }

    #[test]
    fn test_plan_revert_floors_at_zero() {
        let l = level(3);
        let q = ProductQuantity {
            product_id: l.id,
            quantity: 5,
            unit_price: Decimal::from(10),
        };
        let (updates, summary) = plan(&[q], vec![l.clone()], Direction::Revert);
        assert_eq!(updates[0].stock_quantity, 0);
        assert_eq!(updates[0].cost_price, None);
        assert_eq!(summary.changes[0].cost_price, Decimal::from(7));
    }

    #[test]
    fn test_plan_reports_missing_products() {
        let q = ProductQuantity {
            product_id: Uuid::new_v4(),
            quantity: 1,
            unit_price: Decimal::ONE,
        };
        let (updates, summary) = plan(&[q], vec![], Direction::Apply);
        assert!(updates.is_empty());
        assert_eq!(summary.missing_products, vec![q.product_id]);
    }
}
