//! Inventory reconciliation tests
//!
//! Stock and cost updates driven by purchases:
//! - apply adds quantity and overwrites cost, sale price untouched
//! - revert subtracts quantity, floored at zero, cost untouched
//! - repeated products are summed, the last unit price wins
//! - a failed update surfaces as an error with no compensation

mod common;

use chrono::Utc;
use common::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::{Purchase, PurchaseItem};
use uuid::Uuid;
use vet_clinic_backend::services::InventoryReconciler;

fn purchase(items: Vec<PurchaseItem>) -> Purchase {
    let total = items.iter().map(|i| i.total).sum();
    Purchase {
        id: 1,
        supplier: "VetSupply Co".to_string(),
        invoice_number: "INV-R".to_string(),
        purchase_date: day(2024, 4, 1).and_hms_opt(9, 0, 0).unwrap(),
        items,
        total,
        created_at: Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_apply_adds_stock_and_sets_cost() {
        let product = Uuid::new_v4();
        let stock = FakeProductStock::with_products(&[(product, 3, 7, 15)]);
        let reconciler = InventoryReconciler::new(stock.clone());

        let summary = reconciler.apply(&purchase(vec![item(product, 5, 10)])).await.unwrap();

        assert_eq!(summary.changes.len(), 1);
        assert_eq!(summary.changes[0].previous_stock, 3);
        let level = stock.level(product);
        assert_eq!(level.stock_quantity, 8);
        assert_eq!(level.cost_price, Decimal::from(10));
        assert_eq!(level.sale_price, Decimal::from(15));
    }

    #[tokio::test]
    async fn test_revert_floors_at_zero_and_keeps_cost() {
        let product = Uuid::new_v4();
        let stock = FakeProductStock::with_products(&[(product, 3, 7, 15)]);
        let reconciler = InventoryReconciler::new(stock.clone());

        reconciler.revert(&purchase(vec![item(product, 5, 10)])).await.unwrap();

        let level = stock.level(product);
        assert_eq!(level.stock_quantity, 0);
        assert_eq!(level.cost_price, Decimal::from(7));
    }

    #[tokio::test]
    async fn test_repeated_product_sums_quantity_last_price_wins() {
        let product = Uuid::new_v4();
        let stock = FakeProductStock::with_products(&[(product, 0, 7, 15)]);
        let reconciler = InventoryReconciler::new(stock.clone());

        reconciler
            .apply(&purchase(vec![item(product, 2, 10), item(product, 3, 12)]))
            .await
            .unwrap();

        let level = stock.level(product);
        assert_eq!(level.stock_quantity, 5);
        assert_eq!(level.cost_price, Decimal::from(12));
    }

    #[tokio::test]
    async fn test_unknown_products_are_skipped_and_reported() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let stock = FakeProductStock::with_products(&[(known, 1, 1, 1)]);
        let reconciler = InventoryReconciler::new(stock.clone());

        let summary = reconciler
            .apply(&purchase(vec![item(unknown, 4, 2), item(known, 1, 2)]))
            .await
            .unwrap();

        assert_eq!(summary.missing_products, vec![unknown]);
        assert_eq!(stock.level(known).stock_quantity, 2);
    }

    #[tokio::test]
    async fn test_failed_update_propagates() {
        let (ok, broken) = (Uuid::new_v4(), Uuid::new_v4());
        let stock = FakeProductStock::with_products(&[(ok, 0, 1, 1), (broken, 0, 1, 1)]);
        stock.fail_writes_for(broken);
        let reconciler = InventoryReconciler::new(stock.clone());

        let result = reconciler
            .apply(&purchase(vec![item(ok, 1, 2), item(broken, 1, 2)]))
            .await;

        assert!(result.is_err());
        assert_eq!(stock.level(broken).stock_quantity, 0);
    }

    #[tokio::test]
    async fn test_empty_purchase_is_a_no_op() {
        let stock = FakeProductStock::with_products(&[]);
        let reconciler = InventoryReconciler::new(stock);

        let summary = reconciler.apply(&purchase(vec![])).await.unwrap();
        assert!(summary.changes.is_empty());
        assert!(summary.missing_products.is_empty());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Applying then reverting with no sales in between restores stock
        #[test]
        fn prop_apply_then_revert_restores_stock(
            opening in 0i32..10_000,
            quantities in prop::collection::vec(1i32..1_000, 1..6)
        ) {
            let product = Uuid::new_v4();
            let stock = FakeProductStock::with_products(&[(product, opening, 5, 9)]);
            let reconciler = InventoryReconciler::new(stock.clone());
            let items = quantities.iter().map(|q| item(product, *q, 4)).collect();
            let p = purchase(items);

            tokio_test::block_on(async {
                reconciler.apply(&p).await.unwrap();
                reconciler.revert(&p).await.unwrap();
            });

            prop_assert_eq!(stock.level(product).stock_quantity, opening);
        }

        /// Revert never drives stock negative
        #[test]
        fn prop_revert_never_negative(opening in 0i32..100, quantity in 1i32..1_000) {
            let product = Uuid::new_v4();
            let stock = FakeProductStock::with_products(&[(product, opening, 5, 9)]);
            let reconciler = InventoryReconciler::new(stock.clone());

            tokio_test::block_on(reconciler.revert(&purchase(vec![item(product, quantity, 4)]))).unwrap();

            let level = stock.level(product);
            prop_assert_eq!(level.stock_quantity, (opening - quantity).max(0));
            prop_assert_eq!(level.cost_price, Decimal::from(5));
        }
    }
}
