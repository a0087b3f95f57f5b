//! Purchasing workflow tests
//!
//! Covers the save/delete pipeline end to end against in-memory doubles:
//! - duplicate submissions return the first record and leave stock alone
//! - mirror failures never fail a save and land in the outbox
//! - outbox replay clears entries once the mirror recovers
//! - deletion reverses stock and drops the invoice copy, even when the
//!   mirror is unreachable

mod common;

use common::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;
use vet_clinic_backend::error::AppError;
use vet_clinic_backend::services::purchasing::MirrorStatus;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[tokio::test]
    async fn test_save_applies_stock_and_cost() {
        let dir = tempfile::tempdir().unwrap();
        let product = Uuid::new_v4();
        let harness = Harness::new(dir.path(), FakeProductStock::with_products(&[(product, 3, 7, 15)]));

        let receipt = harness
            .service()
            .save_purchase(draft("INV-1", "2024-03-01", vec![item(product, 5, 10)]))
            .await
            .unwrap();

        assert!(receipt.created);
        assert_eq!(receipt.mirror, MirrorStatus::Synced);
        let level = harness.stock.level(product);
        assert_eq!(level.stock_quantity, 8);
        assert_eq!(level.cost_price, Decimal::from(10));
        assert_eq!(level.sale_price, Decimal::from(15));
    }

    #[tokio::test]
    async fn test_duplicate_returns_original_without_reapplying_stock() {
        let dir = tempfile::tempdir().unwrap();
        let product = Uuid::new_v4();
        let harness = Harness::new(dir.path(), FakeProductStock::with_products(&[(product, 0, 7, 15)]));
        let service = harness.service();

        let first = service
            .save_purchase(draft("INV-1", "2024-03-01", vec![item(product, 5, 10)]))
            .await
            .unwrap();
        let second = service
            .save_purchase(draft("INV-1", "2024-03-01", vec![item(product, 5, 10)]))
            .await
            .unwrap();

        assert!(!second.created);
        assert_eq!(second.purchase.id, first.purchase.id);
        assert_eq!(second.mirror, MirrorStatus::Skipped);
        assert!(second.inventory.is_none());
        assert_eq!(harness.store.get_purchases().await.len(), 1);
        assert_eq!(harness.stock.level(product).stock_quantity, 5);
        assert_eq!(harness.mirror.mirrored_ids(), vec![first.purchase.id]);
    }

    #[tokio::test]
    async fn test_reordered_items_are_not_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let harness = Harness::new(
            dir.path(),
            FakeProductStock::with_products(&[(a, 0, 1, 2), (b, 0, 1, 2)]),
        );
        let service = harness.service();

        service
            .save_purchase(draft("INV-2", "2024-03-01", vec![item(a, 1, 5), item(b, 2, 5)]))
            .await
            .unwrap();
        let reordered = service
            .save_purchase(draft("INV-2", "2024-03-01", vec![item(b, 2, 5), item(a, 1, 5)]))
            .await
            .unwrap();

        assert!(reordered.created);
        assert_eq!(harness.store.get_purchases().await.len(), 2);
    }

    #[tokio::test]
    async fn test_mirror_failure_is_queued_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let product = Uuid::new_v4();
        let harness = Harness::new(dir.path(), FakeProductStock::with_products(&[(product, 0, 7, 15)]));
        harness.mirror.set_failing(true);

        let receipt = harness
            .service()
            .save_purchase(draft("INV-3", "2024-03-02", vec![item(product, 4, 9)]))
            .await
            .unwrap();

        assert!(matches!(receipt.mirror, MirrorStatus::Failed { attempts: 1, .. }));
        assert_eq!(receipt.warnings.len(), 1);
        // Store and stock still moved
        assert_eq!(harness.store.get_purchases().await.len(), 1);
        assert_eq!(harness.stock.level(product).stock_quantity, 4);

        let pending = harness.outbox.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].purchase_id, receipt.purchase.id);
    }

    #[tokio::test]
    async fn test_retry_clears_outbox_once_mirror_recovers() {
        let dir = tempfile::tempdir().unwrap();
        let product = Uuid::new_v4();
        let harness = Harness::new(dir.path(), FakeProductStock::with_products(&[(product, 0, 7, 15)]));
        let service = harness.service();
        harness.mirror.set_failing(true);

        let receipt = service
            .save_purchase(draft("INV-4", "2024-03-02", vec![item(product, 2, 3)]))
            .await
            .unwrap();

        let still_down = service.retry_mirrors().await.unwrap();
        assert_eq!(still_down.failed.len(), 1);
        assert_eq!(still_down.failed[0].attempts, 2);

        harness.mirror.set_failing(false);
        let report = service.retry_mirrors().await.unwrap();

        assert_eq!(report.synced, vec![receipt.purchase.id]);
        assert!(harness.outbox.pending().await.unwrap().is_empty());
        assert_eq!(harness.mirror.mirrored_ids(), vec![receipt.purchase.id]);
    }

    #[tokio::test]
    async fn test_retry_drops_entries_for_deleted_purchases() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(dir.path(), FakeProductStock::with_products(&[]));
        harness.outbox.record_failure(42, "timeout").await.unwrap();

        let report = harness.service().retry_mirrors().await.unwrap();

        assert_eq!(report.dropped, vec![42]);
        assert!(harness.outbox.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_reverts_stock_and_removes_invoice() {
        let dir = tempfile::tempdir().unwrap();
        let product = Uuid::new_v4();
        let harness = Harness::new(dir.path(), FakeProductStock::with_products(&[(product, 3, 7, 15)]));
        let service = harness.service();

        let saved = service
            .save_purchase(draft("INV-5", "2024-03-03", vec![item(product, 5, 10)]))
            .await
            .unwrap();
        // Someone sells most of the stock in between
        harness.stock.set_stock(product, 2);

        let receipt = service.delete_purchase(saved.purchase.id).await.unwrap();

        assert_eq!(receipt.inventory.changes[0].new_stock, 0);
        let level = harness.stock.level(product);
        assert_eq!(level.stock_quantity, 0);
        assert_eq!(level.cost_price, Decimal::from(10));
        assert_eq!(*harness.mirror.removed.lock().unwrap(), vec![saved.purchase.id]);
        assert!(matches!(
            service.get(saved.purchase.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_partial_mirror_failure_is_completed_by_retry() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let harness = Harness::new(
            dir.path(),
            FakeProductStock::with_products(&[(a, 0, 7, 15), (b, 0, 2, 4)]),
        );
        let service = harness.service();
        harness.mirror.fail_lines_once();

        let receipt = service
            .save_purchase(draft("INV-7", "2024-03-04", vec![item(a, 2, 3), item(b, 1, 1)]))
            .await
            .unwrap();

        let id = receipt.purchase.id;
        assert!(matches!(receipt.mirror, MirrorStatus::Failed { .. }));
        assert_eq!(harness.mirror.line_count(id), Some(0));
        assert_eq!(harness.outbox.pending().await.unwrap().len(), 1);

        let report = service.retry_mirrors().await.unwrap();

        assert_eq!(report.synced, vec![id]);
        assert_eq!(harness.mirror.line_count(id), Some(2));
        assert!(harness.outbox.pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_with_mirror_down_still_reverts_stock() {
        let dir = tempfile::tempdir().unwrap();
        let product = Uuid::new_v4();
        let harness = Harness::new(dir.path(), FakeProductStock::with_products(&[(product, 1, 7, 15)]));
        let service = harness.service();

        let saved = service
            .save_purchase(draft("INV-8", "2024-03-05", vec![item(product, 4, 6)]))
            .await
            .unwrap();
        assert_eq!(harness.stock.level(product).stock_quantity, 5);
        harness.mirror.set_failing(true);

        let receipt = service.delete_purchase(saved.purchase.id).await.unwrap();

        assert_eq!(receipt.warnings.len(), 1);
        assert!(receipt.warnings[0].contains("could not be removed"));
        assert_eq!(harness.stock.level(product).stock_quantity, 1);
        assert!(harness.mirror.removed.lock().unwrap().is_empty());
        assert!(matches!(
            service.get(saved.purchase.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unparseable_date_is_rejected_before_storage() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(dir.path(), FakeProductStock::with_products(&[]));

        let err = harness
            .service()
            .save_purchase(draft("INV-9", "next tuesday", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(&err, AppError::Validation { field, .. } if field == "purchase"));
        assert!(harness.store.get_purchases().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_draft_is_rejected_before_storage() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(dir.path(), FakeProductStock::with_products(&[]));

        let mut bad = draft("INV-6", "2024-03-03", vec![]);
        bad.total = Decimal::from(-1);
        let err = harness.service().save_purchase(bad).await.unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
        assert!(harness.store.get_purchases().await.is_empty());
    }

    #[tokio::test]
    async fn test_price_history_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let product = Uuid::new_v4();
        let harness = Harness::new(dir.path(), FakeProductStock::with_products(&[(product, 0, 1, 2)]));
        let service = harness.service();

        for (invoice, date, price) in [
            ("A", "2024-01-10T10:00:00", 8),
            ("B", "2024-03-10T10:00:00", 12),
            ("C", "2024-02-10T10:00:00", 10),
        ] {
            service
                .save_purchase(draft(invoice, date, vec![item(product, 1, price)]))
                .await
                .unwrap();
        }

        let prices: Vec<Decimal> = service
            .price_history(product)
            .await
            .into_iter()
            .map(|e| e.unit_price)
            .collect();
        assert_eq!(
            prices,
            vec![Decimal::from(12), Decimal::from(10), Decimal::from(8)]
        );
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Resubmitting the same draft any number of times stores it once
        #[test]
        fn prop_resubmission_stores_once(quantity in 1i32..500, resubmits in 1usize..5) {
            let dir = tempfile::tempdir().unwrap();
            let product = Uuid::new_v4();
            let harness = Harness::new(dir.path(), FakeProductStock::with_products(&[(product, 0, 1, 2)]));
            let service = harness.service();
            let submission = draft("INV-P", "2024-05-05", vec![item(product, quantity, 3)]);

            tokio_test::block_on(async {
                for _ in 0..=resubmits {
                    service.save_purchase(submission.clone()).await.unwrap();
                }
            });

            let stored = tokio_test::block_on(harness.store.get_purchases());
            prop_assert_eq!(stored.len(), 1);
            prop_assert_eq!(harness.stock.level(product).stock_quantity, quantity);
        }
    }
}
