//! Purchasing workflow
//!
//! Saving a purchase runs in a fixed order:
//! 1. write to the purchase store (authoritative)
//! 2. mirror the invoice; a failure is queued in the outbox and reported as a
//!    warning, never as an error
//! 3. reconcile inventory (skipped for duplicates)
//!
//! Deleting runs the same steps in reverse.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use shared::models::{MirroredInvoice, PriceHistoryEntry, Purchase, PurchaseDraft};
use shared::validation::validate_purchase_amounts;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::inventory::{InventoryReconciler, ReconciliationSummary};
use crate::services::invoice_mirror::InvoiceMirror;
use crate::services::mirror_outbox::{MirrorOutbox, PendingMirror};
use crate::services::purchase_store::PurchaseStore;

/// What happened to the invoice copy of a purchase
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MirrorStatus {
    Synced,
    /// Queued in the outbox for a manual retry
    Failed { message: String, attempts: u32 },
    Disabled,
    /// Duplicate submission; the original save already handled mirroring
    Skipped,
}

/// Response to a purchase save
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub purchase: Purchase,
    pub created: bool,
    pub mirror: MirrorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<ReconciliationSummary>,
    pub warnings: Vec<String>,
}

/// Response to a purchase delete
#[derive(Debug, Clone, Serialize)]
pub struct DeletionReceipt {
    pub purchase: Purchase,
    pub inventory: ReconciliationSummary,
    pub warnings: Vec<String>,
}

/// Result of replaying the mirror outbox
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetryReport {
    pub synced: Vec<i64>,
    pub failed: Vec<PendingMirror>,
    /// Queued purchases that no longer exist locally
    pub dropped: Vec<i64>,
}

/// Purchasing service
pub struct PurchaseService {
    store: Arc<PurchaseStore>,
    outbox: Arc<MirrorOutbox>,
    mirror: Arc<dyn InvoiceMirror>,
    reconciler: InventoryReconciler,
}

impl PurchaseService {
    pub fn new(
        store: Arc<PurchaseStore>,
        outbox: Arc<MirrorOutbox>,
        mirror: Arc<dyn InvoiceMirror>,
        reconciler: InventoryReconciler,
    ) -> Self {
        Self {
            store,
            outbox,
            mirror,
            reconciler,
        }
    }

    /// All purchases, newest purchase date first
    pub async fn list(&self) -> Vec<Purchase> {
        let mut purchases = self.store.get_purchases().await;
        purchases.sort_by(|a, b| {
            b.purchase_date
                .cmp(&a.purchase_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        purchases
    }

    pub async fn get(&self, id: i64) -> AppResult<Purchase> {
        self.store.get(id).await
    }

    pub async fn price_history(&self, product_id: Uuid) -> Vec<PriceHistoryEntry> {
        self.store.price_history(product_id).await
    }

    /// Record a purchase, mirror it and add it to inventory
    pub async fn save_purchase(&self, draft: PurchaseDraft) -> AppResult<PurchaseReceipt> {
        draft.validate()?;
        let draft_date = validate_purchase_amounts(&draft).map_err(|message| AppError::Validation {
            field: "purchase".to_string(),
            message: message.to_string(),
        })?;

        let saved = self.store.save(draft, draft_date).await?;
        let purchase = saved.purchase;

        if !saved.created {
            return Ok(PurchaseReceipt {
                purchase,
                created: false,
                mirror: MirrorStatus::Skipped,
                inventory: None,
                warnings: vec!["Purchase was already recorded; inventory left unchanged".to_string()],
            });
        }

        let mut warnings = Vec::new();
        let mirror = self.mirror_purchase(&purchase).await;
        if let MirrorStatus::Failed { message, .. } = &mirror {
            warnings.push(format!(
                "Purchase saved but the invoice copy failed and was queued for retry: {}",
                message
            ));
        }

        let inventory = self.reconciler.apply(&purchase).await?;
        if !inventory.missing_products.is_empty() {
            warnings.push(format!(
                "{} item(s) reference unknown products and did not change stock",
                inventory.missing_products.len()
            ));
        }

        Ok(PurchaseReceipt {
            purchase,
            created: true,
            mirror,
            inventory: Some(inventory),
            warnings,
        })
    }

    /// Delete a purchase, drop its invoice copy and take its stock back out
    pub async fn delete_purchase(&self, id: i64) -> AppResult<DeletionReceipt> {
        let purchase = self.store.delete(id).await?;
        let mut warnings = Vec::new();

        if self.mirror.enabled() {
            if let Err(e) = self.mirror.remove(purchase.id).await {
                warn!(purchase_id = purchase.id, error = %e, "Failed to remove mirrored invoice");
                warnings.push(format!("Mirrored invoice could not be removed: {}", e));
            }
        }
        if let Err(e) = self.outbox.clear(purchase.id).await {
            warn!(purchase_id = purchase.id, error = %e, "Failed to clear mirror outbox entry");
        }

        let inventory = self.reconciler.revert(&purchase).await?;

        Ok(DeletionReceipt {
            purchase,
            inventory,
            warnings,
        })
    }

    pub async fn pending_mirrors(&self) -> AppResult<Vec<PendingMirror>> {
        self.outbox.pending().await
    }

    /// Replay every queued mirror write once
    pub async fn retry_mirrors(&self) -> AppResult<RetryReport> {
        if !self.mirror.enabled() {
            return Err(AppError::Conflict {
                resource: "mirror".to_string(),
                message: "Invoice mirroring is disabled".to_string(),
            });
        }

        let pending = self.outbox.pending().await?;
        if pending.is_empty() {
            return Ok(RetryReport::default());
        }

        let purchases: HashMap<i64, Purchase> = self
            .store
            .get_purchases()
            .await
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut report = RetryReport::default();
        for entry in pending {
            let Some(purchase) = purchases.get(&entry.purchase_id) else {
                self.outbox.clear(entry.purchase_id).await?;
                report.dropped.push(entry.purchase_id);
                continue;
            };

            match self.mirror.mirror(&MirroredInvoice::from_purchase(purchase)).await {
                Ok(()) => {
                    self.outbox.clear(purchase.id).await?;
                    report.synced.push(purchase.id);
                }
                Err(e) => {
                    let entry = self.outbox.record_failure(purchase.id, &e.to_string()).await?;
                    report.failed.push(entry);
                }
            }
        }

        info!(
            synced = report.synced.len(),
            failed = report.failed.len(),
            dropped = report.dropped.len(),
            "Mirror outbox replayed"
        );
        Ok(report)
    }

    async fn mirror_purchase(&self, purchase: &Purchase) -> MirrorStatus {
        if !self.mirror.enabled() {
            return MirrorStatus::Disabled;
        }

        let invoice = MirroredInvoice::from_purchase(purchase);
        let error = match self.mirror.mirror(&invoice).await {
            Ok(()) => {
                info!(
                    purchase_id = purchase.id,
                    backend = self.mirror.backend_tag(),
                    "Purchase mirrored to invoices"
                );
                return MirrorStatus::Synced;
            }
            Err(e) => e.to_string(),
        };

        warn!(
            purchase_id = purchase.id,
            backend = self.mirror.backend_tag(),
            error = %error,
            "Invoice mirror failed, queuing for retry"
        );

        match self.outbox.record_failure(purchase.id, &error).await {
            Ok(entry) => MirrorStatus::Failed {
                message: error,
                attempts: entry.attempts,
            },
            Err(e) => {
                warn!(purchase_id = purchase.id, error = %e, "Could not queue failed mirror");
                MirrorStatus::Failed {
                    message: error,
                    attempts: 0,
                }
            }
        }
    }
}
