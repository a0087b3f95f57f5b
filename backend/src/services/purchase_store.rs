//! Purchase store: the authoritative, locally persisted list of purchases
//!
//! The list lives in one JSON document under a fixed storage key. Mirroring
//! into the invoice tables happens after a write here succeeds, so this list
//! is always the source of truth.

use chrono::{Local, Utc};
use shared::models::{find_duplicate, price_history, PriceHistoryEntry, Purchase, PurchaseDraft};
use shared::types::PurchaseDate;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::storage::JsonDocument;

/// Outcome of [`PurchaseStore::save`]
#[derive(Debug, Clone)]
pub struct SavedPurchase {
    pub purchase: Purchase,
    /// `false` when the draft matched an existing purchase
    pub created: bool,
}

/// File-backed purchase list
pub struct PurchaseStore {
    document: JsonDocument,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl PurchaseStore {
    pub fn new(data_dir: impl AsRef<Path>, storage_key: &str) -> Self {
        Self {
            document: JsonDocument::new(data_dir, storage_key),
            lock: Mutex::new(()),
        }
    }

    /// All stored purchases, or an empty list if the document is missing or
    /// cannot be read.
    pub async fn get_purchases(&self) -> Vec<Purchase> {
        let _guard = self.lock.lock().await;
        match self.document.load::<Vec<Purchase>>().await {
            Ok(purchases) => purchases.unwrap_or_default(),
            Err(e) => {
                warn!(path = %self.document.path().display(), error = %e, "Purchase list unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Look up a single purchase
    pub async fn get(&self, id: i64) -> AppResult<Purchase> {
        self.get_purchases()
            .await
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound("Purchase".to_string()))
    }

    /// Append `draft` unless it duplicates a stored purchase.
    ///
    /// A duplicate returns the stored purchase untouched. Otherwise the new
    /// purchase gets a time-derived id, a creation timestamp, and a purchase
    /// date with a time component (the current local time when the caller
    /// gave a bare date).
    ///
    /// `draft_date` is `draft.purchase_date` already parsed by validation.
    pub async fn save(&self, draft: PurchaseDraft, draft_date: PurchaseDate) -> AppResult<SavedPurchase> {
        let _guard = self.lock.lock().await;

        // Unlike get_purchases, a corrupt document must not be overwritten
        let mut purchases: Vec<Purchase> = self.document.load().await?.unwrap_or_default();

        if let Some(existing) = find_duplicate(&purchases, &draft, &draft_date) {
            debug!(
                purchase_id = existing.id,
                invoice_number = %existing.invoice_number,
                "Duplicate purchase submitted, returning existing record"
            );
            return Ok(SavedPurchase {
                purchase: existing.clone(),
                created: false,
            });
        }

        let now = Utc::now();
        let mut id = now.timestamp_millis();
        if let Some(max_id) = purchases.iter().map(|p| p.id).max() {
            if id <= max_id {
                id = max_id + 1;
            }
        }

        let purchase = Purchase {
            id,
            supplier: draft.supplier,
            invoice_number: draft.invoice_number,
            purchase_date: draft_date.normalize(Local::now().time()),
            items: draft.items,
            total: draft.total,
            created_at: now,
        };

        purchases.push(purchase.clone());
        self.document.store(&purchases).await?;

        info!(
            purchase_id = purchase.id,
            supplier = %purchase.supplier,
            invoice_number = %purchase.invoice_number,
            items = purchase.items.len(),
            "Purchase recorded"
        );

        Ok(SavedPurchase {
            purchase,
            created: true,
        })
    }

    /// Remove a purchase and hand it back
    pub async fn delete(&self, id: i64) -> AppResult<Purchase> {
        let _guard = self.lock.lock().await;

        let mut purchases: Vec<Purchase> = self.document.load().await?.unwrap_or_default();
        let position = purchases
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound("Purchase".to_string()))?;

        let removed = purchases.remove(position);
        self.document.store(&purchases).await?;

        info!(purchase_id = id, "Purchase deleted");
        Ok(removed)
    }

    /// Purchase prices paid for a product, newest first
    pub async fn price_history(&self, product_id: uuid::Uuid) -> Vec<PriceHistoryEntry> {
        price_history(&self.get_purchases().await, product_id)
    }
}
