//! Outbox of purchases whose invoice mirror write failed
//!
//! Failures are recorded here instead of being dropped. Nothing replays
//! them automatically; staff trigger a replay from the purchasing screen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;

use crate::error::AppResult;
use crate::storage::JsonDocument;

/// A purchase waiting to be mirrored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingMirror {
    pub purchase_id: i64,
    pub attempts: u32,
    pub last_error: String,
    pub queued_at: DateTime<Utc>,
    pub last_attempt_at: DateTime<Utc>,
}

/// File-backed mirror outbox, stored next to the purchase list
pub struct MirrorOutbox {
    document: JsonDocument,
    lock: Mutex<()>,
}

impl MirrorOutbox {
    pub fn new(data_dir: impl AsRef<Path>, storage_key: &str) -> Self {
        Self {
            document: JsonDocument::new(data_dir, &format!("{}_mirror_outbox", storage_key)),
            lock: Mutex::new(()),
        }
    }

    /// Entries in the order they were first queued
    pub async fn pending(&self) -> AppResult<Vec<PendingMirror>> {
        let _guard = self.lock.lock().await;
        Ok(self.document.load().await?.unwrap_or_default())
    }

    /// Queue a purchase, or bump the attempt count if it is already queued
    pub async fn record_failure(&self, purchase_id: i64, error: &str) -> AppResult<PendingMirror> {
        let _guard = self.lock.lock().await;
        let mut entries: Vec<PendingMirror> = self.document.load().await?.unwrap_or_default();
        let now = Utc::now();

        let entry = match entries.iter_mut().find(|e| e.purchase_id == purchase_id) {
            Some(entry) => {
                entry.attempts += 1;
                entry.last_error = error.to_string();
                entry.last_attempt_at = now;
                entry.clone()
            }
            None => {
                let entry = PendingMirror {
                    purchase_id,
                    attempts: 1,
                    last_error: error.to_string(),
                    queued_at: now,
                    last_attempt_at: now,
                };
                entries.push(entry.clone());
                entry
            }
        };

        self.document.store(&entries).await?;
        Ok(entry)
    }

    /// Drop a purchase from the outbox. Returns whether it was queued.
    pub async fn clear(&self, purchase_id: i64) -> AppResult<bool> {
        let _guard = self.lock.lock().await;
        let mut entries: Vec<PendingMirror> = self.document.load().await?.unwrap_or_default();
        let before = entries.len();
        entries.retain(|e| e.purchase_id != purchase_id);

        if entries.len() == before {
            return Ok(false);
        }
        self.document.store(&entries).await?;
        Ok(true)
    }
}
