//! In-memory doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{MirroredInvoice, PurchaseDraft, PurchaseItem};
use uuid::Uuid;

use vet_clinic_backend::error::{AppError, AppResult};
use vet_clinic_backend::services::inventory::{ProductStock, StockLevel, StockUpdate};
use vet_clinic_backend::services::{
    InventoryReconciler, InvoiceMirror, MirrorOutbox, PurchaseService, PurchaseStore,
};

pub const STORAGE_KEY: &str = "vet_purchases";

/// Product table held in memory
#[derive(Default)]
pub struct FakeProductStock {
    rows: Mutex<HashMap<Uuid, StockLevel>>,
    /// Writes for this product fail
    fail_on: Mutex<Option<Uuid>>,
}

impl FakeProductStock {
    pub fn with_products(products: &[(Uuid, i32, i64, i64)]) -> Arc<Self> {
        let stock = Self::default();
        {
            let mut rows = stock.rows.lock().unwrap();
            for (id, quantity, cost, sale) in products {
                rows.insert(
                    *id,
                    StockLevel {
                        id: *id,
                        name: format!("Product {}", id),
                        stock_quantity: *quantity,
                        cost_price: Decimal::from(*cost),
                        sale_price: Decimal::from(*sale),
                    },
                );
            }
        }
        Arc::new(stock)
    }

    pub fn fail_writes_for(&self, product_id: Uuid) {
        *self.fail_on.lock().unwrap() = Some(product_id);
    }

    pub fn set_stock(&self, product_id: Uuid, quantity: i32) {
        if let Some(row) = self.rows.lock().unwrap().get_mut(&product_id) {
            row.stock_quantity = quantity;
        }
    }

    pub fn level(&self, product_id: Uuid) -> StockLevel {
        self.rows.lock().unwrap()[&product_id].clone()
    }
}

#[async_trait]
impl ProductStock for FakeProductStock {
    async fn stock_levels(&self, product_ids: &[Uuid]) -> AppResult<Vec<StockLevel>> {
        let rows = self.rows.lock().unwrap();
        Ok(product_ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    async fn write_stock(&self, update: StockUpdate) -> AppResult<()> {
        if *self.fail_on.lock().unwrap() == Some(update.product_id) {
            return Err(AppError::Internal("stock write refused".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&update.product_id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        row.stock_quantity = update.stock_quantity;
        if let Some(cost) = update.cost_price {
            row.cost_price = cost;
        }
        Ok(())
    }
}

/// Invoice mirror that records what it was given and can be made to fail
#[derive(Default)]
pub struct FakeMirror {
    failing: Mutex<bool>,
    /// The next mirror stores the header, then fails on the lines
    fail_lines_once: Mutex<bool>,
    pub mirrored: Mutex<Vec<MirroredInvoice>>,
    pub removed: Mutex<Vec<i64>>,
}

impl FakeMirror {
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn fail_lines_once(&self) {
        *self.fail_lines_once.lock().unwrap() = true;
    }

    /// Lines stored remotely for a purchase
    pub fn line_count(&self, source_purchase_id: i64) -> Option<usize> {
        self.mirrored
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.invoice.source_purchase_id == source_purchase_id)
            .map(|m| m.lines.len())
    }

    pub fn mirrored_ids(&self) -> Vec<i64> {
        self.mirrored
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.invoice.source_purchase_id)
            .collect()
    }
}

#[async_trait]
impl InvoiceMirror for FakeMirror {
    fn backend_tag(&self) -> &'static str {
        "fake"
    }

    async fn mirror(&self, invoice: &MirroredInvoice) -> AppResult<()> {
        if *self.failing.lock().unwrap() {
            return Err(AppError::Mirror("invoice store unreachable".to_string()));
        }
        let mut mirrored = self.mirrored.lock().unwrap();
        // Same idempotency the real backends get from source_purchase_id,
        // including completing a header that was left without lines
        match mirrored
            .iter_mut()
            .find(|m| m.invoice.source_purchase_id == invoice.invoice.source_purchase_id)
        {
            Some(existing) if existing.lines.is_empty() => existing.lines = invoice.lines.clone(),
            Some(_) => {}
            None => {
                if std::mem::take(&mut *self.fail_lines_once.lock().unwrap()) {
                    mirrored.push(MirroredInvoice {
                        invoice: invoice.invoice.clone(),
                        lines: Vec::new(),
                    });
                    return Err(AppError::Mirror("invoice line insert failed".to_string()));
                }
                mirrored.push(invoice.clone());
            }
        }
        Ok(())
    }

    async fn remove(&self, source_purchase_id: i64) -> AppResult<()> {
        if *self.failing.lock().unwrap() {
            return Err(AppError::Mirror("invoice store unreachable".to_string()));
        }
        self.mirrored
            .lock()
            .unwrap()
            .retain(|m| m.invoice.source_purchase_id != source_purchase_id);
        self.removed.lock().unwrap().push(source_purchase_id);
        Ok(())
    }
}

/// Everything a purchasing test needs, rooted in one temp directory
pub struct Harness {
    pub store: Arc<PurchaseStore>,
    pub outbox: Arc<MirrorOutbox>,
    pub mirror: Arc<FakeMirror>,
    pub stock: Arc<FakeProductStock>,
}

impl Harness {
    pub fn new(dir: &Path, stock: Arc<FakeProductStock>) -> Self {
        Self {
            store: Arc::new(PurchaseStore::new(dir, STORAGE_KEY)),
            outbox: Arc::new(MirrorOutbox::new(dir, STORAGE_KEY)),
            mirror: Arc::new(FakeMirror::default()),
            stock,
        }
    }

    pub fn service(&self) -> PurchaseService {
        PurchaseService::new(
            self.store.clone(),
            self.outbox.clone(),
            self.mirror.clone(),
            InventoryReconciler::new(self.stock.clone()),
        )
    }
}

pub fn item(product_id: Uuid, quantity: i32, unit_price: i64) -> PurchaseItem {
    PurchaseItem {
        product_id,
        product_name: "Meloxicam 1.5mg/ml".to_string(),
        quantity,
        unit_price: Decimal::from(unit_price),
        total: Decimal::from(unit_price * quantity as i64),
        notes: None,
    }
}

pub fn draft(invoice_number: &str, date: &str, items: Vec<PurchaseItem>) -> PurchaseDraft {
    let subtotal: Decimal = items.iter().map(|i| i.total).sum();
    PurchaseDraft {
        supplier: "VetSupply Co".to_string(),
        invoice_number: invoice_number.to_string(),
        purchase_date: date.to_string(),
        items,
        total: subtotal,
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
