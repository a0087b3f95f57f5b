//! Supplier purchase models and the heuristics that operate on them

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::types::PurchaseDate;

/// A line on a supplier invoice
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct PurchaseItem {
    pub product_id: Uuid,
    #[validate(length(min = 1, message = "Product name is required"))]
    pub product_name: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A recorded supplier purchase. Never updated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Purchase {
    /// Millisecond timestamp of creation, bumped to stay unique
    pub id: i64,
    pub supplier: String,
    pub invoice_number: String,
    /// Always carries a time component once stored
    pub purchase_date: NaiveDateTime,
    pub items: Vec<PurchaseItem>,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Purchase as submitted by the purchasing screen
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PurchaseDraft {
    #[validate(length(min = 1, message = "Supplier is required"))]
    pub supplier: String,
    #[validate(length(min = 1, message = "Invoice number is required"))]
    pub invoice_number: String,
    /// `YYYY-MM-DD` or a date-time string
    #[validate(length(min = 1, message = "Purchase date is required"))]
    pub purchase_date: String,
    #[validate]
    #[serde(default)]
    pub items: Vec<PurchaseItem>,
    pub total: Decimal,
}

/// Quantity and last seen unit price for one product across a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductQuantity {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// One row of a product's purchase price history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceHistoryEntry {
    pub purchase_id: i64,
    pub supplier: String,
    pub invoice_number: String,
    pub purchase_date: NaiveDateTime,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl Purchase {
    /// Sum of `unit_price * quantity` over the items, zero without items
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.unit_price * Decimal::from(item.quantity))
            .sum()
    }

    /// Whatever the invoice total carries on top of the line amounts
    pub fn tax_amount(&self) -> Decimal {
        self.total - self.subtotal()
    }

    /// Whether `draft` describes this purchase again.
    ///
    /// Items are compared position by position on `(product_id, quantity)`,
    /// so the same lines in a different order are not a match.
    pub fn is_duplicate_of(&self, draft: &PurchaseDraft, draft_date: &PurchaseDate) -> bool {
        self.supplier == draft.supplier
            && self.invoice_number == draft.invoice_number
            && draft_date.matches(&self.purchase_date)
            && self.items.len() == draft.items.len()
            && self
                .items
                .iter()
                .zip(&draft.items)
                .all(|(stored, new)| {
                    stored.product_id == new.product_id && stored.quantity == new.quantity
                })
    }

    /// Quantities grouped per product in first-seen order. When a product
    /// appears on several lines the quantities add up and the last line's
    /// unit price wins.
    pub fn quantities_by_product(&self) -> Vec<ProductQuantity> {
        let mut grouped: Vec<ProductQuantity> = Vec::new();
        for item in &self.items {
            match grouped.iter_mut().find(|g| g.product_id == item.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                    existing.unit_price = item.unit_price;
                }
                None => grouped.push(ProductQuantity {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                }),
            }
        }
        grouped
    }
}

/// First stored purchase that `draft` duplicates, if any
pub fn find_duplicate<'a>(
    existing: &'a [Purchase],
    draft: &PurchaseDraft,
    draft_date: &PurchaseDate,
) -> Option<&'a Purchase> {
    existing
        .iter()
        .find(|purchase| purchase.is_duplicate_of(draft, draft_date))
}

/// Every purchase line for `product_id`, newest purchase first
pub fn price_history(purchases: &[Purchase], product_id: Uuid) -> Vec<PriceHistoryEntry> {
    let mut entries: Vec<PriceHistoryEntry> = purchases
        .iter()
        .flat_map(|purchase| {
            purchase
                .items
                .iter()
                .filter(move |item| item.product_id == product_id)
                .map(move |item| PriceHistoryEntry {
                    purchase_id: purchase.id,
                    supplier: purchase.supplier.clone(),
                    invoice_number: purchase.invoice_number.clone(),
                    purchase_date: purchase.purchase_date,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.purchase_date
            .cmp(&a.purchase_date)
            .then_with(|| b.purchase_id.cmp(&a.purchase_id))
    });
    entries
}
