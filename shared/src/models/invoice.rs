//! Invoice records mirrored from purchases

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Purchase;

pub const PURCHASE_INVOICE_TYPE: &str = "purchase";
pub const RECEIVED_STATUS: &str = "received";

/// Invoice header derived from a purchase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceRecord {
    pub invoice_number: String,
    pub supplier_name: String,
    pub invoice_date: NaiveDateTime,
    pub invoice_type: String,
    pub status: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    /// Id of the purchase this invoice was copied from
    pub source_purchase_id: i64,
}

/// Invoice line derived from a purchase item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLineRecord {
    pub product_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Header plus lines, ready to be written to an invoice store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MirroredInvoice {
    pub invoice: InvoiceRecord,
    pub lines: Vec<InvoiceLineRecord>,
}

impl MirroredInvoice {
    /// Build the invoice copy of `purchase`: one line per item, tax as the
    /// gap between the purchase total and the line subtotal.
    pub fn from_purchase(purchase: &Purchase) -> Self {
        let invoice = InvoiceRecord {
            invoice_number: purchase.invoice_number.clone(),
            supplier_name: purchase.supplier.clone(),
            invoice_date: purchase.purchase_date,
            invoice_type: PURCHASE_INVOICE_TYPE.to_string(),
            status: RECEIVED_STATUS.to_string(),
            subtotal: purchase.subtotal(),
            tax_amount: purchase.tax_amount(),
            total_amount: purchase.total,
            source_purchase_id: purchase.id,
        };

        let lines = purchase
            .items
            .iter()
            .map(|item| InvoiceLineRecord {
                product_id: item.product_id,
                description: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.total,
                notes: item.notes.clone(),
            })
            .collect();

        Self { invoice, lines }
    }
}
