//! WebAssembly module for the Vet Clinic Management Platform
//!
//! Lets the purchasing screen run the same purchase rules as the server
//! before submitting:
//! - duplicate detection against already-loaded purchases
//! - invoice subtotal and tax derivation
//! - per-product price history
//! - draft amount checks
//!
//! Inputs and outputs are JSON strings in the server's wire format.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

#[derive(Serialize)]
struct InvoiceTotals {
    #[serde(with = "rust_decimal::serde::str")]
    subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    total: Decimal,
}

fn js_error(message: String) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

fn parse<T: serde::de::DeserializeOwned>(json: &str, what: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| js_error(format!("Invalid {} JSON: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error(format!("Serialization failed: {}", e)))
}

/// Return the stored purchase (as JSON) that the draft would duplicate
#[wasm_bindgen]
pub fn find_duplicate_purchase(purchases_json: &str, draft_json: &str) -> Result<Option<String>, JsValue> {
    let purchases: Vec<Purchase> = parse(purchases_json, "purchases")?;
    let draft: PurchaseDraft = parse(draft_json, "purchase draft")?;
    let date: PurchaseDate = draft
        .purchase_date
        .parse()
        .map_err(|e: PurchaseDateError| js_error(e.to_string()))?;

    find_duplicate(&purchases, &draft, &date).map(to_json).transpose()
}

/// Subtotal, tax and total the invoice copy of a purchase will carry
#[wasm_bindgen]
pub fn invoice_totals(purchase_json: &str) -> Result<String, JsValue> {
    let purchase: Purchase = parse(purchase_json, "purchase")?;
    to_json(&InvoiceTotals {
        subtotal: purchase.subtotal(),
        tax_amount: purchase.tax_amount(),
        total: purchase.total,
    })
}

/// Prices paid for one product, newest purchase first
#[wasm_bindgen]
pub fn product_price_history(purchases_json: &str, product_id: &str) -> Result<String, JsValue> {
    let purchases: Vec<Purchase> = parse(purchases_json, "purchases")?;
    let product_id = Uuid::parse_str(product_id)
        .map_err(|e| js_error(format!("Invalid product id: {}", e)))?;

    to_json(&price_history(&purchases, product_id))
}

/// First problem with a draft's date or amounts, or `None` if it looks valid
#[wasm_bindgen]
pub fn check_purchase_draft(draft_json: &str) -> Result<Option<String>, JsValue> {
    let draft: PurchaseDraft = parse(draft_json, "purchase draft")?;
    Ok(validate_purchase_amounts(&draft).err().map(str::to_string))
}
