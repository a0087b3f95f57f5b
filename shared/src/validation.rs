//! Validation utilities for the Vet Clinic Management Platform

use rust_decimal::Decimal;

use crate::models::PurchaseDraft;
use crate::types::PurchaseDate;

// ============================================================================
// Purchase Validations
// ============================================================================

/// Money checks the derive rules cannot express, plus date parsing.
/// Returns the parsed purchase date on success.
pub fn validate_purchase_amounts(draft: &PurchaseDraft) -> Result<PurchaseDate, &'static str> {
    let date = draft
        .purchase_date
        .parse::<PurchaseDate>()
        .map_err(|_| "Purchase date must be YYYY-MM-DD or a date-time")?;

    if draft.total < Decimal::ZERO {
        return Err("Purchase total cannot be negative");
    }

    for item in &draft.items {
        if item.unit_price < Decimal::ZERO {
            return Err("Unit price cannot be negative");
        }
        if item.total < Decimal::ZERO {
            return Err("Line total cannot be negative");
        }
    }

    Ok(date)
}

/// Validate a money amount such as a sale or cost price
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a phone number: 7 to 15 digits, common separators allowed
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'))
    {
        return Err("Phone number contains invalid characters");
    }
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return Err("Phone number must have 7 to 15 digits");
    }
    Ok(())
}

/// Validate a pet weight in kilograms
pub fn validate_weight_kg(weight: Decimal) -> Result<(), &'static str> {
    if weight <= Decimal::ZERO {
        return Err("Weight must be positive");
    }
    if weight > Decimal::from(1500) {
        return Err("Weight is out of range");
    }
    Ok(())
}
