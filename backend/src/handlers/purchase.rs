//! Purchase handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use shared::models::{Action, Purchase, PurchaseDraft, Resource};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::mirror_outbox::PendingMirror;
use crate::services::purchasing::{DeletionReceipt, PurchaseReceipt, RetryReport};
use crate::services::{InventoryReconciler, PurchaseService};
use crate::AppState;

#[derive(Serialize)]
pub struct PurchasesResponse {
    pub purchases: Vec<Purchase>,
}

#[derive(Serialize)]
pub struct PendingMirrorsResponse {
    pub pending: Vec<PendingMirror>,
}

pub(crate) fn purchase_service(state: &AppState) -> PurchaseService {
    PurchaseService::new(
        state.purchases.clone(),
        state.outbox.clone(),
        state.mirror.clone(),
        InventoryReconciler::new(state.stock.clone()),
    )
}

/// List recorded purchases
pub async fn list_purchases(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<PurchasesResponse>, AppError> {
    user.require(Resource::Purchase, Action::View)?;

    let purchases = purchase_service(&state).list().await;
    Ok(Json(PurchasesResponse { purchases }))
}

/// Get a single purchase
pub async fn get_purchase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(purchase_id): Path<i64>,
) -> Result<Json<Purchase>, AppError> {
    user.require(Resource::Purchase, Action::View)?;

    let purchase = purchase_service(&state).get(purchase_id).await?;
    Ok(Json(purchase))
}

/// Record a purchase. A resubmitted duplicate answers 200 with the
/// original record instead of 201.
pub async fn create_purchase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(draft): Json<PurchaseDraft>,
) -> Result<(StatusCode, Json<PurchaseReceipt>), AppError> {
    user.require(Resource::Purchase, Action::Create)?;

    let receipt = purchase_service(&state).save_purchase(draft).await?;
    let status = if receipt.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(receipt)))
}

/// Delete a purchase and reverse its stock
pub async fn delete_purchase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(purchase_id): Path<i64>,
) -> Result<Json<DeletionReceipt>, AppError> {
    user.require(Resource::Purchase, Action::Delete)?;

    let receipt = purchase_service(&state).delete_purchase(purchase_id).await?;
    Ok(Json(receipt))
}

/// Purchases whose invoice copy is waiting for a retry
pub async fn list_pending_mirrors(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<PendingMirrorsResponse>, AppError> {
    user.require(Resource::Purchase, Action::View)?;

    let pending = purchase_service(&state).pending_mirrors().await?;
    Ok(Json(PendingMirrorsResponse { pending }))
}

/// Replay the mirror outbox once
pub async fn retry_mirrors(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<RetryReport>, AppError> {
    user.require(Resource::Purchase, Action::Create)?;

    let report = purchase_service(&state).retry_mirrors().await?;
    Ok(Json(report))
}
