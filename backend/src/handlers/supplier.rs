//! Supplier handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use shared::models::{Action, Resource};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::supplier::{CreateSupplierInput, Supplier, UpdateSupplierInput};
use crate::services::SupplierService;
use crate::AppState;

#[derive(Serialize)]
pub struct SuppliersResponse {
    pub suppliers: Vec<Supplier>,
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<SuppliersResponse>, AppError> {
    user.require(Resource::Supplier, Action::View)?;

    let suppliers = SupplierService::new(state.db.clone()).list().await?;
    Ok(Json(SuppliersResponse { suppliers }))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateSupplierInput>,
) -> Result<(StatusCode, Json<Supplier>), AppError> {
    user.require(Resource::Supplier, Action::Create)?;

    let supplier = SupplierService::new(state.db.clone()).create(input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<Uuid>,
    Json(input): Json<UpdateSupplierInput>,
) -> Result<Json<Supplier>, AppError> {
    user.require(Resource::Supplier, Action::Edit)?;

    let supplier = SupplierService::new(state.db.clone())
        .update(supplier_id, input)
        .await?;
    Ok(Json(supplier))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    user.require(Resource::Supplier, Action::Delete)?;

    SupplierService::new(state.db.clone()).delete(supplier_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
