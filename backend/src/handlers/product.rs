//! Product handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use shared::models::{Action, PriceHistoryEntry, Resource};
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::purchase::purchase_service;
use crate::middleware::CurrentUser;
use crate::services::product::{CreateProductInput, ProductView, UpdateProductInput};
use crate::services::ProductService;
use crate::AppState;

#[derive(Serialize)]
pub struct ProductsResponse {
    pub products: Vec<ProductView>,
}

#[derive(Serialize)]
pub struct PriceHistoryResponse {
    pub product_id: Uuid,
    pub history: Vec<PriceHistoryEntry>,
}

pub async fn list_products(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProductsResponse>, AppError> {
    user.require(Resource::Product, Action::View)?;

    let products = ProductService::new(state.db.clone()).list().await?;
    Ok(Json(ProductsResponse {
        products: products.into_iter().map(ProductView::from).collect(),
    }))
}

pub async fn get_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ProductView>, AppError> {
    user.require(Resource::Product, Action::View)?;

    let product = ProductService::new(state.db.clone()).get(product_id).await?;
    Ok(Json(product.into()))
}

pub async fn create_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<ProductView>), AppError> {
    user.require(Resource::Product, Action::Create)?;

    let product = ProductService::new(state.db.clone()).create(input).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

pub async fn update_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<ProductView>, AppError> {
    user.require(Resource::Product, Action::Edit)?;

    let product = ProductService::new(state.db.clone())
        .update(product_id, input)
        .await?;
    Ok(Json(product.into()))
}

pub async fn delete_product(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    user.require(Resource::Product, Action::Delete)?;

    ProductService::new(state.db.clone()).delete(product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Purchase prices paid for a product, newest first
pub async fn get_price_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<PriceHistoryResponse>, AppError> {
    user.require(Resource::Product, Action::View)?;

    let history = purchase_service(&state).price_history(product_id).await;
    Ok(Json(PriceHistoryResponse {
        product_id,
        history,
    }))
}
