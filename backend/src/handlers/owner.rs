//! Owner handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use shared::models::{Action, Resource};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::owner::{CreateOwnerInput, Owner, OwnerQuery, UpdateOwnerInput};
use crate::services::pet::{Pet, PetQuery};
use crate::services::{OwnerService, PetService};
use crate::AppState;

#[derive(Serialize)]
pub struct OwnersResponse {
    pub owners: Vec<Owner>,
}

#[derive(Serialize)]
pub struct OwnerPetsResponse {
    pub owner: Owner,
    pub pets: Vec<Pet>,
}

pub async fn list_owners(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<OwnersResponse>, AppError> {
    user.require(Resource::Owner, Action::View)?;

    let owner_service = OwnerService::new(state.db.clone());
    let scope = owner_service.scope_for(&user.session).await?;
    let owners = owner_service.list(scope, query).await?;

    Ok(Json(OwnersResponse { owners }))
}

pub async fn get_owner(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<Owner>, AppError> {
    user.require(Resource::Owner, Action::View)?;

    let owner_service = OwnerService::new(state.db.clone());
    let scope = owner_service.scope_for(&user.session).await?;
    let owner = owner_service.get(scope, owner_id).await?;

    Ok(Json(owner))
}

/// An owner together with their pets
pub async fn list_owner_pets(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<OwnerPetsResponse>, AppError> {
    user.require(Resource::Pet, Action::View)?;

    let owner_service = OwnerService::new(state.db.clone());
    let scope = owner_service.scope_for(&user.session).await?;
    let owner = owner_service.get(scope, owner_id).await?;

    let query = PetQuery {
        owner_id: Some(owner.id),
        per_page: Some(200),
        ..Default::default()
    };
    let pets = PetService::new(state.db.clone()).list(scope, query).await?;

    Ok(Json(OwnerPetsResponse { owner, pets }))
}

pub async fn create_owner(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateOwnerInput>,
) -> Result<(StatusCode, Json<Owner>), AppError> {
    user.require(Resource::Owner, Action::Create)?;

    let owner = OwnerService::new(state.db.clone()).create(input).await?;
    Ok((StatusCode::CREATED, Json(owner)))
}

pub async fn update_owner(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(owner_id): Path<Uuid>,
    Json(input): Json<UpdateOwnerInput>,
) -> Result<Json<Owner>, AppError> {
    user.require(Resource::Owner, Action::Edit)?;

    let owner_service = OwnerService::new(state.db.clone());
    let scope = owner_service.scope_for(&user.session).await?;
    let owner = owner_service.update(scope, owner_id, input).await?;

    Ok(Json(owner))
}

pub async fn delete_owner(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(owner_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    user.require(Resource::Owner, Action::Delete)?;

    OwnerService::new(state.db.clone()).delete(owner_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
