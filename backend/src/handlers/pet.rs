//! Pet handlers

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
use crate::services::pet::{CreatePetInput, Pet, PetQuery, UpdatePetInput};
use crate::services::{OwnerService, PetService};
use crate::AppState;

#[derive(Serialize)]
pub struct PetsResponse {
    pub pets: Vec<Pet>,
}

pub async fn list_pets(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PetQuery>,
) -> Result<Json<PetsResponse>, AppError> {
    user.require(Resource::Pet, Action::View)?;

    let scope = OwnerService::new(state.db.clone()).scope_for(&user.session).await?;
    let pets = PetService::new(state.db.clone()).list(scope, query).await?;

    Ok(Json(PetsResponse { pets }))
}

pub async fn get_pet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(pet_id): Path<Uuid>,
) -> Result<Json<Pet>, AppError> {
    user.require(Resource::Pet, Action::View)?;

    let scope = OwnerService::new(state.db.clone()).scope_for(&user.session).await?;
    let pet = PetService::new(state.db.clone()).get(scope, pet_id).await?;

    Ok(Json(pet))
}

pub async fn create_pet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreatePetInput>,
) -> Result<(StatusCode, Json<Pet>), AppError> {
    user.require(Resource::Pet, Action::Create)?;

    let pet = PetService::new(state.db.clone()).create(input).await?;
    Ok((StatusCode::CREATED, Json(pet)))
}

pub async fn update_pet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(pet_id): Path<Uuid>,
    Json(input): Json<UpdatePetInput>,
) -> Result<Json<Pet>, AppError> {
    user.require(Resource::Pet, Action::Edit)?;

    let scope = OwnerService::new(state.db.clone()).scope_for(&user.session).await?;
    let pet = PetService::new(state.db.clone())
        .update(scope, pet_id, input)
        .await?;

    Ok(Json(pet))
}

pub async fn delete_pet(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(pet_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    user.require(Resource::Pet, Action::Delete)?;

    PetService::new(state.db.clone()).delete(pet_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
