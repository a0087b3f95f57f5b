//! Appointment handlers

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
use crate::services::appointment::{
    Appointment, AppointmentQuery, CreateAppointmentInput, UpdateAppointmentInput,
};
use crate::services::{AppointmentService, OwnerService};
use crate::AppState;

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<Appointment>,
}

pub async fn list_appointments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<AppointmentsResponse>, AppError> {
    user.require(Resource::Appointment, Action::View)?;

    let scope = OwnerService::new(state.db.clone()).scope_for(&user.session).await?;
    let appointments = AppointmentService::new(state.db.clone())
        .list(scope, query)
        .await?;

    Ok(Json(AppointmentsResponse { appointments }))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    user.require(Resource::Appointment, Action::View)?;

    let scope = OwnerService::new(state.db.clone()).scope_for(&user.session).await?;
    let appointment = AppointmentService::new(state.db.clone())
        .get(scope, appointment_id)
        .await?;

    Ok(Json(appointment))
}

/// Book an appointment; clients can only book for their own pets
pub async fn create_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateAppointmentInput>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    user.require(Resource::Appointment, Action::Create)?;

    let scope = OwnerService::new(state.db.clone()).scope_for(&user.session).await?;
    let appointment = AppointmentService::new(state.db.clone())
        .create(scope, input)
        .await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn update_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(appointment_id): Path<Uuid>,
    Json(input): Json<UpdateAppointmentInput>,
) -> Result<Json<Appointment>, AppError> {
    user.require(Resource::Appointment, Action::Edit)?;

    let scope = OwnerService::new(state.db.clone()).scope_for(&user.session).await?;
    let appointment = AppointmentService::new(state.db.clone())
        .update(scope, appointment_id, input)
        .await?;

    Ok(Json(appointment))
}

pub async fn delete_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(appointment_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    user.require(Resource::Appointment, Action::Delete)?;

    AppointmentService::new(state.db.clone())
        .delete(appointment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
