//! Appointment scheduling

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::AppointmentStatus;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::owner::{paginate, OwnerScope};

/// Appointment service
#[derive(Clone)]
pub struct AppointmentService {
    db: PgPool,
}

/// Appointment record, with the owning pet's owner for scoping
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub pet_id: Uuid,
    pub owner_id: Uuid,
    pub veterinarian_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub reason: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query string for listing appointments
#[derive(Debug, Default, Deserialize)]
pub struct AppointmentQuery {
    pub pet_id: Option<Uuid>,
    pub veterinarian_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAppointmentInput {
    pub pet_id: Uuid,
    pub veterinarian_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 5, max = 480, message = "Duration must be between 5 and 480 minutes"))]
    #[serde(default = "default_duration")]
    pub duration_minutes: i32,
    #[validate(length(min = 1, max = 500, message = "Reason is required"))]
    pub reason: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAppointmentInput {
    pub veterinarian_id: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[validate(range(min = 5, max = 480, message = "Duration must be between 5 and 480 minutes"))]
    pub duration_minutes: Option<i32>,
    #[validate(length(min = 1, max = 500, message = "Reason cannot be empty"))]
    pub reason: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

fn default_duration() -> i32 {
    30
}

const APPOINTMENT_SELECT: &str = r#"
    SELECT a.id, a.pet_id, p.owner_id, a.veterinarian_id, a.scheduled_at,
           a.duration_minutes, a.reason, a.status, a.notes, a.created_at, a.updated_at
    FROM appointments a
    JOIN pets p ON p.id = a.pet_id
"#;

impl AppointmentService {
    /// Create a new AppointmentService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, scope: OwnerScope, query: AppointmentQuery) -> AppResult<Vec<Appointment>> {
        let Ok(owner_filter) = scope.owner_filter() else {
            return Ok(Vec::new());
        };
        let (limit, offset) = paginate(query.page, query.per_page).limit_offset();

        let appointments = sqlx::query_as::<_, Appointment>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR p.owner_id = $1)
              AND ($2::uuid IS NULL OR a.pet_id = $2)
              AND ($3::uuid IS NULL OR a.veterinarian_id = $3)
              AND ($4::text IS NULL OR a.status = $4)
              AND ($5::timestamptz IS NULL OR a.scheduled_at >= $5)
              AND ($6::timestamptz IS NULL OR a.scheduled_at < $6)
            ORDER BY a.scheduled_at ASC
            LIMIT $7 OFFSET $8
            "#,
            APPOINTMENT_SELECT
        ))
        .bind(owner_filter)
        .bind(query.pet_id)
        .bind(query.veterinarian_id)
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.from)
        .bind(query.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(appointments)
    }

    pub async fn get(&self, scope: OwnerScope, appointment_id: Uuid) -> AppResult<Appointment> {
        sqlx::query_as::<_, Appointment>(&format!("{} WHERE a.id = $1", APPOINTMENT_SELECT))
            .bind(appointment_id)
            .fetch_optional(&self.db)
            .await?
            .filter(|a| scope.allows(a.owner_id))
            .ok_or_else(|| AppError::NotFound("Appointment".to_string()))
    }

    /// Book an appointment. Clients may only book for their own pets.
    pub async fn create(&self, scope: OwnerScope, input: CreateAppointmentInput) -> AppResult<Appointment> {
        input.validate()?;

        let owner_id = sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM pets WHERE id = $1")
            .bind(input.pet_id)
            .fetch_optional(&self.db)
            .await?
            .filter(|owner_id| scope.allows(*owner_id))
            .ok_or_else(|| AppError::NotFound("Pet".to_string()))?;

        let appointment_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO appointments (pet_id, veterinarian_id, scheduled_at, duration_minutes, reason, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(input.pet_id)
        .bind(input.veterinarian_id)
        .bind(input.scheduled_at)
        .bind(input.duration_minutes)
        .bind(&input.reason)
        .bind(AppointmentStatus::Scheduled.as_str())
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_constraint("Veterinarian", e))?;

        tracing::info!(
            appointment_id = %appointment_id,
            pet_id = %input.pet_id,
            owner_id = %owner_id,
            scheduled_at = %input.scheduled_at,
            "Appointment booked"
        );
        self.get(scope, appointment_id).await
    }

    pub async fn update(
        &self,
        scope: OwnerScope,
        appointment_id: Uuid,
        input: UpdateAppointmentInput,
    ) -> AppResult<Appointment> {
        input.validate()?;
        let existing = self.get(scope, appointment_id).await?;

        let current: AppointmentStatus = existing
            .status
            .parse()
            .map_err(|e| AppError::Internal(format!("Appointment {}: {}", existing.id, e)))?;
        let status = input.status.unwrap_or(current);
        if !current.can_transition_to(status) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot change a {} appointment to {}",
                current, status
            )));
        }

        let veterinarian_id = input.veterinarian_id.or(existing.veterinarian_id);
        let scheduled_at = input.scheduled_at.unwrap_or(existing.scheduled_at);
        let duration_minutes = input.duration_minutes.unwrap_or(existing.duration_minutes);
        let reason = input.reason.unwrap_or(existing.reason);
        let notes = input.notes.or(existing.notes);

        sqlx::query(
            r#"
            UPDATE appointments
            SET veterinarian_id = $1, scheduled_at = $2, duration_minutes = $3,
                reason = $4, status = $5, notes = $6, updated_at = NOW()
            WHERE id = $7
            "#,
        )
        .bind(veterinarian_id)
        .bind(scheduled_at)
        .bind(duration_minutes)
        .bind(&reason)
        .bind(status.as_str())
        .bind(&notes)
        .bind(appointment_id)
        .execute(&self.db)
        .await
        .map_err(|e| AppError::from_constraint("Veterinarian", e))?;

        self.get(scope, appointment_id).await
    }

    pub async fn delete(&self, appointment_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(appointment_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Appointment".to_string()));
        }
        Ok(())
    }
}
