//! Pet owner directory and the record scoping shared by the clinic services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::SessionUser;
use shared::types::Pagination;
use shared::validation::{validate_email, validate_phone};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult, OrNotFound};

/// Which owners' records a caller may touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    /// Clinic staff
    All,
    /// A client linked to this owner record
    Only(Uuid),
    /// A client with no owner record yet
    Nothing,
}

impl OwnerScope {
    pub fn allows(&self, owner_id: Uuid) -> bool {
        match self {
            OwnerScope::All => true,
            OwnerScope::Only(id) => *id == owner_id,
            OwnerScope::Nothing => false,
        }
    }

    /// SQL filter value: `Ok(None)` for no filter, `Err(())` when nothing is visible
    pub(crate) fn owner_filter(&self) -> Result<Option<Uuid>, ()> {
        match self {
            OwnerScope::All => Ok(None),
            OwnerScope::Only(id) => Ok(Some(*id)),
            OwnerScope::Nothing => Err(()),
        }
    }
}

/// Owner service
#[derive(Clone)]
pub struct OwnerService {
    db: PgPool,
}

/// Pet owner record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Owner {
    pub id: Uuid,
    /// Client portal account, when the owner has one
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query string for listing owners
#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    /// Case-insensitive match on name, email or phone
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Build [`Pagination`] from optional query parameters
pub(crate) fn paginate(page: Option<u32>, per_page: Option<u32>) -> Pagination {
    let defaults = Pagination::default();
    Pagination {
        page: page.unwrap_or(defaults.page),
        per_page: per_page.unwrap_or(defaults.per_page),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOwnerInput {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Owner name is required"))]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOwnerInput {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200, message = "Owner name cannot be empty"))]
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

const OWNER_COLUMNS: &str =
    "id, user_id, name, email, phone, address, notes, created_at, updated_at";

fn check_contact(email: Option<&str>, phone: Option<&str>) -> AppResult<()> {
    if let Some(email) = email {
        validate_email(email).map_err(|message| AppError::Validation {
            field: "email".to_string(),
            message: message.to_string(),
        })?;
    }
    if let Some(phone) = phone {
        validate_phone(phone).map_err(|message| AppError::Validation {
            field: "phone".to_string(),
            message: message.to_string(),
        })?;
    }
    Ok(())
}

impl OwnerService {
    /// Create a new OwnerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Work out what `user` is allowed to see
    pub async fn scope_for(&self, user: &SessionUser) -> AppResult<OwnerScope> {
        if user.role.is_staff() {
            return Ok(OwnerScope::All);
        }

        let owner_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM owners WHERE user_id = $1")
            .bind(user.user_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(owner_id.map(OwnerScope::Only).unwrap_or(OwnerScope::Nothing))
    }

    pub async fn list(&self, scope: OwnerScope, query: OwnerQuery) -> AppResult<Vec<Owner>> {
        let Ok(owner_filter) = scope.owner_filter() else {
            return Ok(Vec::new());
        };
        let (limit, offset) = paginate(query.page, query.per_page).limit_offset();
        let search = query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let owners = sqlx::query_as::<_, Owner>(&format!(
            r#"
            SELECT {}
            FROM owners
            WHERE ($1::uuid IS NULL OR id = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR email ILIKE $2 OR phone ILIKE $2)
            ORDER BY name ASC
            LIMIT $3 OFFSET $4
            "#,
            OWNER_COLUMNS
        ))
        .bind(owner_filter)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(owners)
    }

    pub async fn get(&self, scope: OwnerScope, owner_id: Uuid) -> AppResult<Owner> {
        // Out-of-scope records look exactly like missing ones
        if !scope.allows(owner_id) {
            return Err(AppError::NotFound("Owner".to_string()));
        }

        sqlx::query_as::<_, Owner>(&format!("SELECT {} FROM owners WHERE id = $1", OWNER_COLUMNS))
            .bind(owner_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Owner".to_string()))
    }

    pub async fn create(&self, input: CreateOwnerInput) -> AppResult<Owner> {
        input.validate()?;
        check_contact(input.email.as_deref(), input.phone.as_deref())?;

        let owner = sqlx::query_as::<_, Owner>(&format!(
            r#"
            INSERT INTO owners (user_id, name, email, phone, address, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            OWNER_COLUMNS
        ))
        .bind(input.user_id)
        .bind(input.name.trim())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_constraint("owner account", e))?;

        tracing::info!(owner_id = %owner.id, "Owner created");
        Ok(owner)
    }

    pub async fn update(
        &self,
        scope: OwnerScope,
        owner_id: Uuid,
        input: UpdateOwnerInput,
    ) -> AppResult<Owner> {
        input.validate()?;
        check_contact(input.email.as_deref(), input.phone.as_deref())?;
        let existing = self.get(scope, owner_id).await?;

        let user_id = input.user_id.or(existing.user_id);
        let name = input.name.map(|n| n.trim().to_string()).unwrap_or(existing.name);
        let email = input.email.or(existing.email);
        let phone = input.phone.or(existing.phone);
        let address = input.address.or(existing.address);
        let notes = input.notes.or(existing.notes);

        let owner = sqlx::query_as::<_, Owner>(&format!(
            r#"
            UPDATE owners
            SET user_id = $1, name = $2, email = $3, phone = $4,
                address = $5, notes = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING {}
            "#,
            OWNER_COLUMNS
        ))
        .bind(user_id)
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(&address)
        .bind(&notes)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::from_constraint("owner account", e))?
        .or_not_found("Owner")?;

        Ok(owner)
    }

    /// Delete an owner together with their pets and appointments
    pub async fn delete(&self, owner_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM owners WHERE id = $1")
            .bind(owner_id)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::from_constraint("Owner", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Owner".to_string()));
        }
        Ok(())
    }
}
