//! Pet records

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::validation::validate_weight_kg;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult, OrNotFound};
use crate::services::owner::{paginate, OwnerScope};

/// Pet service
#[derive(Clone)]
pub struct PetService {
    db: PgPool,
}

/// Pet record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Pet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub weight_kg: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query string for listing pets
#[derive(Debug, Default, Deserialize)]
pub struct PetQuery {
    pub owner_id: Option<Uuid>,
    pub species: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePetInput {
    pub owner_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Pet name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Species is required"))]
    pub species: String,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub weight_kg: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePetInput {
    #[validate(length(min = 1, max = 100, message = "Pet name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Species cannot be empty"))]
    pub species: Option<String>,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub weight_kg: Option<Decimal>,
    pub notes: Option<String>,
}

const PET_COLUMNS: &str = "id, owner_id, name, species, breed, sex, date_of_birth, weight_kg, \
     notes, created_at, updated_at";

fn check_pet_details(weight_kg: Option<Decimal>, date_of_birth: Option<NaiveDate>) -> AppResult<()> {
    if let Some(weight) = weight_kg {
        validate_weight_kg(weight).map_err(|message| AppError::Validation {
            field: "weight_kg".to_string(),
            message: message.to_string(),
        })?;
    }
    if let Some(born) = date_of_birth {
        if born > Utc::now().date_naive() {
            return Err(AppError::Validation {
                field: "date_of_birth".to_string(),
                message: "Date of birth cannot be in the future".to_string(),
            });
        }
    }
    Ok(())
}

impl PetService {
    /// Create a new PetService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, scope: OwnerScope, query: PetQuery) -> AppResult<Vec<Pet>> {
        let Ok(scope_filter) = scope.owner_filter() else {
            return Ok(Vec::new());
        };
        if let (Some(scoped), Some(requested)) = (scope_filter, query.owner_id) {
            if scoped != requested {
                return Ok(Vec::new());
            }
        }
        let owner_filter = scope_filter.or(query.owner_id);
        let (limit, offset) = paginate(query.page, query.per_page).limit_offset();

        let pets = sqlx::query_as::<_, Pet>(&format!(
            r#"
            SELECT {}
            FROM pets
            WHERE ($1::uuid IS NULL OR owner_id = $1)
              AND ($2::text IS NULL OR LOWER(species) = LOWER($2))
            ORDER BY name ASC
            LIMIT $3 OFFSET $4
            "#,
            PET_COLUMNS
        ))
        .bind(owner_filter)
        .bind(&query.species)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;

        Ok(pets)
    }

    pub async fn get(&self, scope: OwnerScope, pet_id: Uuid) -> AppResult<Pet> {
        let pet = sqlx::query_as::<_, Pet>(&format!("SELECT {} FROM pets WHERE id = $1", PET_COLUMNS))
            .bind(pet_id)
            .fetch_optional(&self.db)
            .await?
            .filter(|pet| scope.allows(pet.owner_id))
            .ok_or_else(|| AppError::NotFound("Pet".to_string()))?;

        Ok(pet)
    }

    pub async fn create(&self, input: CreatePetInput) -> AppResult<Pet> {
        input.validate()?;
        check_pet_details(input.weight_kg, input.date_of_birth)?;

        let pet = sqlx::query_as::<_, Pet>(&format!(
            r#"
            INSERT INTO pets (owner_id, name, species, breed, sex, date_of_birth, weight_kg, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PET_COLUMNS
        ))
        .bind(input.owner_id)
        .bind(input.name.trim())
        .bind(&input.species)
        .bind(&input.breed)
        .bind(&input.sex)
        .bind(input.date_of_birth)
        .bind(input.weight_kg)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_constraint("Owner", e))?;

        tracing::info!(pet_id = %pet.id, owner_id = %pet.owner_id, "Pet registered");
        Ok(pet)
    }

    pub async fn update(&self, scope: OwnerScope, pet_id: Uuid, input: UpdatePetInput) -> AppResult<Pet> {
        input.validate()?;
        check_pet_details(input.weight_kg, input.date_of_birth)?;
        let existing = self.get(scope, pet_id).await?;

        let name = input.name.map(|n| n.trim().to_string()).unwrap_or(existing.name);
        let species = input.species.unwrap_or(existing.species);
        let breed = input.breed.or(existing.breed);
        let sex = input.sex.or(existing.sex);
        let date_of_birth = input.date_of_birth.or(existing.date_of_birth);
        let weight_kg = input.weight_kg.or(existing.weight_kg);
        let notes = input.notes.or(existing.notes);

        let pet = sqlx::query_as::<_, Pet>(&format!(
            r#"
            UPDATE pets
            SET name = $1, species = $2, breed = $3, sex = $4,
                date_of_birth = $5, weight_kg = $6, notes = $7, updated_at = NOW()
            WHERE id = $8
            RETURNING {}
            "#,
            PET_COLUMNS
        ))
        .bind(&name)
        .bind(&species)
        .bind(&breed)
        .bind(&sex)
        .bind(date_of_birth)
        .bind(weight_kg)
        .bind(&notes)
        .bind(pet_id)
        .fetch_optional(&self.db)
        .await?
        .or_not_found("Pet")?;

        Ok(pet)
    }

    /// Delete a pet and its appointments
    pub async fn delete(&self, pet_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM pets WHERE id = $1")
            .bind(pet_id)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::from_constraint("Pet", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Pet".to_string()));
        }
        Ok(())
    }
}
