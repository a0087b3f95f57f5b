//! Product directory
//!
//! Stock and cost are maintained by purchase reconciliation; this service
//! only edits the catalogue fields and the opening stock on create.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::validation::validate_price;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult, OrNotFound};

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Product record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub unit: String,
    pub stock_quantity: i32,
    pub reorder_level: i32,
    pub cost_price: Decimal,
    pub sale_price: Decimal,
    pub supplier_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn needs_reorder(&self) -> bool {
        self.stock_quantity <= self.reorder_level
    }
}

/// Product as returned by the API, with its reorder flag
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub needs_reorder: bool,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            needs_reorder: product.needs_reorder(),
            product,
        }
    }
}

/// Input for creating a product
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 200, message = "Product name is required"))]
    pub name: String,
    pub category: Option<String>,
    #[validate(length(min = 1, max = 32, message = "Unit is required"))]
    pub unit: String,
    #[validate(range(min = 0, message = "Opening stock cannot be negative"))]
    #[serde(default)]
    pub stock_quantity: i32,
    #[validate(range(min = 0, message = "Reorder level cannot be negative"))]
    #[serde(default)]
    pub reorder_level: i32,
    #[serde(default)]
    pub cost_price: Decimal,
    pub sale_price: Decimal,
    pub supplier_id: Option<Uuid>,
}

/// Input for updating a product's catalogue fields
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 200, message = "Product name cannot be empty"))]
    pub name: Option<String>,
    pub category: Option<String>,
    #[validate(length(min = 1, max = 32, message = "Unit cannot be empty"))]
    pub unit: Option<String>,
    #[validate(range(min = 0, message = "Reorder level cannot be negative"))]
    pub reorder_level: Option<i32>,
    pub sale_price: Option<Decimal>,
    pub supplier_id: Option<Uuid>,
}

const PRODUCT_COLUMNS: &str = "id, name, category, unit, stock_quantity, reorder_level, \
     cost_price, sale_price, supplier_id, created_at, updated_at";

fn check_price(field: &str, price: Decimal) -> AppResult<()> {
    validate_price(price).map_err(|message| AppError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    })
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All products ordered by name
    pub async fn list(&self) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY name ASC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        input.validate()?;
        check_price("cost_price", input.cost_price)?;
        check_price("sale_price", input.sale_price)?;

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (
                name, category, unit, stock_quantity, reorder_level,
                cost_price, sale_price, supplier_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.category)
        .bind(&input.unit)
        .bind(input.stock_quantity)
        .bind(input.reorder_level)
        .bind(input.cost_price)
        .bind(input.sale_price)
        .bind(input.supplier_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_constraint("product name", e))?;

        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    pub async fn update(&self, product_id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        input.validate()?;
        if let Some(price) = input.sale_price {
            check_price("sale_price", price)?;
        }
        let existing = self.get(product_id).await?;

        let name = input.name.map(|n| n.trim().to_string()).unwrap_or(existing.name);
        let category = input.category.or(existing.category);
        let unit = input.unit.unwrap_or(existing.unit);
        let reorder_level = input.reorder_level.unwrap_or(existing.reorder_level);
        let sale_price = input.sale_price.unwrap_or(existing.sale_price);
        let supplier_id = input.supplier_id.or(existing.supplier_id);

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = $1, category = $2, unit = $3, reorder_level = $4,
                sale_price = $5, supplier_id = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        ))
        .bind(&name)
        .bind(&category)
        .bind(&unit)
        .bind(reorder_level)
        .bind(sale_price)
        .bind(supplier_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::from_constraint("product name", e))?
        .or_not_found("Product")?;

        Ok(product)
    }

    pub async fn delete(&self, product_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::from_constraint("Product", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }
}
