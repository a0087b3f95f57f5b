//! Authentication service: password login and signed session tokens

use std::sync::OnceLock;

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::models::{SessionUser, UserRole};
use shared::validation::{validate_email, validate_password};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::SessionConfig;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    session: SessionConfig,
}

/// Login form
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Input for creating a user account (admin only)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 255))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    pub role: UserRole,
}

/// Session token plus the user it was issued to
#[derive(Debug, Serialize)]
pub struct Session {
    #[serde(skip_serializing)]
    pub token: String,
    pub user: SessionUser,
    pub expires_in: i64,
}

/// Session token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub name: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub login_at: i64,
    pub exp: i64,
    pub iat: i64,
}

/// User account row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, session: &SessionConfig) -> Self {
        Self {
            db,
            session: session.clone(),
        }
    }

    /// Authenticate with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<Session> {
        input.validate()?;

        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, role, is_active
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(input.email.trim())
        .fetch_optional(&self.db)
        .await?;

        let user = check_credentials(user, &input.password)?;

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let role: UserRole = user
            .role
            .parse()
            .map_err(|e| AppError::Internal(format!("User {} has {}", user.id, e)))?;

        let session_user = SessionUser {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role,
            permissions: role.permissions(),
            login_at: Utc::now(),
        };

        let token = issue_session(&session_user, &self.session)?;
        tracing::info!(user_id = %session_user.user_id, role = %role, "User signed in");

        Ok(Session {
            token,
            user: session_user,
            expires_in: self.session.expiry_seconds,
        })
    }

    /// All user accounts, by name
    pub async fn list_users(&self) -> AppResult<Vec<UserRow>> {
        let users = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, role, is_active
            FROM users
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    /// Create a user account with a bcrypt-hashed password
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<UserRow> {
        input.validate()?;
        validate_email(&input.email).map_err(|message| AppError::Validation {
            field: "email".to_string(),
            message: message.to_string(),
        })?;
        validate_password(&input.password).map_err(|message| AppError::Validation {
            field: "password".to_string(),
            message: message.to_string(),
        })?;

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, name, role, is_active
            "#,
        )
        .bind(input.email.trim().to_lowercase())
        .bind(&password_hash)
        .bind(&input.name)
        .bind(input.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_constraint("email", e))?;

        Ok(user)
    }
}

/// Accept `user` only if it exists, is active and `password` matches.
///
/// Every rejection is the same `InvalidCredentials` so callers cannot tell
/// an unknown email from a wrong password or a disabled account.
pub fn check_credentials(user: Option<UserRow>, password: &str) -> AppResult<UserRow> {
    let Some(user) = user else {
        // Unknown emails cost one full bcrypt verify, same as known ones
        if let Some(dummy) = dummy_hash() {
            let _ = verify(password, dummy);
        }
        return Err(AppError::InvalidCredentials);
    };

    let valid = match verify(password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
            false
        }
    };

    if !valid || !user.is_active {
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

/// Hash at the cost new accounts get, computed on first use
fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| hash("no-such-account", DEFAULT_COST).ok())
        .as_deref()
}

/// Sign a session token for `user`
pub fn issue_session(user: &SessionUser, config: &SessionConfig) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.user_id.to_string(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role.as_str().to_string(),
        permissions: user.permissions.clone(),
        login_at: user.login_at.timestamp(),
        exp: (now + Duration::seconds(config.expiry_seconds)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify a session token and rebuild the user it carries
pub fn validate_session(token: &str, config: &SessionConfig) -> AppResult<SessionUser> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::SessionExpired,
        _ => AppError::InvalidSession,
    })?
    .claims;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidSession)?;
    let role: UserRole = claims.role.parse().map_err(|_| AppError::InvalidSession)?;
    let login_at = Utc
        .timestamp_opt(claims.login_at, 0)
        .single()
        .ok_or(AppError::InvalidSession)?;

    Ok(SessionUser {
        user_id,
        email: claims.email,
        name: claims.name,
        role,
        permissions: claims.permissions,
        login_at,
    })
}
