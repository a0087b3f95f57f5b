//! Authentication middleware
//!
//! Resolves the session token from the session cookie, the legacy `session`
//! cookie, or a `Bearer` header, and attaches the session user to the request.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use shared::models::{permission_key, Action, Resource, SessionUser, UserRole};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::auth::validate_session;
use crate::AppState;

/// Cookie name used by older portal builds; still accepted, cleared on logout
pub const LEGACY_SESSION_COOKIE: &str = "session";

/// Authenticated user information extracted from the session token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub session: SessionUser,
}

impl AuthUser {
    pub fn user_id(&self) -> Uuid {
        self.session.user_id
    }

    pub fn role(&self) -> UserRole {
        self.session.role
    }

    /// Check if user has a specific permission
    pub fn has_permission(&self, resource: Resource, action: Action) -> bool {
        let permission = permission_key(resource, action);
        self.session.permissions.contains(&permission)
    }

    /// Permission guard for use in handlers
    pub fn require(&self, resource: Resource, action: Action) -> AppResult<()> {
        if self.has_permission(resource, action) {
            Ok(())
        } else {
            tracing::debug!(
                user_id = %self.session.user_id,
                permission = %permission_key(resource, action),
                "Permission denied"
            );
            Err(AppError::InsufficientPermissions)
        }
    }
}

/// Pull the raw session token out of the request, if any
pub fn session_token(jar: &CookieJar, request: &Request, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = jar.get(cookie_name).or_else(|| jar.get(LEGACY_SESSION_COOKIE)) {
        return Some(cookie.value().to_string());
    }

    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Authentication middleware that validates session tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar, &request, &state.config.session.cookie_name)
        .ok_or(AppError::AuthenticationRequired)?;

    let session = validate_session(&token, &state.config.session)?;
    request.extensions_mut().insert(AuthUser { session });

    Ok(next.run(request).await)
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::AuthenticationRequired)
    }
}
