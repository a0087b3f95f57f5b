//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use shared::models::{Action, Resource, SessionUser};

use crate::error::AppError;
use crate::middleware::auth::LEGACY_SESSION_COOKIE;
use crate::middleware::CurrentUser;
use crate::services::auth::{CreateUserInput, LoginInput, Session, UserRow};
use crate::services::AuthService;
use crate::AppState;

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserRow>,
}

fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), "")).path("/").build()
}

/// Login endpoint handler; sets the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginInput>,
) -> Result<(CookieJar, Json<Session>), AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config.session);
    let session = auth_service.login(body).await?;

    let cookie = Cookie::build((state.config.session.cookie_name.clone(), session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.session.secure_cookie)
        .build();

    // Drop any legacy cookie so it cannot shadow the new session
    let jar = jar.remove(removal_cookie(LEGACY_SESSION_COOKIE)).add(cookie);
    Ok((jar, Json(session)))
}

/// Logout endpoint handler; clears both session cookies
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar
        .remove(removal_cookie(&state.config.session.cookie_name))
        .remove(removal_cookie(LEGACY_SESSION_COOKIE));
    (jar, StatusCode::NO_CONTENT)
}

/// Current session user
pub async fn session(CurrentUser(user): CurrentUser) -> Json<SessionUser> {
    Json(user.session)
}

/// List user accounts (admin)
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UsersResponse>, AppError> {
    user.require(Resource::User, Action::View)?;

    let auth_service = AuthService::new(state.db.clone(), &state.config.session);
    let users = auth_service.list_users().await?;

    Ok(Json(UsersResponse { users }))
}

/// Create a user account (admin)
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<UserRow>), AppError> {
    user.require(Resource::User, Action::Create)?;

    let auth_service = AuthService::new(state.db.clone(), &state.config.session);
    let created = auth_service.create_user(input).await?;

    Ok((StatusCode::CREATED, Json(created)))
}
