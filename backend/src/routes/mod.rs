//! Route definitions for the Vet Clinic Management Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/session", get(handlers::session))
        .nest("/users", user_routes())
        .nest("/purchases", purchase_routes())
        .nest("/products", product_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/owners", owner_routes())
        .nest("/pets", pet_routes())
        .nest("/appointments", appointment_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Public routes
        .route("/health", get(handlers::health_check))
        .route("/config", get(handlers::clinic_config))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
        .merge(protected)
}

/// User account routes (admin)
fn user_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_users).post(handlers::create_user))
}

/// Purchase routes
fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_purchases).post(handlers::create_purchase))
        .route("/mirror/pending", get(handlers::list_pending_mirrors))
        .route("/mirror/retry", post(handlers::retry_mirrors))
        .route(
            "/:id",
            get(handlers::get_purchase).delete(handlers::delete_purchase),
        )
}

/// Product routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/:id/price-history", get(handlers::get_price_history))
}

/// Supplier routes
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_suppliers).post(handlers::create_supplier))
        .route(
            "/:id",
            put(handlers::update_supplier).delete(handlers::delete_supplier),
        )
}

/// Owner routes
fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_owners).post(handlers::create_owner))
        .route(
            "/:id",
            get(handlers::get_owner)
                .put(handlers::update_owner)
                .delete(handlers::delete_owner),
        )
        .route("/:id/pets", get(handlers::list_owner_pets))
}

/// Pet routes
fn pet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_pets).post(handlers::create_pet))
        .route(
            "/:id",
            get(handlers::get_pet)
                .put(handlers::update_pet)
                .delete(handlers::delete_pet),
        )
}

/// Appointment routes
fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_appointments).post(handlers::create_appointment),
        )
        .route(
            "/:id",
            get(handlers::get_appointment)
                .put(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
}
