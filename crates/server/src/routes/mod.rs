//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (database)
//!
//! # Catalog (public)
//! GET  /api/products               - Available products
//! GET  /api/products/{id}          - Product detail
//!
//! # Orders
//! POST  /api/orders                - Create an order (guest or signed-in)
//! POST  /api/orders/track          - Track orders by phone number
//! GET   /api/orders/{id}           - Order detail (owner or admin)
//! PATCH /api/orders/{id}           - Update status/notes (admin)
//!
//! # Auth
//! POST /api/auth/sign-up           - Register an account
//! POST /api/auth/sign-in           - Sign in
//! POST /api/auth/sign-out          - Sign out
//!
//! # Admin
//! GET    /api/admin/orders         - All orders, optionally by status
//! GET    /api/admin/products       - All products, including hidden ones
//! POST   /api/admin/products       - Create a product
//! PATCH  /api/admin/products/{id}  - Update a product
//! DELETE /api/admin/products/{id}  - Retire a product (soft delete)
//! ```

pub mod auth;
pub mod orders;
pub mod products;
pub mod tracking;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, patch, post},
};

use crate::middleware::guard::route_guard;
use crate::state::AppState;

/// Liveness check. Does not touch dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness check: verifies database connectivity.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Build the application router. The route guard wraps every route; the
/// session layer (when configured) is added outside this router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/api/products", get(products::list))
        .route("/api/products/{id}", get(products::detail))
        .route("/api/orders", post(orders::create))
        .route("/api/orders/track", post(tracking::track))
        .route("/api/orders/{id}", get(orders::detail).patch(orders::update))
        .route("/api/auth/sign-up", post(auth::sign_up))
        .route("/api/auth/sign-in", post(auth::sign_in))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/admin/orders", get(orders::admin_list))
        .route(
            "/api/admin/products",
            get(products::admin_list).post(products::create),
        )
        .route(
            "/api/admin/products/{id}",
            patch(products::update).delete(products::remove),
        )
        .layer(from_fn(route_guard))
        .with_state(state)
}
