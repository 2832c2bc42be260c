//! Café Lagune server library.
//!
//! This crate provides the server functionality as a library, allowing it
//! to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Assemble the application: routes, route guard, sessions, tracing.
///
/// Without a session secret the session layer is skipped entirely, so every
/// request reaches the guard anonymous.
///
/// # Errors
///
/// Returns an error if the session store cannot set up its table.
pub async fn build_app(state: AppState) -> Result<Router, sqlx::Error> {
    let mut app = routes::router(state.clone());

    if let Some(secret) = state.config().session_secret.clone() {
        let session_layer = middleware::session::create_session_layer(
            state.pool(),
            state.config().secure_cookies(),
            &secret,
        )
        .await?;
        app = app.layer(session_layer);
    } else {
        tracing::warn!(
            "LAGUNE_SESSION_SECRET not set; sessions disabled, every request is anonymous"
        );
    }

    Ok(app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http()))
}
