//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Errors render as JSON
//! with a French, client-safe `error` message; server errors are captured
//! to Sentry before responding.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::orders::OrderError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Client-caused validation failure. The message is shown verbatim.
    #[error("Validation: {0}")]
    Validation(String),

    /// Every product in an order request was unavailable.
    #[error("No available products")]
    NoAvailableProducts { unavailable: Vec<String> },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique-constraint violation. The detail stays in the logs.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("ressource".to_owned()),
            RepositoryError::Conflict(detail) => Self::Conflict(detail),
            other => Self::Database(other),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(message) => Self::Validation(message),
            OrderError::NoAvailableProducts { unavailable } => {
                Self::NoAvailableProducts { unavailable }
            }
            OrderError::Repository(repo) => repo.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Validation(_) | Self::NoAvailableProducts { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        };

        // Client-safe French messages; internals stay in the logs.
        let body = match &self {
            Self::Database(_) | Self::Internal(_) => json!({ "error": "Erreur interne du serveur" }),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => json!({ "error": "Identifiants invalides" }),
                AuthError::UserAlreadyExists => {
                    json!({ "error": "Un compte existe déjà avec cet email" })
                }
                AuthError::WeakPassword(message) => json!({ "error": message }),
                AuthError::InvalidEmail(_) => json!({ "error": "Adresse email invalide" }),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    json!({ "error": "Erreur interne du serveur" })
                }
            },
            Self::Validation(message) => json!({ "error": message }),
            Self::NoAvailableProducts { unavailable } => json!({
                "error": "Aucun produit disponible dans la commande",
                "unavailableProducts": unavailable,
            }),
            Self::NotFound(what) => json!({ "error": format!("Introuvable : {what}") }),
            Self::Conflict(_) => json!({ "error": "Conflit avec une ressource existante" }),
            Self::Unauthorized => json!({ "error": "Authentification requise" }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
