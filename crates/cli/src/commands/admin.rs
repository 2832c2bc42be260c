//! Admin account management commands.

use cafe_lagune_core::{Email, UserRole};
use cafe_lagune_server::db::{RepositoryError, UserRepository};
use cafe_lagune_server::services::auth::{self, AuthError};
use thiserror::Error;

/// Errors that can occur during admin account operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Password too short (min 8 characters)")]
    WeakPassword,

    #[error("An account already exists with email: {0}")]
    UserExists(String),

    #[error("Auth error: {0}")]
    Auth(AuthError),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Create an account with the ADMIN role.
///
/// # Errors
///
/// Returns an error if the email is invalid, the password too short, or an
/// account with the email already exists.
pub async fn create_admin(email: &str, name: &str, password: &str) -> Result<(), AdminError> {
    let parsed = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;

    if password.len() < 8 {
        return Err(AdminError::WeakPassword);
    }

    let pool = super::connect().await?;

    let hash = auth::hash_password(password).map_err(AdminError::Auth)?;
    let user = UserRepository::new(&pool)
        .create_with_password(name, &parsed, UserRole::Admin, &hash)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(parsed.as_str().to_owned()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(id = %user.id, email = %user.email, "Admin account created");
    Ok(())
}
