//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ServerConfig;
use crate::services::email::{DisabledMailer, Mailer, SmtpMailer};
use crate::services::notify::NotificationDispatcher;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: SqlitePool,
    dispatcher: NotificationDispatcher,
}

impl AppState {
    /// Create a new application state.
    ///
    /// When SMTP is not configured, the dispatcher gets a mailer that logs
    /// and skips every send.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(
        config: ServerConfig,
        pool: SqlitePool,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let mailer: Arc<dyn Mailer> = match &config.email {
            Some(email) => Arc::new(SmtpMailer::new(email)?),
            None => Arc::new(DisabledMailer),
        };
        let dispatcher = NotificationDispatcher::new(mailer, config.admin_emails.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                dispatcher,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the notification dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.inner.dispatcher
    }
}
