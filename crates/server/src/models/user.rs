//! Registered account models and session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cafe_lagune_core::{UserId, UserRole};

/// A registered account.
///
/// The password hash lives only in the repository layer and is never
/// attached to this model, so it cannot leak through a response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// The authenticated user stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Session storage keys.
pub mod session_keys {
    /// Key under which the [`CurrentUser`](super::CurrentUser) is stored.
    pub const CURRENT_USER: &str = "current_user";
}
