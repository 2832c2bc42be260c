//! The route guard.
//!
//! A single middleware that decides, per request, whether the caller may
//! reach the path at all. The decision itself is a pure function over the
//! method, the path, and the caller's authentication state, so the whole
//! table is unit-testable without a server.
//!
//! Page routes redirect (to sign-in with a `callbackUrl`, or to the
//! caller's home page); API routes answer with JSON 401/403.

use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

use super::auth::AuthRejection;

/// The caller's authentication state, as far as routing is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Customer,
    Admin,
}

impl AuthState {
    fn from_user(user: Option<&CurrentUser>) -> Self {
        match user {
            None => Self::Anonymous,
            Some(u) if u.role.is_admin() => Self::Admin,
            Some(_) => Self::Customer,
        }
    }

    /// Where a signed-in caller lands when a page is not for them.
    const fn home(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            _ => "/dashboard",
        }
    }
}

/// What the guard decided for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Let the request through to its handler.
    Allow,
    /// API request without a session: 401.
    ApiUnauthorized,
    /// API request with a session that lacks the required role: 403.
    ApiForbidden,
    /// Page request without a session: redirect to sign-in, remembering
    /// where the caller wanted to go.
    RedirectToSignIn { callback: String },
    /// Page request that is not for this caller: send them home.
    Redirect { to: &'static str },
}

/// Decide whether a request may proceed.
///
/// Everything not explicitly restricted here is public, including order
/// creation and tracking.
#[must_use]
pub fn classify(method: &Method, path: &str, auth: AuthState) -> RouteDecision {
    // Admin API surface.
    if path.starts_with("/api/admin") {
        return match auth {
            AuthState::Anonymous => RouteDecision::ApiUnauthorized,
            AuthState::Customer => RouteDecision::ApiForbidden,
            AuthState::Admin => RouteDecision::Allow,
        };
    }

    // Order detail and status updates. Creation (POST /api/orders) and
    // tracking (/api/orders/track) stay public.
    if let Some(rest) = path.strip_prefix("/api/orders/") {
        let rest = rest.trim_end_matches('/');
        if rest != "track" && !rest.is_empty() {
            return match auth {
                AuthState::Anonymous => RouteDecision::ApiUnauthorized,
                AuthState::Customer if *method == Method::PATCH => RouteDecision::ApiForbidden,
                _ => RouteDecision::Allow,
            };
        }
    }

    // Admin pages.
    if path == "/admin" || path.starts_with("/admin/") {
        return match auth {
            AuthState::Anonymous => RouteDecision::RedirectToSignIn {
                callback: path.to_owned(),
            },
            AuthState::Customer => RouteDecision::Redirect { to: "/dashboard" },
            AuthState::Admin => RouteDecision::Allow,
        };
    }

    // Customer pages.
    if path == "/dashboard" || path.starts_with("/dashboard/") {
        return match auth {
            AuthState::Anonymous => RouteDecision::RedirectToSignIn {
                callback: path.to_owned(),
            },
            _ => RouteDecision::Allow,
        };
    }

    // Signed-in callers have no business on the auth pages.
    if path == "/sign-in" || path == "/sign-up" {
        return match auth {
            AuthState::Anonymous => RouteDecision::Allow,
            signed_in => RouteDecision::Redirect {
                to: signed_in.home(),
            },
        };
    }

    RouteDecision::Allow
}

/// The guard as axum middleware.
pub async fn route_guard(req: Request, next: Next) -> Response {
    let user = match req.extensions().get::<Session>() {
        Some(session) => session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten(),
        None => None,
    };

    let decision = classify(req.method(), req.uri().path(), AuthState::from_user(user.as_ref()));
    match decision {
        RouteDecision::Allow => next.run(req).await,
        RouteDecision::ApiUnauthorized => AuthRejection::Unauthorized.into_response(),
        RouteDecision::ApiForbidden => AuthRejection::Forbidden.into_response(),
        RouteDecision::RedirectToSignIn { callback } => {
            Redirect::to(&format!("/sign-in?callbackUrl={callback}")).into_response()
        }
        RouteDecision::Redirect { to } => Redirect::to(to).into_response(),
    }
}
