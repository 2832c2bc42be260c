//! Business services for the Café Lagune server.
//!
//! - [`auth`] - Password hashing and sign-in/sign-up
//! - [`email`] - SMTP transport behind the [`email::Mailer`] trait
//! - [`notify`] - Fire-and-forget post-commit order notifications
//! - [`orders`] - The order-creation workflow

pub mod auth;
pub mod email;
pub mod notify;
pub mod orders;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, Mailer, SmtpMailer};
pub use notify::{NotificationChannel, NotificationDispatcher};
pub use orders::{CreateOrderInput, OrderError, OrderService, RequestedItem};
