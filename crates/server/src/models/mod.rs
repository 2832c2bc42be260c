//! Domain models for the Café Lagune server.

pub mod customer;
pub mod order;
pub mod product;
pub mod user;

pub use customer::Customer;
pub use order::{Order, OrderDetails, OrderIdentityKind, OrderItem, OrderMetadata};
pub use product::{NewProduct, Product};
pub use user::{CurrentUser, User, session_keys};
