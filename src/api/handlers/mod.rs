//! HTTP request handlers.

pub mod account_handler;
pub mod auth_handler;

pub use account_handler::account_routes;
pub use auth_handler::{auth_routes, is_safe_next};
