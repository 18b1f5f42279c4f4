//! API layer - HTTP handlers and middleware
//!
//! This module contains all HTTP-related concerns:
//! - Request handlers and route definitions
//! - Session middleware and current-user extractors
//! - Form parsing, flash messages and HTML views

pub mod flash;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;

pub use routes::create_router;
pub use state::AppState;
