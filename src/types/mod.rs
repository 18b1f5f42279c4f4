//! Shared types used across services and handlers.

mod pagination;

pub use pagination::{Paginated, PaginationParams};
