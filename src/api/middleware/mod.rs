//! API middleware.

mod session;

pub use session::{session_middleware, AuthUser, LoginRequired, MaybeUser, SessionContext};
