//! Request middleware.

mod auth;

pub use auth::{auth_middleware, require_admin, Claims, CurrentUser, TokenVerifier};
