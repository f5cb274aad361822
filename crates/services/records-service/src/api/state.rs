//! Application state for dependency injection.

use std::sync::Arc;

use crate::api::middleware::TokenVerifier;
use crate::service::Records;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<Records>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(records: Arc<Records>, verifier: Arc<TokenVerifier>) -> Self {
        Self { records, verifier }
    }
}
