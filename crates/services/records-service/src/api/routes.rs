//! Route configuration.

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers::{
    archive_routes, grade_routes, health_routes, login_record_routes, me_routes, student_routes,
};
use crate::api::middleware::auth_middleware;
use crate::api::openapi::ApiDoc;
use crate::api::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/me", me_routes())
        .nest("/students", student_routes())
        .nest("/grades", grade_routes())
        .nest("/archives", archive_routes())
        .nest("/login-records", login_record_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        // Health check (no auth)
        .nest("/health", health_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
