//! Mushaf Marks
//!
//! Annotation range engine and local marks service for a Quran reader.
//! Selections over a reading unit (one quarter of a hizb) become ordered
//! `(row, offset)` ranges; stored notes, mistakes and mutashabih highlights
//! are projected back onto per-row styled segments.

pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod marks;
pub mod range;
pub mod routes;
pub mod session;
pub mod state;
pub mod verses;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the service router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/v1/health", routes::health::router())
        .nest(
            "/api/v1/annotations",
            routes::annotations::router(state.marks().clone()),
        )
        .nest("/api/v1/groups", routes::groups::router(state.marks().clone()))
        .nest("/api/v1", routes::units::router())
        .nest("/api/v1/navigator", routes::navigator::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
