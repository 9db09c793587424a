//! Civic reference API server
//!
//! In-memory implementation of the civic REST API, used for development
//! and for end-to-end tests of the HTTP repository. State is lost on
//! restart.

pub mod routes;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use civic::storage::InMemoryBackend;

// Re-export for convenience
pub use routes::create_routes;

/// Full application: routes under `/api` with CORS and request tracing.
pub fn app(backend: InMemoryBackend) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", create_routes(backend))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
