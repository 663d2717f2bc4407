//! HTTP surface of the render service.

mod error;
mod handlers;
mod middleware;
mod state;

pub use state::HttpState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use middleware::{log_responses, set_request_context};

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/get", get(handlers::lookup_root))
        .route("/get/{outformat}", get(handlers::lookup))
        .route("/get/{outformat}/{type}", get(handlers::lookup))
        .route("/get/{outformat}/{type}/{*q}", get(handlers::lookup))
        .route("/", post(handlers::submit_default))
        .route("/{outformat}", post(handlers::submit_format))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
