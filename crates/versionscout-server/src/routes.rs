// Axum router configuration for the stats API
use crate::{
    handlers,
    security::{is_local_origin, security_headers},
    AppState,
};
use axum::{
    http::{request::Parts, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    // Browsers may only call the API from a page served on this machine
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _: &Parts| {
            is_local_origin(origin.as_bytes())
        }))
        .allow_methods([Method::GET]);

    let api = Router::new()
        .route("/api/stats/:username", get(handlers::get_stats))
        .route("/api/refresh/:username", get(handlers::refresh_stats))
        .layer(cors);

    Router::new()
        .merge(api)
        .route("/health", get(handlers::health_check))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}
