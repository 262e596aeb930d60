//! HTTP API server

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub mod correlator;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod rate_limit;
pub mod state;

pub use error::{ApiError, ErrorCode, ErrorInfo};
pub use state::AppState;

/// Build the API router using the provided application state
pub fn create_router(state: AppState) -> Router {
    let registrations = Router::new()
        .route(
            "/application-endpoint-lists",
            get(handlers::list_application_endpoints)
                .post(handlers::register_application_endpoints)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/application-endpoint-lists/:id",
            get(handlers::get_application_endpoints)
                .put(handlers::update_application_endpoints)
                .delete(handlers::deregister_application_endpoints)
                .fallback(handlers::method_not_allowed),
        )
        .route_layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(state.clone(), middleware::authenticate))
                .layer(from_fn_with_state(state.clone(), middleware::enforce_rate_limit)),
        );

    let base_path = state.settings.base_path.clone();
    let router = Router::new()
        .route("/", get(health::root).fallback(handlers::method_not_allowed))
        .route("/health", get(health::health).fallback(handlers::method_not_allowed))
        .route(
            "/health/detailed",
            get(health::detailed_health).fallback(handlers::method_not_allowed),
        );

    let router = if base_path == "/" {
        router.merge(registrations)
    } else {
        router.nest(&base_path, registrations)
    };

    let cors = cors_layer(&state.settings.allowed_origins);

    let router = router
        .fallback(handlers::fallback)
        .layer(from_fn(correlator::echo_correlator))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                correlator::X_CORRELATOR,
            ])
            .expose_headers([
                header::LOCATION,
                correlator::X_CORRELATOR,
                handlers::X_TOTAL_COUNT,
            ])
            .allow_credentials(true),
    )
}
