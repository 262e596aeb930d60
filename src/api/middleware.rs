//! Bearer authentication and rate limiting for the registration routes

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use super::correlator::Correlator;
use super::error::ApiError;
use super::state::AppState;
use crate::auth::AuthContext;

/// Extracts the token from `Authorization: Bearer <token>`
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Resolve the caller and insert its [`AuthContext`] into the request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = match &state.resolver {
        None => AuthContext::anonymous(),
        Some(resolver) => {
            let correlator = Correlator::from_headers(req.headers());
            let token = extract_bearer_token(req.headers()).ok_or_else(|| {
                ApiError::unauthenticated("Request not authenticated due to missing credentials")
                    .with_correlator(&correlator)
            })?;

            match resolver.resolve(token).await {
                Some(context) => context,
                None => {
                    tracing::warn!("Rejected request with unknown bearer token");
                    return Err(ApiError::unauthenticated(
                        "Request not authenticated due to invalid or expired credentials",
                    )
                    .with_correlator(&correlator));
                }
            }
        }
    };

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// Enforce the per-caller quota. Runs after [`authenticate`].
pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(limiter) = &state.rate_limiter {
        let subject = req
            .extensions()
            .get::<AuthContext>()
            .map(|ctx| ctx.subject.as_str())
            .unwrap_or("anonymous");

        if let Err(retry_after) = limiter.check(subject) {
            tracing::warn!(%subject, retry_after_ms = retry_after.as_millis() as u64, "Rate limit exceeded");
            return Err(ApiError::too_many_requests(retry_after)
                .with_correlator(&Correlator::from_headers(req.headers())));
        }
    }

    Ok(next.run(req).await)
}
