//! Application endpoint list handlers
//!
//! Each handler checks the caller's scope, validates the payload where there
//! is one, and performs exactly one store operation.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::correlator::Correlator;
use crate::api::error::{ApiError, ErrorCode};
use crate::api::extract::{ApiJson, Caller, PageParams};
use crate::api::AppState;
use crate::auth::Scope;
use crate::types::{ApplicationEndpointListId, ApplicationEndpointsInfo};
use crate::validation;

pub const X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: ApplicationEndpointListId,
}

/// Unknown, malformed or undecodable ids cannot name a stored record, so all are 404
fn parse_id(
    path: Result<Path<String>, PathRejection>,
    correlator: &Correlator,
) -> Result<ApplicationEndpointListId, ApiError> {
    let not_found = |raw: &str| {
        ApiError::not_found(format!("Application endpoint list {} not found", raw))
            .with_correlator(correlator)
    };

    match path {
        Ok(Path(raw)) => raw.parse().map_err(|_| not_found(&raw)),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected undecodable id");
            Err(ApiError::not_found("The specified resource is not found").with_correlator(correlator))
        }
    }
}

/// Register application endpoints
pub async fn register_application_endpoints(
    State(state): State<AppState>,
    caller: Caller,
    correlator: Correlator,
    payload: Result<ApiJson<ApplicationEndpointsInfo>, ApiError>,
) -> Result<Response, ApiError> {
    caller.require(Scope::Write, &correlator)?;
    let ApiJson(info) = payload?;

    validation::validate(&info)
        .map_err(|e| ApiError::from(crate::Error::from(e)).with_correlator(&correlator))?;

    let record = state
        .store
        .create(info)
        .await
        .map_err(|e| ApiError::from(e).with_correlator(&correlator))?;

    tracing::info!(
        id = %record.id,
        subject = caller.subject(),
        zone = %record.info.edge_cloud_zone,
        endpoints = record.info.endpoints.len(),
        "Registered application endpoints"
    );

    let location = format!(
        "{}/application-endpoint-lists/{}",
        state.settings.base_path.trim_end_matches('/'),
        record.id
    );

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(RegisterResponse { id: record.id }),
    )
        .into_response())
}

/// Get all registered application endpoints, one page at a time
pub async fn list_application_endpoints(
    State(state): State<AppState>,
    caller: Caller,
    correlator: Correlator,
    params: PageParams,
) -> Result<Response, ApiError> {
    caller.require(Scope::Read, &correlator)?;
    let page = params
        .resolve(&state.settings)
        .map_err(|e| e.with_correlator(&correlator))?;

    let fail = |e: crate::Error| ApiError::from(e).with_correlator(&correlator);
    let records = state.store.list(page).await.map_err(fail)?;
    let total = state.store.count().await.map_err(fail)?;

    tracing::debug!(
        offset = page.offset,
        limit = page.limit,
        returned = records.len(),
        total,
        "Listed application endpoints"
    );

    Ok(([(X_TOTAL_COUNT, total.to_string())], Json(records)).into_response())
}

/// Get application endpoints by id
pub async fn get_application_endpoints(
    State(state): State<AppState>,
    caller: Caller,
    correlator: Correlator,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    caller.require(Scope::Read, &correlator)?;
    let id = parse_id(raw_id, &correlator)?;

    let record = state
        .store
        .get(&id)
        .await
        .map_err(|e| ApiError::from(e).with_correlator(&correlator))?;

    tracing::debug!(%id, "Fetched application endpoints");
    Ok(Json(record).into_response())
}

/// Replace the endpoints of an existing registration
pub async fn update_application_endpoints(
    State(state): State<AppState>,
    caller: Caller,
    correlator: Correlator,
    raw_id: Result<Path<String>, PathRejection>,
    payload: Result<ApiJson<ApplicationEndpointsInfo>, ApiError>,
) -> Result<StatusCode, ApiError> {
    caller.require(Scope::Update, &correlator)?;
    let id = parse_id(raw_id, &correlator)?;
    let ApiJson(info) = payload?;

    validation::validate(&info)
        .map_err(|e| ApiError::from(crate::Error::from(e)).with_correlator(&correlator))?;

    let record = state
        .store
        .replace(&id, info)
        .await
        .map_err(|e| ApiError::from(e).with_correlator(&correlator))?;

    tracing::info!(
        %id,
        subject = caller.subject(),
        zone = %record.info.edge_cloud_zone,
        endpoints = record.info.endpoints.len(),
        "Updated application endpoints"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Deregister application endpoints
pub async fn deregister_application_endpoints(
    State(state): State<AppState>,
    caller: Caller,
    correlator: Correlator,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    caller.require(Scope::Delete, &correlator)?;
    let id = parse_id(raw_id, &correlator)?;

    state
        .store
        .delete(&id)
        .await
        .map_err(|e| ApiError::from(e).with_correlator(&correlator))?;

    tracing::info!(%id, subject = caller.subject(), "Deregistered application endpoints");
    Ok(StatusCode::NO_CONTENT)
}

/// Known paths hit with an unsupported method
pub async fn method_not_allowed(correlator: Correlator) -> ApiError {
    ApiError::new(
        ErrorCode::MethodNotAllowed,
        "The requested method is not allowed for this resource",
    )
    .with_correlator(&correlator)
}

/// Unknown routes still answer with the error envelope
pub async fn fallback(correlator: Correlator) -> ApiError {
    ApiError::not_found("The specified resource is not found").with_correlator(&correlator)
}
