//! CAMARA error envelope
//!
//! Every failure leaves the API as `{status, code, message, correlator?}`.
//! Internal failures are logged here and replaced with a fixed message.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::correlator::Correlator;
use crate::auth::Scope;
use crate::Error;

/// Machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidArgument,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    MethodNotAllowed,
    UnprocessableContent,
    TooManyRequests,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::UnprocessableContent => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorCode::UnprocessableContent => "UNPROCESSABLE_CONTENT",
            ErrorCode::TooManyRequests => "TOO_MANY_REQUESTS",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Wire form of an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub status: u16,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlator: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    correlator: Option<String>,
    retry_after: Option<Duration>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            correlator: None,
            retry_after: None,
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, msg)
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, msg)
    }

    pub fn permission_denied(scope: Scope) -> Self {
        Self::new(
            ErrorCode::PermissionDenied,
            format!("Client does not have sufficient permissions: requires scope {}", scope),
        )
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }

    pub fn too_many_requests(retry_after: Duration) -> Self {
        let mut err = Self::new(
            ErrorCode::TooManyRequests,
            "Either out of resource quota or reaching rate limiting",
        );
        err.retry_after = Some(retry_after);
        err
    }

    pub fn internal() -> Self {
        Self::new(ErrorCode::Internal, "Server error")
    }

    pub fn with_correlator(mut self, correlator: &Correlator) -> Self {
        self.correlator = correlator.as_deref().map(str::to_string);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(id) => {
                ApiError::not_found(format!("Application endpoint list {} not found", id))
            }
            Error::Validation(e) => ApiError::invalid_argument(e.to_string()),
            other => {
                tracing::error!(error = %other, "Request failed with internal error");
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = Json(ErrorInfo {
            status: status.as_u16(),
            code: self.code.as_str().to_string(),
            message: self.message,
            correlator: self.correlator,
        });

        let mut response = (status, body).into_response();
        if let Some(retry_after) = self.retry_after {
            // Round up so clients never retry early
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApplicationEndpointListId;
    use crate::validation::ValidationError;

    #[test]
    fn maps_store_errors() {
        let id = ApplicationEndpointListId::generate();
        let err = ApiError::from(Error::NotFound(id));
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(err.message().contains(&id.to_string()));

        let err = ApiError::from(Error::Validation(ValidationError::single(
            "endpoints",
            "must contain at least one endpoint",
        )));
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(err.message(), "endpoints: must contain at least one endpoint");
    }

    #[test]
    fn internal_errors_hide_detail() {
        let err = ApiError::from(Error::storage("disk /var/lib/aer is full"));
        assert_eq!(err.code(), ErrorCode::Internal);
        assert!(!err.message().contains("/var/lib"));
    }

    #[test]
    fn status_codes_match_codes() {
        assert_eq!(ErrorCode::InvalidArgument.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::MethodNotAllowed.status().as_u16(), 405);
        assert_eq!(ErrorCode::UnprocessableContent.status().as_u16(), 422);
        assert_eq!(ErrorCode::TooManyRequests.status().as_u16(), 429);
        assert_eq!(ErrorCode::Internal.as_str(), "INTERNAL");
    }

    #[test]
    fn retry_after_is_rounded_up() {
        let response = ApiError::too_many_requests(Duration::from_millis(1500)).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }
}
