//! `x-correlator` handling
//!
//! The header is opaque to the service. Whatever the client sent is copied
//! onto the response, and error bodies repeat it when it is valid UTF-8.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header::HeaderName, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

pub const X_CORRELATOR: HeaderName = HeaderName::from_static("x-correlator");

/// Client-supplied correlator of the current request, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Correlator(Option<String>);

impl Correlator {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self(
            headers
                .get(&X_CORRELATOR)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        )
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Correlator
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Echo the inbound `x-correlator` header on every response
pub async fn echo_correlator(req: Request, next: Next) -> Response {
    let correlator = req.headers().get(&X_CORRELATOR).cloned();

    let mut response = next.run(req).await;
    if let Some(value) = correlator {
        response.headers_mut().insert(X_CORRELATOR, value);
    }
    response
}
