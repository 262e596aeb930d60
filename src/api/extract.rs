//! Request extractors that reject with the CAMARA error envelope

use async_trait::async_trait;
use axum::{
    extract::{
        rejection::JsonRejection,
        FromRequest, FromRequestParts, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::correlator::Correlator;
use super::error::{ApiError, ErrorCode};
use crate::auth::{AuthContext, Scope};
use crate::config::ApiSection;
use crate::types::Pagination;

/// JSON body. Syntax errors are 400, well-formed bodies of the wrong shape are 422.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let correlator = Correlator::from_headers(req.headers());

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                let code = match &rejection {
                    JsonRejection::JsonDataError(_) => ErrorCode::UnprocessableContent,
                    _ => ErrorCode::InvalidArgument,
                };
                Err(ApiError::new(code, rejection.body_text()).with_correlator(&correlator))
            }
        }
    }
}

/// The authenticated caller inserted by the auth middleware
pub struct Caller(pub AuthContext);

impl Caller {
    pub fn require(&self, scope: Scope, correlator: &Correlator) -> Result<(), ApiError> {
        if self.0.has_scope(scope) {
            Ok(())
        } else {
            tracing::warn!(subject = %self.0.subject, %scope, "Missing scope");
            Err(ApiError::permission_denied(scope).with_correlator(correlator))
        }
    }

    pub fn subject(&self) -> &str {
        &self.0.subject
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| {
                ApiError::unauthenticated("Request not authenticated")
                    .with_correlator(&Correlator::from_headers(&parts.headers))
            })
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawPageParams {
    offset: Option<usize>,
    limit: Option<usize>,
}

/// `offset` / `limit` query parameters as sent by the client
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl PageParams {
    /// Apply defaults and bounds from the API settings
    pub fn resolve(self, settings: &ApiSection) -> Result<Pagination, ApiError> {
        let limit = self.limit.unwrap_or(settings.default_page_size);
        if limit == 0 || limit > settings.max_page_size {
            return Err(ApiError::invalid_argument(format!(
                "limit must be between 1 and {}",
                settings.max_page_size
            )));
        }
        Ok(Pagination::new(self.offset.unwrap_or(0), limit))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PageParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<RawPageParams>::from_request_parts(parts, state).await {
            Ok(Query(raw)) => Ok(PageParams {
                offset: raw.offset,
                limit: raw.limit,
            }),
            Err(rejection) => Err(ApiError::invalid_argument(rejection.body_text())
                .with_correlator(&Correlator::from_headers(&parts.headers))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ApiSection {
        ApiSection {
            default_page_size: 10,
            max_page_size: 50,
            ..ApiSection::default()
        }
    }

    #[test]
    fn page_params_defaults() {
        let page = PageParams::default().resolve(&settings()).unwrap();
        assert_eq!(page, Pagination::new(0, 10));
    }

    #[test]
    fn page_params_bounds() {
        let ok = PageParams {
            offset: Some(5),
            limit: Some(50),
        };
        assert_eq!(ok.resolve(&settings()).unwrap(), Pagination::new(5, 50));

        for limit in [0, 51] {
            let err = PageParams {
                offset: None,
                limit: Some(limit),
            }
            .resolve(&settings())
            .unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidArgument);
        }
    }
}
