//! API server state

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::rate_limit::RateLimiter;
use crate::auth::TokenResolver;
use crate::config::{ApiSection, AppConfig};
use crate::store::RegistrationStore;

/// API server state
#[derive(Clone)]
pub struct AppState {
    /// Registration store
    pub store: Arc<dyn RegistrationStore>,

    /// Paths, page sizes and CORS origins
    pub settings: Arc<ApiSection>,

    /// Bearer token resolver; `None` serves every request as an anonymous caller with all scopes
    pub resolver: Option<Arc<dyn TokenResolver>>,

    pub rate_limiter: Option<Arc<RateLimiter>>,

    pub started_at: Instant,
}

impl AppState {
    /// State with authentication and rate limiting disabled
    pub fn new(store: Arc<dyn RegistrationStore>, settings: ApiSection) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
            resolver: None,
            rate_limiter: None,
            started_at: Instant::now(),
        }
    }

    /// Build state from the loaded configuration
    pub fn from_config(config: &AppConfig, store: Arc<dyn RegistrationStore>) -> anyhow::Result<Self> {
        let mut state = Self::new(store, config.api.clone());

        if config.auth.enabled {
            let tokens = config.auth.static_tokens()?;
            tracing::info!(tokens = tokens.len(), "Bearer token authentication enabled");
            state = state.with_resolver(Arc::new(tokens));
        } else {
            tracing::warn!("Authentication disabled; all requests carry every scope");
        }

        if config.rate_limit.enabled {
            state = state.with_rate_limiter(Arc::new(RateLimiter::new(
                config.rate_limit.requests_per_window,
                Duration::from_secs(config.rate_limit.window_secs),
            )));
        }

        Ok(state)
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TokenResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }
}
