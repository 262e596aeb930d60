use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};

use crate::auth::{AuthContext, Scope, StaticTokens};
use crate::store::StoreConfig;

pub const DEFAULT_BASE_PATH: &str = "/application-endpoint-registration/vwip";

/// Top-level application configuration loaded from file + environment.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiSection,
    pub storage: StorageSection,
    pub auth: AuthSection,
    pub rate_limit: RateLimitSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Load configuration from disk and environment.
    ///
    /// Environment variables use the `AER_` prefix and `__` between nested
    /// keys, e.g. `AER_SERVER__PORT=9000`.
    pub fn load() -> Result<Self> {
        let config_path = env::var("AER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load from `path` (skipped when missing) overlaid with `AER_*` variables.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = config::Config::builder();

        if path.exists() {
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("AER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        let mut config: Self = settings.try_deserialize()?;

        if config.logging.level.trim().is_empty() {
            config.logging.level = "info".to_string();
        }

        config.validate()?;

        Ok(config)
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }

        let base = &self.api.base_path;
        if !base.starts_with('/') || (base.len() > 1 && base.ends_with('/')) {
            bail!("api.base_path must start with '/' and must not end with '/': {}", base);
        }

        if self.api.max_page_size == 0 {
            bail!("api.max_page_size must be positive");
        }
        if self.api.default_page_size == 0 || self.api.default_page_size > self.api.max_page_size {
            bail!(
                "api.default_page_size must be between 1 and api.max_page_size ({})",
                self.api.max_page_size
            );
        }

        if self.rate_limit.enabled
            && (self.rate_limit.requests_per_window == 0 || self.rate_limit.window_secs == 0)
        {
            bail!("rate_limit.requests_per_window and rate_limit.window_secs must be positive");
        }

        if self.auth.enabled {
            if self.auth.tokens.is_empty() {
                bail!(
                    "auth.enabled requires at least one auth.tokens entry; \
                     add tokens (see config.example.toml) or set AER_AUTH__ENABLED=false"
                );
            }
            // Surfaces unknown scope strings
            self.auth.static_tokens()?;
        }

        Ok(())
    }

    pub fn store_config(&self) -> StoreConfig {
        match self.storage.backend {
            StorageBackendKind::Memory => StoreConfig::Memory,
            StorageBackendKind::Local => StoreConfig::Local {
                root_path: PathBuf::from(&self.storage.local.root_path),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub service_name: String,
    pub base_path: String,
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// CORS origins; empty disables the CORS layer.
    /// Accepts a list or a comma-separated string.
    #[serde(deserialize_with = "string_or_list")]
    pub allowed_origins: Vec<String>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            service_name: "Application Endpoint Registration API".to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            default_page_size: 100,
            max_page_size: 500,
            allowed_origins: Vec::new(),
        }
    }
}

fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        One(String),
        Many(Vec<String>),
    }

    let values = match Raw::deserialize(deserializer)? {
        Raw::One(s) => s.split(',').map(str::to_string).collect(),
        Raw::Many(v) => v,
    };

    Ok(values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageSection {
    pub backend: StorageBackendKind,
    pub local: LocalStorageSection,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Memory,
    Local,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalStorageSection {
    pub root_path: String,
}

impl Default for LocalStorageSection {
    fn default() -> Self {
        Self {
            root_path: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub enabled: bool,
    pub tokens: Vec<TokenEntry>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            enabled: true,
            tokens: Vec::new(),
        }
    }
}

impl AuthSection {
    /// Build the token table, failing on unknown scope strings.
    pub fn static_tokens(&self) -> Result<StaticTokens> {
        let mut tokens = StaticTokens::new();
        for entry in &self.tokens {
            if entry.token.trim().is_empty() {
                bail!("auth.tokens entry for '{}' has an empty token", entry.subject);
            }
            let scopes = entry
                .scopes
                .iter()
                .map(|s| s.parse::<Scope>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .with_context(|| format!("invalid scopes for subject '{}'", entry.subject))?;
            tokens = tokens.with_token(entry.token.clone(), AuthContext::new(entry.subject.clone(), scopes));
        }
        Ok(tokens)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TokenEntry {
    pub token: String,
    pub subject: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    pub enabled: bool,
    pub requests_per_window: u32,
    pub window_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_window: 100,
            window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}
