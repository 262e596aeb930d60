use std::path::{Path, PathBuf};
use std::sync::Arc;

use aer::api::AppState;
use aer::config::{AppConfig, AuthSection, StorageBackendKind, TokenEntry, DEFAULT_BASE_PATH};
use aer::store::{MemoryStore, StoreConfig};

fn token(scopes: &[&str]) -> TokenEntry {
    TokenEntry {
        token: "secret".into(),
        subject: "ops".into(),
        scopes: scopes.iter().map(|s| s.to_string()).collect(),
    }
}

fn open_config() -> AppConfig {
    AppConfig {
        auth: AuthSection {
            enabled: false,
            tokens: Vec::new(),
        },
        ..Default::default()
    }
}

#[test]
fn defaults_require_tokens() {
    let config = AppConfig::default();
    assert_eq!(config.api.base_path, DEFAULT_BASE_PATH);
    assert_eq!(config.server.port, 8000);
    assert!(config.auth.enabled);

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("auth.tokens"), "{err}");
    assert!(err.to_string().contains("AER_AUTH__ENABLED=false"), "{err}");

    assert!(open_config().validate().is_ok());
}

#[test]
fn token_scopes_must_be_known() {
    let mut config = AppConfig::default();
    config.auth.tokens = vec![token(&[
        "application-endpoint-registration:read",
        "application-endpoint-registration:write",
    ])];
    assert!(config.validate().is_ok());

    config.auth.tokens = vec![token(&["application-endpoint-registration:admin"])];
    let err = config.validate().unwrap_err();
    assert!(format!("{err:#}").contains("unknown scope"), "{err:#}");
}

#[test]
fn base_path_shape() {
    for bad in ["aer", "/aer/", ""] {
        let mut config = open_config();
        config.api.base_path = bad.into();
        assert!(config.validate().is_err(), "{bad:?} should be rejected");
    }

    for good in ["/", "/aer/v1"] {
        let mut config = open_config();
        config.api.base_path = good.into();
        assert!(config.validate().is_ok(), "{good:?} should be accepted");
    }
}

#[test]
fn page_sizes_are_bounded() {
    let mut config = open_config();
    config.api.default_page_size = 0;
    assert!(config.validate().is_err());

    let mut config = open_config();
    config.api.default_page_size = 600;
    config.api.max_page_size = 500;
    assert!(config.validate().is_err());

    let mut config = open_config();
    config.api.max_page_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn rate_limit_needs_positive_window() {
    let mut config = open_config();
    config.rate_limit.enabled = true;
    config.rate_limit.window_secs = 0;
    assert!(config.validate().is_err());

    config.rate_limit.window_secs = 1;
    assert!(config.validate().is_ok());
}

#[test]
fn zero_port_is_rejected() {
    let mut config = open_config();
    config.server.port = 0;
    assert!(config.validate().is_err());
}

#[test]
fn allowed_origins_accept_string_or_list() {
    let config: AppConfig = serde_json::from_value(serde_json::json!({
        "api": { "allowed_origins": "https://a.example, https://b.example,," }
    }))
    .unwrap();
    assert_eq!(
        config.api.allowed_origins,
        vec!["https://a.example", "https://b.example"]
    );

    let config: AppConfig = serde_json::from_value(serde_json::json!({
        "api": { "allowed_origins": ["https://a.example"] }
    }))
    .unwrap();
    assert_eq!(config.api.allowed_origins, vec!["https://a.example"]);
}

#[test]
fn storage_backend_selects_store() {
    let config: AppConfig = serde_json::from_value(serde_json::json!({
        "storage": { "backend": "local", "local": { "root_path": "/var/lib/aer" } }
    }))
    .unwrap();
    assert_eq!(config.storage.backend, StorageBackendKind::Local);

    match config.store_config() {
        StoreConfig::Local { root_path } => assert_eq!(root_path, PathBuf::from("/var/lib/aer")),
        other => panic!("Unexpected store config: {other:?}"),
    }

    assert!(matches!(open_config().store_config(), StoreConfig::Memory));
}

#[test]
fn state_follows_auth_and_rate_limit_switches() {
    let mut config = AppConfig::default();
    config.auth.tokens = vec![token(&["application-endpoint-registration:read"])];
    config.rate_limit.enabled = true;

    let state = AppState::from_config(&config, Arc::new(MemoryStore::new())).unwrap();
    assert!(state.resolver.is_some());
    assert!(state.rate_limiter.is_some());

    let state = AppState::from_config(&open_config(), Arc::new(MemoryStore::new())).unwrap();
    assert!(state.resolver.is_none());
    assert!(state.rate_limiter.is_none());
}

#[test]
fn example_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.example.toml");
    let config = AppConfig::load_from(&path).unwrap();

    assert!(config.auth.enabled);
    assert_eq!(config.auth.tokens.len(), 2);
    assert_eq!(config.api.base_path, DEFAULT_BASE_PATH);
    assert!(config.api.allowed_origins.is_empty());
    assert_eq!(config.storage.backend, StorageBackendKind::Memory);
    assert_eq!(config.auth.static_tokens().unwrap().len(), 2);
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("auth.tokens"), "{err}");
}
