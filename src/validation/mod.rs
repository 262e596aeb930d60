//! Payload validation
//!
//! Every check runs and all violations are reported together, so a client
//! sees the full list of problems in one 400 response. Handlers call
//! [`validate`] before touching the store.

use std::fmt;

use thiserror::Error;

use crate::types::{ApplicationEndpoint, ApplicationEndpointsInfo};

pub mod host;

pub use host::{classify_host, HostKind};

pub const MIN_PORT: i64 = 1;
pub const MAX_PORT: i64 = 65_535;
pub const MAX_ENDPOINTS: usize = 256;
pub const MAX_ZONE_LEN: usize = 128;
pub const MAX_DESCRIPTION_LEN: usize = 1024;
pub const MAX_PROVIDER_NAME_LEN: usize = 256;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// JSON path of the offending field, e.g. `endpoints[1].port`
    pub field: String,
    pub reason: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.into(),
                reason: reason.into(),
            }],
        }
    }

    /// Whether any violation concerns `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn render(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.push(FieldViolation {
            field: field.into(),
            reason: reason.into(),
        });
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations: self.0 })
        }
    }
}

/// Validate a registration payload.
pub fn validate(info: &ApplicationEndpointsInfo) -> Result<(), ValidationError> {
    let mut violations = Violations::default();

    check_zone(&info.edge_cloud_zone, &mut violations);

    if info.endpoints.is_empty() {
        violations.push("endpoints", "must contain at least one endpoint");
    } else if info.endpoints.len() > MAX_ENDPOINTS {
        violations.push(
            "endpoints",
            format!("must contain at most {} endpoints", MAX_ENDPOINTS),
        );
    }

    for (idx, endpoint) in info.endpoints.iter().enumerate() {
        check_endpoint(idx, endpoint, &mut violations);
    }

    if let Some(name) = &info.application_provider_name {
        let len = name.chars().count();
        if len == 0 || len > MAX_PROVIDER_NAME_LEN {
            violations.push(
                "applicationProviderName",
                format!("must be between 1 and {} characters", MAX_PROVIDER_NAME_LEN),
            );
        }
    }

    if let Some(description) = &info.application_description {
        check_description("applicationDescription", description, &mut violations);
    }

    violations.finish()
}

fn check_zone(zone: &str, violations: &mut Violations) {
    if zone.is_empty() {
        violations.push("edgeCloudZone", "must not be empty");
        return;
    }

    if zone.len() > MAX_ZONE_LEN {
        violations.push(
            "edgeCloudZone",
            format!("must be at most {} characters", MAX_ZONE_LEN),
        );
        return;
    }

    let starts_alnum = zone.starts_with(|c: char| c.is_ascii_alphanumeric());
    let charset_ok = zone
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
    if !starts_alnum || !charset_ok {
        violations.push(
            "edgeCloudZone",
            "must start with a letter or digit and contain only letters, digits, '-', '_', '.' or ':'",
        );
    }
}

fn check_endpoint(idx: usize, endpoint: &ApplicationEndpoint, violations: &mut Violations) {
    if classify_host(&endpoint.host).is_none() {
        violations.push(
            format!("endpoints[{}].host", idx),
            "must be a valid domain name, IPv4 address or IPv6 address",
        );
    }

    if !(MIN_PORT..=MAX_PORT).contains(&endpoint.port) {
        violations.push(
            format!("endpoints[{}].port", idx),
            format!("must be between {} and {}", MIN_PORT, MAX_PORT),
        );
    }

    if let Some(description) = &endpoint.description {
        check_description(
            &format!("endpoints[{}].description", idx),
            description,
            violations,
        );
    }
}

fn check_description(field: &str, description: &str, violations: &mut Violations) {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        violations.push(
            field,
            format!("must be at most {} characters", MAX_DESCRIPTION_LEN),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_with(endpoints: Vec<ApplicationEndpoint>) -> ApplicationEndpointsInfo {
        ApplicationEndpointsInfo::new("zone-1", endpoints)
    }

    #[test]
    fn accepts_minimal_payload() {
        let info = info_with(vec![ApplicationEndpoint::new("10.0.0.1", 8080)]);
        assert_eq!(validate(&info), Ok(()));
    }

    #[test]
    fn rejects_empty_endpoints() {
        let err = validate(&info_with(vec![])).unwrap_err();
        assert!(err.has_field("endpoints"));
        assert_eq!(err.violations.len(), 1);
    }

    #[test]
    fn port_boundaries() {
        for port in [MIN_PORT, MAX_PORT] {
            let info = info_with(vec![ApplicationEndpoint::new("example.com", port)]);
            assert!(validate(&info).is_ok(), "port {port} should be accepted");
        }

        for port in [0, 65_536, -1] {
            let info = info_with(vec![ApplicationEndpoint::new("example.com", port)]);
            let err = validate(&info).unwrap_err();
            assert!(err.has_field("endpoints[0].port"), "port {port}");
        }
    }

    #[test]
    fn collects_every_violation() {
        let mut info = info_with(vec![
            ApplicationEndpoint::new("ok.example.com", 443),
            ApplicationEndpoint::new("bad..host", 0),
        ]);
        info.edge_cloud_zone = String::new();

        let err = validate(&info).unwrap_err();
        assert!(err.has_field("edgeCloudZone"));
        assert!(err.has_field("endpoints[1].host"));
        assert!(err.has_field("endpoints[1].port"));
        assert!(!err.has_field("endpoints[0].host"));
        assert_eq!(err.violations.len(), 3);
    }

    #[test]
    fn rejects_malformed_zone() {
        for zone in [" zone-1", "zone 1", "-zone", "zone/1"] {
            let mut info = info_with(vec![ApplicationEndpoint::new("10.0.0.1", 80)]);
            info.edge_cloud_zone = zone.to_string();
            assert!(validate(&info).unwrap_err().has_field("edgeCloudZone"), "{zone:?}");
        }

        let mut info = info_with(vec![ApplicationEndpoint::new("10.0.0.1", 80)]);
        info.edge_cloud_zone = "z".repeat(MAX_ZONE_LEN + 1);
        assert!(validate(&info).is_err());

        info.edge_cloud_zone = "eu-west-1a:edge.zone_2".to_string();
        assert!(validate(&info).is_ok());
    }

    #[test]
    fn rejects_too_many_endpoints() {
        let endpoints = (0..=MAX_ENDPOINTS)
            .map(|i| ApplicationEndpoint::new("10.0.0.1", (i + 1) as i64))
            .collect();
        assert!(validate(&info_with(endpoints)).unwrap_err().has_field("endpoints"));
    }

    #[test]
    fn checks_optional_text_fields() {
        let mut info = info_with(vec![ApplicationEndpoint::new("10.0.0.1", 80)]);
        info.application_provider_name = Some(String::new());
        info.application_description = Some("d".repeat(MAX_DESCRIPTION_LEN + 1));
        info.endpoints[0].description = Some("x".repeat(MAX_DESCRIPTION_LEN + 1));

        let err = validate(&info).unwrap_err();
        assert!(err.has_field("applicationProviderName"));
        assert!(err.has_field("applicationDescription"));
        assert!(err.has_field("endpoints[0].description"));
    }

    #[test]
    fn message_lists_fields() {
        let err = validate(&info_with(vec![ApplicationEndpoint::new("10.0.0.1", 0)])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "endpoints[0].port: must be between 1 and 65535"
        );
    }
}
