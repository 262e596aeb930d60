//! Core types for aer

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a registered application endpoint list.
///
/// Always assigned by the store, never by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationEndpointListId(Uuid);

impl ApplicationEndpointListId {
    /// Draw a fresh random (v4) identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ApplicationEndpointListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for ApplicationEndpointListId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A host/port pair exposed by an application instance in an edge cloud zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEndpoint {
    /// Domain name, IPv4 literal or IPv6 literal
    pub host: String,
    /// Accepted as any integer on the wire; the validation layer enforces 1..=65535
    #[serde(deserialize_with = "deserialize_port")]
    pub port: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApplicationEndpoint {
    pub fn new(host: impl Into<String>, port: i64) -> Self {
        Self {
            host: host.into(),
            port,
            description: None,
        }
    }
}

/// Integers outside the `i64` range saturate, so they still fail the port range check
/// instead of failing to parse. JSON parsers hand very large integers over as floats.
fn deserialize_port<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct PortVisitor;

    impl<'de> Visitor<'de> for PortVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer port number")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(i64::try_from(v).unwrap_or(i64::MAX))
        }

        fn visit_i128<E: de::Error>(self, v: i128) -> Result<i64, E> {
            Ok(v.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<i64, E> {
            Ok(i64::try_from(v).unwrap_or(i64::MAX))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            if !v.is_finite() || v.fract() != 0.0 {
                return Err(E::invalid_type(Unexpected::Float(v), &self));
            }
            // float to int casts saturate
            Ok(v as i64)
        }
    }

    deserializer.deserialize_any(PortVisitor)
}

/// Registration payload accepted by POST and PUT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEndpointsInfo {
    pub edge_cloud_zone: String,
    pub endpoints: Vec<ApplicationEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_profile_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_description: Option<String>,
}

impl ApplicationEndpointsInfo {
    pub fn new(edge_cloud_zone: impl Into<String>, endpoints: Vec<ApplicationEndpoint>) -> Self {
        Self {
            edge_cloud_zone: edge_cloud_zone.into(),
            endpoints,
            application_profile_id: None,
            application_provider_name: None,
            application_description: None,
        }
    }
}

/// A stored registration: the payload plus store-owned metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEndpointList {
    pub id: ApplicationEndpointListId,
    #[serde(flatten)]
    pub info: ApplicationEndpointsInfo,
    pub created_at: DateTime<Utc>,
}

/// Offset-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Pagination {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Everything from the start, used by tests and internal scans
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_serializes_flat_camel_case() {
        let record = ApplicationEndpointList {
            id: ApplicationEndpointListId::generate(),
            info: ApplicationEndpointsInfo::new(
                "zone-1",
                vec![ApplicationEndpoint::new("10.0.0.1", 8080)],
            ),
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["edgeCloudZone"], "zone-1");
        assert_eq!(value["endpoints"], json!([{ "host": "10.0.0.1", "port": 8080 }]));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("applicationProfileId").is_none());

        let back: ApplicationEndpointList = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn port_accepts_any_integer() {
        let port = |raw: &str| {
            serde_json::from_str::<ApplicationEndpoint>(&format!(
                r#"{{"host": "10.0.0.1", "port": {}}}"#,
                raw
            ))
            .map(|e| e.port)
        };

        assert_eq!(port("8080").unwrap(), 8080);
        assert_eq!(port("-1").unwrap(), -1);
        assert_eq!(port("18446744073709551615").unwrap(), i64::MAX);
        assert_eq!(port("99999999999999999999").unwrap(), i64::MAX);
        assert_eq!(port("-99999999999999999999").unwrap(), i64::MIN);

        assert!(port("80.5").is_err());
        assert!(port("\"80\"").is_err());
        assert!(port("null").is_err());
    }

    #[test]
    fn list_id_parses_hyphenated_uuid() {
        let id: ApplicationEndpointListId = "123e4567-e89b-12d3-a456-426614174000".parse().unwrap();
        assert_eq!(id.to_string(), "123e4567-e89b-12d3-a456-426614174000");
        assert!("not-a-uuid".parse::<ApplicationEndpointListId>().is_err());
    }
}
