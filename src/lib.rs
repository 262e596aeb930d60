//! aer - CAMARA Application Endpoint Registration service
//!
//! Lets API consumers register the network endpoints (host + port) of an
//! application deployed in an edge cloud zone:
//! - Explicit payload validation with per-field violations
//! - Swappable registration store (in-memory or persisted to local disk)
//! - Scope-based authorization and CAMARA error envelopes
//! - `x-correlator` echo on every response

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod storage;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{Error, Result};
