//! Caller identity and scopes
//!
//! Token validation itself belongs to the OpenID Connect provider; the service
//! only needs the resolved subject and granted scopes. [`TokenResolver`] is the
//! seam where a real introspection client plugs in. [`StaticTokens`] resolves
//! against a fixed table from configuration.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

const SCOPE_PREFIX: &str = "application-endpoint-registration";

/// Permission required by an operation on application endpoint lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Read,
    Write,
    Update,
    Delete,
}

impl Scope {
    pub const ALL: [Scope; 4] = [Scope::Read, Scope::Write, Scope::Update, Scope::Delete];

    fn action(self) -> &'static str {
        match self {
            Scope::Read => "read",
            Scope::Write => "write",
            Scope::Update => "update",
            Scope::Delete => "delete",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", SCOPE_PREFIX, self.action())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown scope: {0}")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = s
            .strip_prefix(SCOPE_PREFIX)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| UnknownScope(s.to_string()))?;

        Scope::ALL
            .into_iter()
            .find(|scope| scope.action() == action)
            .ok_or_else(|| UnknownScope(s.to_string()))
    }
}

/// Authenticated caller, passed explicitly to every handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub subject: String,
    pub scopes: BTreeSet<Scope>,
}

impl AuthContext {
    pub fn new(subject: impl Into<String>, scopes: impl IntoIterator<Item = Scope>) -> Self {
        Self {
            subject: subject.into(),
            scopes: scopes.into_iter().collect(),
        }
    }

    /// Context used when authentication is disabled
    pub fn anonymous() -> Self {
        Self::new("anonymous", Scope::ALL)
    }

    pub fn has_scope(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }
}

/// Resolves a bearer token into the caller's identity
#[async_trait]
pub trait TokenResolver: Send + Sync {
    /// `None` when the token is unknown, expired or revoked
    async fn resolve(&self, token: &str) -> Option<AuthContext>;
}

/// Fixed token table
#[derive(Debug, Default, Clone)]
pub struct StaticTokens {
    tokens: HashMap<String, AuthContext>,
}

impl StaticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, context: AuthContext) -> Self {
        self.tokens.insert(token.into(), context);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenResolver for StaticTokens {
    async fn resolve(&self, token: &str) -> Option<AuthContext> {
        self.tokens.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_strings_round_trip() {
        for scope in Scope::ALL {
            assert_eq!(scope.to_string().parse::<Scope>(), Ok(scope));
        }
        assert_eq!(
            Scope::Delete.to_string(),
            "application-endpoint-registration:delete"
        );
    }

    #[test]
    fn rejects_foreign_scopes() {
        for raw in [
            "read",
            "application-endpoint-registration:admin",
            "application-endpoint-registrationread",
            "other-api:read",
        ] {
            assert!(raw.parse::<Scope>().is_err(), "{raw}");
        }
    }

    #[tokio::test]
    async fn static_tokens_resolve_known_tokens_only() {
        let tokens = StaticTokens::new()
            .with_token("reader-token", AuthContext::new("reader", [Scope::Read]));

        let ctx = tokens.resolve("reader-token").await.unwrap();
        assert_eq!(ctx.subject, "reader");
        assert!(ctx.has_scope(Scope::Read));
        assert!(!ctx.has_scope(Scope::Delete));

        assert!(tokens.resolve("unknown").await.is_none());
    }
}
