//! Authorizer contract: a per-request allow/deny/error decision.
//!
//! The core never implements authentication itself. It hands the request's
//! identifying metadata to an [`Authorizer`] and acts on the tri-state
//! outcome: allowed, denied, or backend failure. Concrete implementations
//! may consult databases, JWT tokens, cookies — anything reachable from the
//! request headers — as long as they never touch the request body.

use async_trait::async_trait;

use crate::error::AuthorizerError;

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed.
    Allowed,
    /// The request is explicitly denied (business outcome, not a fault).
    Denied,
}

/// The identifying metadata of one request, captured before any body bytes
/// are read. Computed fresh per request and never cached.
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    /// The HTTP method.
    pub method: http::Method,
    /// The raw request path (not the normalized transfer key).
    pub path: String,
    /// All request headers, giving authorizers access to tokens and cookies.
    pub headers: http::HeaderMap,
}

impl RequestIdentity {
    /// Capture the identity of a request from its decomposed parts.
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_owned(),
            headers: parts.headers.clone(),
        }
    }
}

/// Authorization backend: decides whether one request may proceed.
///
/// Called exactly once per request, before the transfer key is inspected
/// and before any body bytes are consumed. Must be side-effect free with
/// respect to the transfer itself.
#[async_trait]
pub trait Authorizer: Send + Sync + 'static {
    /// Decide whether the request identified by `identity` may proceed.
    ///
    /// A `Denied` decision and an `Err` are different outcomes: the former
    /// maps to 401, the latter to an internal server error.
    async fn authorize(&self, identity: &RequestIdentity) -> Result<Decision, AuthorizerError>;
}

/// An authorizer that allows every request.
///
/// The default backend for environments with no access control requirement.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn authorize(&self, _identity: &RequestIdentity) -> Result<Decision, AuthorizerError> {
        Ok(Decision::Allowed)
    }
}
