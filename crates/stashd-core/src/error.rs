//! Error types for the stashd core contracts.

/// Error produced by a storage backend.
///
/// Backends report infrastructure faults only; "object does not exist" is
/// modeled as an absence (`Ok(None)`) on [`Storage::get`](crate::Storage::get),
/// not as an error.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An underlying I/O operation failed.
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Failure of the authorization backend itself.
///
/// Distinct from a denial: a denial is a business outcome, this is an
/// infrastructure fault (database unreachable, token service down, ...).
#[derive(Debug, thiserror::Error)]
#[error("authorizer failure: {0}")]
pub struct AuthorizerError(#[from] anyhow::Error);

impl AuthorizerError {
    /// Create an authorizer error from a human-readable message.
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(anyhow::anyhow!(msg.into()))
    }
}
