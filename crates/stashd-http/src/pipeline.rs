//! The request pipeline: ordered guards terminating in one of two
//! streaming operations.
//!
//! Each inbound request flows through a fixed linear sequence — no nested
//! handler wrapping — where every stage may short-circuit with a terminal
//! response:
//!
//! 1. **Authorization guard**: authorizer failure maps to 500, explicit
//!    denial to 401. Runs before the key or body is inspected, so
//!    unauthorized callers learn nothing about object existence.
//! 2. **Key-presence guard**: an empty normalized key maps to 400.
//! 3. **Method dispatch**: POST to [`upload`](crate::upload), GET to
//!    [`download`](crate::download); any other method maps to 400 without
//!    storage ever being invoked.
//!
//! The request deadline wraps this whole chain (authorization included) one
//! level up, in [`TransferService`](crate::service::TransferService).

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use stashd_core::{Authorizer, Decision, RequestIdentity, Storage, TransferKey};

use crate::body::TransferBody;
use crate::response::text_response;
use crate::{download, upload};

/// The guarded request pipeline, shared across all concurrent requests.
///
/// Holds the two external collaborators — authorizer and storage — plus the
/// upload size budget. Produces exactly one response per request.
pub struct Pipeline {
    authorizer: Arc<dyn Authorizer>,
    storage: Arc<dyn Storage>,
    max_body_size: u64,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("max_body_size", &self.max_body_size)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline over the given authorizer and storage backends.
    #[must_use]
    pub fn new(
        authorizer: Arc<dyn Authorizer>,
        storage: Arc<dyn Storage>,
        max_body_size: u64,
    ) -> Self {
        Self {
            authorizer,
            storage,
            max_body_size,
        }
    }

    /// Run one request through the guard chain and its terminal operation.
    ///
    /// Generic over the body type so unit tests can drive it with synthetic
    /// bodies; the service layer instantiates it with hyper's `Incoming`.
    pub async fn handle<B>(
        &self,
        req: http::Request<B>,
        request_id: &str,
    ) -> http::Response<TransferBody>
    where
        B: http_body::Body<Data = Bytes> + Send + Unpin,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();
        debug!(method = %parts.method, path = %parts.uri.path(), request_id, "processing request");

        // 1. Authorization guard. Errors and denials are distinct outcomes.
        let identity = RequestIdentity::from_parts(&parts);
        match self.authorizer.authorize(&identity).await {
            Err(e) => {
                error!(error = %e, request_id, "authorizer failed");
                return text_response(
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal authorization error",
                );
            }
            Ok(Decision::Denied) => {
                warn!(path = %identity.path, request_id, "request denied");
                return text_response(http::StatusCode::UNAUTHORIZED, "Not authorized");
            }
            Ok(Decision::Allowed) => {}
        }

        // 2. Key-presence guard.
        let key = TransferKey::from_path(parts.uri.path());
        if key.is_empty() {
            return text_response(http::StatusCode::BAD_REQUEST, "Missing object key");
        }

        // 3. Method dispatch; only the terminal operations touch storage.
        match parts.method {
            http::Method::POST => {
                info!(key = %key, request_id, "upload");
                upload::handle(self.storage.as_ref(), &key, &parts, body, self.max_body_size)
                    .await
            }
            http::Method::GET => {
                info!(key = %key, request_id, "download");
                download::handle(self.storage.as_ref(), &key, &parts).await
            }
            _ => text_response(http::StatusCode::BAD_REQUEST, "Unknown method"),
        }
    }
}
