//! Upload operation: stream bounded request-body bytes into storage.
//!
//! The size budget is enforced twice: a fast fail on the declared
//! `Content-Length` before a storage handle is opened, and a hard stop on
//! the actual byte count while streaming, which catches clients that omit
//! or understate the declared length. Every failure path after the handle
//! is opened discards it, so no partial object is ever left visible.

use bytes::Bytes;
use http_body_util::BodyExt;
use tracing::{debug, error, warn};

use stashd_core::{Storage, TransferKey, WriteHandle};

use crate::body::TransferBody;
use crate::response::text_response;

/// Handle a POST: stream the request body into a storage write handle.
pub(crate) async fn handle<B>(
    storage: &dyn Storage,
    key: &TransferKey,
    parts: &http::request::Parts,
    body: B,
    budget: u64,
) -> http::Response<TransferBody>
where
    B: http_body::Body<Data = Bytes> + Send + Unpin,
    B::Error: std::fmt::Display,
{
    // A request that declares no body at all is rejected before storage is
    // involved. A zero-length body (Content-Length: 0) is a valid upload.
    if body_absent(parts) {
        return text_response(http::StatusCode::BAD_REQUEST, "Empty body");
    }

    // Fast fail on the declared length; avoids opening a handle for a
    // transfer that cannot fit the budget.
    if let Some(declared) = declared_length(parts) {
        if declared > budget {
            return text_response(http::StatusCode::PAYLOAD_TOO_LARGE, "Request too big");
        }
    }

    let mut handle = match storage.put(key).await {
        Ok(handle) => handle,
        Err(e) => {
            error!(key = %key, error = %e, "storage refused write handle");
            return text_response(
                http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            );
        }
    };

    match pump(&mut *handle, body, budget).await {
        Ok(received) => {
            if let Err(e) = handle.finalize().await {
                error!(key = %key, error = %e, "failed to finalize object");
                return text_response(http::StatusCode::INTERNAL_SERVER_ERROR, "Storage error");
            }
            debug!(key = %key, bytes = received, "upload complete");
            text_response(http::StatusCode::OK, "OK")
        }
        Err(failure) => {
            if let Err(e) = handle.discard().await {
                warn!(key = %key, error = %e, "failed to discard partial object");
            }
            match failure {
                PumpFailure::BudgetExceeded => {
                    warn!(key = %key, budget, "upload exceeded size budget mid-stream");
                    text_response(http::StatusCode::PAYLOAD_TOO_LARGE, "Request too big")
                }
                PumpFailure::Read(msg) => {
                    error!(key = %key, error = %msg, "failed to read request body");
                    text_response(http::StatusCode::INTERNAL_SERVER_ERROR, "Storage error")
                }
                PumpFailure::Write(e) => {
                    error!(key = %key, error = %e, "failed to write to storage");
                    text_response(http::StatusCode::INTERNAL_SERVER_ERROR, "Storage error")
                }
            }
        }
    }
}

/// Why the byte pump stopped before a clean end of stream.
enum PumpFailure {
    BudgetExceeded,
    Read(String),
    Write(stashd_core::StorageError),
}

/// Stream body frames into the write handle, counting bytes against the
/// budget. Returns the number of bytes written on success.
async fn pump<B>(
    handle: &mut dyn WriteHandle,
    mut body: B,
    budget: u64,
) -> Result<u64, PumpFailure>
where
    B: http_body::Body<Data = Bytes> + Send + Unpin,
    B::Error: std::fmt::Display,
{
    let mut received: u64 = 0;

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| PumpFailure::Read(e.to_string()))?;
        let Ok(data) = frame.into_data() else {
            // Trailers carry no object bytes.
            continue;
        };

        received += data.len() as u64;
        if received > budget {
            return Err(PumpFailure::BudgetExceeded);
        }

        handle.write_chunk(&data).await.map_err(PumpFailure::Write)?;
    }

    Ok(received)
}

/// Whether the request carries no body at all.
///
/// A request without `Content-Length` and without `Transfer-Encoding`
/// declared no body; `Content-Length: 0` declares an empty (valid) one.
fn body_absent(parts: &http::request::Parts) -> bool {
    !parts.headers.contains_key(http::header::CONTENT_LENGTH)
        && !parts.headers.contains_key(http::header::TRANSFER_ENCODING)
}

/// The declared content length, when present and parseable.
fn declared_length(parts: &http::request::Parts) -> Option<u64> {
    parts
        .headers
        .get(http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
