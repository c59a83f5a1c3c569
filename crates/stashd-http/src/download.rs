//! Download operation: stream a stored object back to the client.
//!
//! Uses the read handle's recorded length and modification time to support
//! conditional GET (`If-Modified-Since`) and single-range requests
//! (`Range: bytes=...`) at the transport layer. Range responses seek the
//! handle before streaming, which is why the storage contract requires
//! random access.
//!
//! There is no cleanup path here: once response headers are committed, a
//! failed read mid-body cannot be turned into a clean error response and is
//! treated as an abandoned connection.

use tokio::io::AsyncSeekExt;
use tracing::{debug, error};

use stashd_core::{Storage, TransferKey};

use crate::body::TransferBody;
use crate::response::{fmt_http_date, parse_http_date, text_response};

/// Handle a GET: stream the object identified by `key` to the client.
pub(crate) async fn handle(
    storage: &dyn Storage,
    key: &TransferKey,
    parts: &http::request::Parts,
) -> http::Response<TransferBody> {
    let mut handle = match storage.get(key).await {
        Ok(Some(handle)) => handle,
        Ok(None) => return text_response(http::StatusCode::NOT_FOUND, "Not Found"),
        Err(e) => {
            error!(key = %key, error = %e, "storage failed to open read handle");
            return text_response(
                http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            );
        }
    };

    let len = handle.len();
    let modified = handle.modified();

    // Conditional GET, compared at second precision like HTTP dates carry.
    if let (Some(modified), Some(since)) = (modified, if_modified_since(parts)) {
        if modified.timestamp() <= since.timestamp() {
            let mut builder = http::Response::builder().status(http::StatusCode::NOT_MODIFIED);
            builder = builder.header(http::header::LAST_MODIFIED, fmt_http_date(modified));
            return builder
                .body(TransferBody::empty())
                .expect("static 304 response should be valid");
        }
    }

    // Range: a malformed or unsatisfiable range fails before any seek.
    let range = match range_header(parts) {
        None => None,
        Some(value) => match parse_range(&value, len) {
            Ok(range) => Some(range),
            Err(RangeError) => {
                return http::Response::builder()
                    .status(http::StatusCode::RANGE_NOT_SATISFIABLE)
                    .header(http::header::CONTENT_RANGE, format!("bytes */{len}"))
                    .body(TransferBody::from_string("Requested range not satisfiable"))
                    .expect("static 416 response should be valid");
            }
        },
    };

    let (status, count, content_range) = match range {
        Some((start, end)) => {
            if let Err(e) = handle.seek(std::io::SeekFrom::Start(start)).await {
                error!(key = %key, error = %e, "failed to seek for range request");
                return text_response(
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                );
            }
            (
                http::StatusCode::PARTIAL_CONTENT,
                end - start + 1,
                Some(format!("bytes {start}-{end}/{len}")),
            )
        }
        None => (http::StatusCode::OK, len, None),
    };

    debug!(key = %key, name = handle.name(), bytes = count, "streaming object");

    let mut builder = http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/octet-stream")
        .header(http::header::CONTENT_LENGTH, count)
        .header(http::header::ACCEPT_RANGES, "bytes");
    if let Some(modified) = modified {
        builder = builder.header(http::header::LAST_MODIFIED, fmt_http_date(modified));
    }
    if let Some(content_range) = content_range {
        builder = builder.header(http::header::CONTENT_RANGE, content_range);
    }

    match builder.body(TransferBody::streaming(handle, count)) {
        Ok(response) => response,
        Err(e) => {
            error!(key = %key, error = %e, "failed to build download response");
            text_response(
                http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            )
        }
    }
}

fn if_modified_since(parts: &http::request::Parts) -> Option<chrono::DateTime<chrono::Utc>> {
    parts
        .headers
        .get(http::header::IF_MODIFIED_SINCE)?
        .to_str()
        .ok()
        .and_then(parse_http_date)
}

fn range_header(parts: &http::request::Parts) -> Option<String> {
    parts
        .headers
        .get(http::header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// The range was malformed or unsatisfiable for the object's length.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("requested range not satisfiable")]
struct RangeError;

/// Parse a single-range `Range` header into an inclusive `(start, end)` pair.
///
/// Supports `bytes=N-M`, `bytes=N-`, and `bytes=-N` (last N bytes). The end
/// is clamped to the object length; multi-range requests are not supported.
fn parse_range(range: &str, content_length: u64) -> Result<(u64, u64), RangeError> {
    let range = range.strip_prefix("bytes=").ok_or(RangeError)?;

    if content_length == 0 {
        return Err(RangeError);
    }

    if let Some(suffix) = range.strip_prefix('-') {
        // bytes=-N  (last N bytes)
        let n: u64 = suffix.parse().map_err(|_| RangeError)?;
        if n == 0 || n > content_length {
            return Err(RangeError);
        }
        Ok((content_length - n, content_length - 1))
    } else if let Some(prefix) = range.strip_suffix('-') {
        // bytes=N-  (from N to end)
        let start: u64 = prefix.parse().map_err(|_| RangeError)?;
        if start >= content_length {
            return Err(RangeError);
        }
        Ok((start, content_length - 1))
    } else {
        // bytes=N-M
        let (start, end) = range.split_once('-').ok_or(RangeError)?;
        let start: u64 = start.parse().map_err(|_| RangeError)?;
        let end: u64 = end.parse().map_err(|_| RangeError)?;
        if start > end || start >= content_length {
            return Err(RangeError);
        }
        Ok((start, end.min(content_length - 1)))
    }
}
