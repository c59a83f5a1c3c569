//! Response construction helpers and HTTP-date handling.

use chrono::{DateTime, Utc};
use http::header::HeaderValue;

use crate::body::TransferBody;

/// Build a plain-text response with the given status and message.
///
/// Used for every guard rejection and error outcome; messages are short and
/// human-readable, mirroring the taxonomy in the error-handling design.
#[must_use]
pub fn text_response(status: http::StatusCode, message: &str) -> http::Response<TransferBody> {
    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(TransferBody::from_string(message))
        .expect("static text response should be valid")
}

/// Add common response headers to every response.
#[must_use]
pub fn add_common_headers(
    mut response: http::Response<TransferBody>,
    request_id: &str,
) -> http::Response<TransferBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert("Server", HeaderValue::from_static("Stashd"));

    response
}

/// Format a timestamp as an HTTP-date (IMF-fixdate, always GMT).
#[must_use]
pub fn fmt_http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an HTTP-date header value such as `If-Modified-Since`.
///
/// Returns `None` for malformed values; conditional headers that cannot be
/// parsed are ignored rather than rejected.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
