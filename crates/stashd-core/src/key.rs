//! Transfer keys: normalized, traversal-safe object identifiers.
//!
//! A [`TransferKey`] is derived from the request path. Normalization is
//! purely lexical: the path is percent-decoded once, then split into
//! segments; empty and `.` segments are dropped and `..` pops the previous
//! segment without ever climbing above the root. The result is a rooted
//! relative path, so a filesystem backend can join it under its storage
//! root without risking escape.

use std::path::PathBuf;

use percent_encoding::percent_decode_str;

/// Normalized identifier for one stored object, derived from the request path.
///
/// # Examples
///
/// ```
/// use stashd_core::TransferKey;
///
/// let key = TransferKey::from_path("/a/./b/../c");
/// assert_eq!(key.as_str(), "a/c");
///
/// let evil = TransferKey::from_path("/../../etc/passwd");
/// assert_eq!(evil.as_str(), "etc/passwd");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferKey(String);

impl TransferKey {
    /// Derive a key from a raw request path.
    ///
    /// The path is percent-decoded exactly once, then cleaned segment by
    /// segment. Decoding happens before cleaning so that encoded traversal
    /// attempts (`%2e%2e%2f`) are neutralized like their literal form.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let decoded = percent_decode_str(path).decode_utf8_lossy();

        let mut segments: Vec<&str> = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }

        Self(segments.join("/"))
    }

    /// The normalized key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether normalization produced an empty key (e.g. the request path
    /// was `/`, or consisted only of traversal segments).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The key as a relative path, suitable for joining under a storage root.
    #[must_use]
    pub fn to_rel_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }
}

impl std::fmt::Display for TransferKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
