//! Storage contract: the minimal capability surface a backend must expose.
//!
//! Two operations are required: [`Storage::put`] produces a write handle for
//! a key, [`Storage::get`] produces a read handle or signals absence. Write
//! handles distinguish *commit* ([`WriteHandle::finalize`]) from *abort*
//! ([`WriteHandle::discard`]), because "transfer completed" and "transfer
//! interrupted" are different backend actions — keep a complete object
//! vs. delete a partial one.
//!
//! # Guarantees backends must uphold
//!
//! - A key that was successfully finalized is subsequently retrievable via
//!   `get`; a discarded key is not retrievable (or was never visible).
//! - Concurrent `put`/`get` calls for distinct keys do not interfere.
//! - Concurrent `put` calls for the same key resolve last-writer-wins; the
//!   core provides no per-key locking or deduplication.
//! - Dropping an unfinalized write handle behaves like `discard` (best
//!   effort), so a deadline-cancelled upload never leaks a partial object.

pub mod fs;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncSeek};

use crate::error::StorageError;
use crate::key::TransferKey;

/// Backend storage engine for transfer objects.
///
/// Implementations must be safe to share across concurrently handled
/// requests; each returned handle is owned exclusively by the operation
/// that requested it and never outlives its request.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Open a write handle for `key`, replacing any previous object once the
    /// handle is finalized.
    async fn put(&self, key: &TransferKey) -> Result<Box<dyn WriteHandle>, StorageError>;

    /// Open a read handle for `key`, or `None` if no such object exists.
    async fn get(&self, key: &TransferKey) -> Result<Option<Box<dyn ReadHandle>>, StorageError>;
}

/// An in-progress upload bound to one key.
///
/// Exactly one of [`finalize`](Self::finalize) or [`discard`](Self::discard)
/// must conclude the handle; dropping it unfinalized counts as a discard.
#[async_trait]
pub trait WriteHandle: Send {
    /// Append a chunk of body bytes to the object.
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError>;

    /// Commit the object. Only after this returns `Ok` is the key
    /// retrievable via [`Storage::get`].
    async fn finalize(self: Box<Self>) -> Result<(), StorageError>;

    /// Abort the transfer and delete any partially written data.
    async fn discard(self: Box<Self>) -> Result<(), StorageError>;
}

/// An open read operation on one stored object.
///
/// Random access (seek) is required because range responses may start
/// mid-stream. Metadata is recorded when the handle is opened.
pub trait ReadHandle: AsyncRead + AsyncSeek + Send + Unpin {
    /// Total size of the object in bytes.
    fn len(&self) -> u64;

    /// Whether the object is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The object's recorded name (the last key segment for fs backends).
    fn name(&self) -> &str;

    /// Last modification time, if the backend records one.
    fn modified(&self) -> Option<DateTime<Utc>>;
}
