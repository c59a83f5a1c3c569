//! Filesystem-backed storage: one file per transfer key under a root
//! directory.
//!
//! Uploads never touch the final path directly. Bytes are written to a
//! hidden `.part` sibling file which is atomically renamed into place on
//! [`WriteHandle::finalize`], so a concurrent or subsequent `get` can only
//! ever observe complete objects. Discarding a handle — explicitly or by
//! dropping it unfinalized, as happens when the request deadline fires —
//! removes the part file.
//!
//! Key-to-path mapping relies on [`TransferKey`] normalization: keys are
//! rooted relative paths, so joining them under the storage root cannot
//! escape it.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncSeek, AsyncWriteExt, ReadBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StorageError;
use crate::key::TransferKey;
use crate::storage::{ReadHandle, Storage, WriteHandle};

/// Storage backend using the local filesystem under a fixed root directory.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Create a filesystem storage rooted at `root`.
    ///
    /// The root directory is not created here; it must exist before the
    /// first upload (the server binary creates it at startup).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &TransferKey) -> PathBuf {
        self.root.join(key.to_rel_path())
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn put(&self, key: &TransferKey) -> Result<Box<dyn WriteHandle>, StorageError> {
        let final_path = self.object_path(key);

        // Nested keys map to nested directories.
        if let Some(parent) = final_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // The part file lives in the same directory so the final rename
        // stays on one filesystem and therefore atomic.
        let part_path = final_path.with_file_name(format!(".{}.part", Uuid::new_v4()));
        let file = tokio::fs::File::create(&part_path).await?;

        debug!(key = %key, part = %part_path.display(), "opened write handle");

        Ok(Box::new(FsWriteHandle {
            file,
            part_path,
            final_path,
            committed: false,
        }))
    }

    async fn get(&self, key: &TransferKey) -> Result<Option<Box<dyn ReadHandle>>, StorageError> {
        let path = self.object_path(key);

        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // A directory is not a stored object.
        if meta.is_dir() {
            return Ok(None);
        }

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            // Deleted between stat and open; treat as absent.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = meta.modified().ok().map(DateTime::<Utc>::from);

        Ok(Some(Box::new(FsReadHandle {
            file,
            len: meta.len(),
            name,
            modified,
        })))
    }
}

/// Write handle backed by a `.part` temp file next to the final path.
struct FsWriteHandle {
    file: tokio::fs::File,
    part_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

impl std::fmt::Debug for FsWriteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsWriteHandle")
            .field("part_path", &self.part_path)
            .field("final_path", &self.final_path)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WriteHandle for FsWriteHandle {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.file.write_all(chunk).await?;
        Ok(())
    }

    async fn finalize(mut self: Box<Self>) -> Result<(), StorageError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        tokio::fs::rename(&self.part_path, &self.final_path).await?;
        self.committed = true;
        debug!(path = %self.final_path.display(), "finalized object");
        Ok(())
    }

    async fn discard(mut self: Box<Self>) -> Result<(), StorageError> {
        self.committed = true;
        tokio::fs::remove_file(&self.part_path).await?;
        debug!(part = %self.part_path.display(), "discarded partial object");
        Ok(())
    }
}

impl Drop for FsWriteHandle {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = std::fs::remove_file(&self.part_path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        part = %self.part_path.display(),
                        error = %e,
                        "failed to remove abandoned part file"
                    );
                }
            }
        }
    }
}

/// Read handle backed by an open [`tokio::fs::File`] with metadata recorded
/// at open time.
struct FsReadHandle {
    file: tokio::fs::File,
    len: u64,
    name: String,
    modified: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for FsReadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsReadHandle")
            .field("name", &self.name)
            .field("len", &self.len)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

impl AsyncRead for FsReadHandle {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_read(cx, buf)
    }
}

impl AsyncSeek for FsReadHandle {
    fn start_seek(self: Pin<&mut Self>, position: std::io::SeekFrom) -> std::io::Result<()> {
        Pin::new(&mut self.get_mut().file).start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<u64>> {
        Pin::new(&mut self.get_mut().file).poll_complete(cx)
    }
}

impl ReadHandle for FsReadHandle {
    fn len(&self) -> u64 {
        self.len
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }
}
