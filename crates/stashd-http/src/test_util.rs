//! Test doubles for pipeline and operation tests: an in-memory storage that
//! counts backend invocations, plus denying and failing authorizers.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

use stashd_core::{
    Authorizer, AuthorizerError, Decision, ReadHandle, RequestIdentity, Storage, StorageError,
    TransferKey, WriteHandle,
};

/// An authorizer that denies every request.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DenyAll;

#[async_trait]
impl Authorizer for DenyAll {
    async fn authorize(&self, _identity: &RequestIdentity) -> Result<Decision, AuthorizerError> {
        Ok(Decision::Denied)
    }
}

/// An authorizer whose backend always fails.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FailingAuthorizer;

#[async_trait]
impl Authorizer for FailingAuthorizer {
    async fn authorize(&self, _identity: &RequestIdentity) -> Result<Decision, AuthorizerError> {
        Err(AuthorizerError::new("backend unreachable"))
    }
}

/// One stored object: bytes plus recorded modification time.
type StoredObject = (Vec<u8>, DateTime<Utc>);

/// Objects shared between the storage and its outstanding write handles.
type ObjectMap = Arc<Mutex<HashMap<String, StoredObject>>>;

/// In-memory storage double that counts `put`/`get` invocations, so tests
/// can assert that guards never touch the backend.
#[derive(Debug, Default)]
pub(crate) struct MemoryStorage {
    objects: ObjectMap,
    puts: AtomicUsize,
    gets: AtomicUsize,
    fail_puts: bool,
}

impl MemoryStorage {
    /// A storage whose `put` always fails (handle-open failure path).
    pub(crate) fn failing_puts() -> Self {
        Self {
            fail_puts: true,
            ..Self::default()
        }
    }

    /// Seed an object directly, with an explicit modification time.
    pub(crate) fn insert(&self, key: &str, data: &[u8], modified: DateTime<Utc>) {
        self.objects
            .lock()
            .expect("lock")
            .insert(key.to_owned(), (data.to_vec(), modified));
    }

    pub(crate) fn put_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, key: &TransferKey) -> Result<Box<dyn WriteHandle>, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts {
            return Err(StorageError::Internal(anyhow::anyhow!(
                "put disabled for test"
            )));
        }
        Ok(Box::new(MemoryWriteHandle {
            key: key.as_str().to_owned(),
            buf: Vec::new(),
            objects: Arc::clone(&self.objects),
        }))
    }

    async fn get(&self, key: &TransferKey) -> Result<Option<Box<dyn ReadHandle>>, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.lock().expect("lock");
        Ok(objects.get(key.as_str()).map(|(data, modified)| {
            let name = key
                .as_str()
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_owned();
            Box::new(MemoryReadHandle {
                name,
                data: data.clone(),
                pos: 0,
                modified: Some(*modified),
            }) as Box<dyn ReadHandle>
        }))
    }
}

/// Write handle buffering bytes in memory; commit publishes to the map.
struct MemoryWriteHandle {
    key: String,
    buf: Vec<u8>,
    objects: ObjectMap,
}

#[async_trait]
impl WriteHandle for MemoryWriteHandle {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    async fn finalize(self: Box<Self>) -> Result<(), StorageError> {
        self.objects
            .lock()
            .expect("lock")
            .insert(self.key.clone(), (self.buf.clone(), Utc::now()));
        Ok(())
    }

    async fn discard(self: Box<Self>) -> Result<(), StorageError> {
        // Buffered bytes were never visible; dropping them is enough.
        Ok(())
    }
}

/// Seekable in-memory read handle.
pub(crate) struct MemoryReadHandle {
    name: String,
    data: Vec<u8>,
    pos: u64,
    modified: Option<DateTime<Utc>>,
}

impl MemoryReadHandle {
    pub(crate) fn new(name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_owned(),
            data,
            pos: 0,
            modified: Some(Utc::now()),
        }
    }
}

impl AsyncRead for MemoryReadHandle {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let pos = usize::try_from(this.pos).unwrap_or(usize::MAX);
        if pos < this.data.len() {
            let n = buf.remaining().min(this.data.len() - pos);
            buf.put_slice(&this.data[pos..pos + n]);
            this.pos += n as u64;
        }
        Poll::Ready(Ok(()))
    }
}

impl AsyncSeek for MemoryReadHandle {
    fn start_seek(self: Pin<&mut Self>, position: std::io::SeekFrom) -> std::io::Result<()> {
        let this = self.get_mut();
        let len = i64::try_from(this.data.len()).unwrap_or(i64::MAX);
        let new_pos = match position {
            std::io::SeekFrom::Start(n) => i64::try_from(n).unwrap_or(i64::MAX),
            std::io::SeekFrom::End(n) => len + n,
            std::io::SeekFrom::Current(n) => i64::try_from(this.pos).unwrap_or(i64::MAX) + n,
        };
        if new_pos < 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek before start",
            ));
        }
        this.pos = new_pos.unsigned_abs();
        Ok(())
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<u64>> {
        Poll::Ready(Ok(self.pos))
    }
}

impl ReadHandle for MemoryReadHandle {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }
}
