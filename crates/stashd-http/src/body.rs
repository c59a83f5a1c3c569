//! Response body types supporting buffered, streaming, and empty modes.
//!
//! This module provides [`TransferBody`], the HTTP response body type used
//! throughout the stashd service:
//!
//! - **Buffered**: for small responses such as confirmation and error bodies.
//! - **Streaming**: for object downloads — bytes are pulled from a storage
//!   [`ReadHandle`] chunk by chunk, never buffering the whole object.
//! - **Empty**: for responses with no body content (e.g. 304 Not Modified).

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;
use stashd_core::ReadHandle;
use tokio::io::{AsyncRead, ReadBuf};

/// Chunk size for streaming object downloads.
const STREAM_CHUNK_SIZE: u64 = 64 * 1024;

/// Response body supporting buffered, streaming, and empty modes.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper
/// responses.
#[derive(Debug, Default)]
pub enum TransferBody {
    /// Buffered body for small responses: confirmations, error messages.
    Buffered(Full<Bytes>),
    /// Streaming body pulling bytes from a storage read handle.
    Streaming(ObjectStream),
    /// Empty body for 304 responses and the like.
    #[default]
    Empty,
}

impl TransferBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create a streaming body that yields exactly `remaining` bytes from
    /// the handle's current position.
    #[must_use]
    pub fn streaming(handle: Box<dyn ReadHandle>, remaining: u64) -> Self {
        Self::Streaming(ObjectStream { handle, remaining })
    }
}

impl http_body::Body for TransferBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Streaming(stream) => stream.poll_next_chunk(cx),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Streaming(stream) => stream.remaining == 0,
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Streaming(stream) => http_body::SizeHint::with_exact(stream.remaining),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}

/// Streaming source for one object download.
///
/// Reads from the handle's current position (the download operation seeks
/// first for range responses) and stops after `remaining` bytes. A read
/// error mid-stream surfaces as a body error, which aborts the connection —
/// response headers are already committed at that point, so no error
/// response is possible.
pub struct ObjectStream {
    handle: Box<dyn ReadHandle>,
    remaining: u64,
}

impl std::fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStream")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl ObjectStream {
    fn poll_next_chunk(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Bytes>, std::io::Error>>> {
        if self.remaining == 0 {
            return Poll::Ready(None);
        }

        // The min with STREAM_CHUNK_SIZE keeps this within usize range.
        let want = usize::try_from(self.remaining.min(STREAM_CHUNK_SIZE)).unwrap_or(65_536);
        let mut buf = vec![0u8; want];
        let mut read_buf = ReadBuf::new(&mut buf);

        match Pin::new(&mut self.handle).poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
            Poll::Ready(Ok(())) => {
                let n = read_buf.filled().len();
                if n == 0 {
                    // Object shorter than recorded; end the stream.
                    self.remaining = 0;
                    return Poll::Ready(None);
                }
                self.remaining -= n as u64;
                buf.truncate(n);
                Poll::Ready(Some(Ok(http_body::Frame::data(Bytes::from(buf)))))
            }
        }
    }
}
