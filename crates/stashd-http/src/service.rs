//! The hyper `Service` implementation wrapping the pipeline in a deadline.
//!
//! [`TransferService`] is what the server binary mounts on each accepted
//! connection. Per request it:
//!
//! 1. Assigns a request ID (`uuid` v4) carried in logs and the
//!    `x-request-id` response header.
//! 2. Establishes the request deadline around the *entire* pipeline —
//!    authorization included, so a slow authorizer cannot exceed service
//!    limits. Expiry yields 504 and cancels the in-flight operation; any
//!    open write handle is cleaned up by its drop guard.
//! 3. Delegates to [`Pipeline::handle`] and stamps common headers on the
//!    outcome.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::warn;
use uuid::Uuid;

use crate::body::TransferBody;
use crate::pipeline::Pipeline;
use crate::response::{add_common_headers, text_response};

/// Configuration for the transfer service.
#[derive(Debug, Clone)]
pub struct TransferServiceConfig {
    /// Deadline for one request's full pipeline execution.
    pub request_timeout: Duration,
}

impl Default for TransferServiceConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(300),
        }
    }
}

/// The object-transfer HTTP service implementing hyper's `Service` trait.
#[derive(Debug)]
pub struct TransferService {
    pipeline: Arc<Pipeline>,
    config: Arc<TransferServiceConfig>,
}

impl TransferService {
    /// Create a new service over the given pipeline and configuration.
    #[must_use]
    pub fn new(pipeline: Pipeline, config: TransferServiceConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }
}

impl Clone for TransferService {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            config: Arc::clone(&self.config),
        }
    }
}

impl Service<http::Request<Incoming>> for TransferService {
    type Response = http::Response<TransferBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let pipeline = Arc::clone(&self.pipeline);
        let timeout = self.config.request_timeout;

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let response = handle_with_deadline(&pipeline, timeout, req, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Run one request through the pipeline under the request deadline.
///
/// The timeout scope covers every guard and the terminal operation; a fired
/// deadline abandons whatever the inner chain was doing and produces the
/// 504 response itself, suppressing any error the operation would have
/// reported.
pub async fn handle_with_deadline<B>(
    pipeline: &Pipeline,
    timeout: Duration,
    req: http::Request<B>,
    request_id: &str,
) -> http::Response<TransferBody>
where
    B: http_body::Body<Data = Bytes> + Send + Unpin,
    B::Error: std::fmt::Display,
{
    match tokio::time::timeout(timeout, pipeline.handle(req, request_id)).await {
        Ok(response) => response,
        Err(_elapsed) => {
            warn!(request_id, timeout_secs = timeout.as_secs(), "request deadline exceeded");
            text_response(http::StatusCode::GATEWAY_TIMEOUT, "Gateway Timeout")
        }
    }
}
