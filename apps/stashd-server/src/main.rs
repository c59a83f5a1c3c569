//! Stashd server - minimal object-transfer HTTP server.
//!
//! Clients POST a byte stream to a path-derived key and GET it back by the
//! same key. This binary wires the default backends — filesystem storage
//! and an always-allow authorizer — into the request pipeline and serves it.
//!
//! # Usage
//!
//! ```text
//! STASHD_LISTEN=0.0.0.0:9292 STASHD_ROOT=/var/lib/stashd stashd-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STASHD_LISTEN` | `0.0.0.0:9292` | Bind address |
//! | `STASHD_TIMEOUT_SECS` | `300` | Per-request deadline |
//! | `STASHD_MAX_BODY_SIZE` | `1073741824` | Upload size budget in bytes |
//! | `STASHD_ROOT` | `/tmp` | Storage root directory |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use stashd_core::{AllowAll, FsStorage, StashConfig};
use stashd_http::service::{TransferService, TransferServiceConfig};
use stashd_http::Pipeline;

/// Server version reported in the startup log line.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the service from configuration: always-allow authorization over
/// filesystem storage.
fn build_service(config: &StashConfig) -> TransferService {
    let storage = Arc::new(FsStorage::new(config.storage_root.clone()));
    let pipeline = Pipeline::new(Arc::new(AllowAll), storage, config.max_body_size);

    TransferService::new(
        pipeline,
        TransferServiceConfig {
            request_timeout: config.request_timeout(),
        },
    )
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: TransferService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = StashConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        listen = %config.listen,
        storage_root = %config.storage_root,
        max_body_size = config.max_body_size,
        request_timeout_secs = config.request_timeout_secs,
        version = VERSION,
        "starting stashd server",
    );

    // The storage root must exist before the first upload.
    tokio::fs::create_dir_all(&config.storage_root)
        .await
        .with_context(|| format!("cannot create storage root: {}", config.storage_root))?;

    let service = build_service(&config);

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_build_service_from_config() {
        let config = StashConfig::default();
        let service = build_service(&config);
        // Clone support is what the accept loop relies on.
        let _clone = service.clone();
    }
}
