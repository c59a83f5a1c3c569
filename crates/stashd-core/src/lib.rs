//! Storage and authorizer contracts, key normalization, and configuration for stashd.
//!
//! This crate provides the foundational building blocks of the stashd
//! object-transfer server, decoupled from HTTP entirely:
//!
//! - **Transfer keys** ([`key`]): path-derived object identifiers, normalized
//!   so they can never escape the storage root.
//!
//! - **Storage contract** ([`storage`]): the minimal capability surface a
//!   storage backend must expose — a write handle with distinct commit and
//!   abort paths, and a seekable, timestamped read handle. Ships with a
//!   filesystem-backed default implementation.
//!
//! - **Authorizer contract** ([`auth`]): a per-request allow/deny/error
//!   decision, computed before any body bytes are consumed. Ships with an
//!   always-allow default.
//!
//! - **Configuration** ([`config`]): process-wide settings loaded once at
//!   startup and immutable thereafter.

pub mod auth;
pub mod config;
pub mod error;
pub mod key;
pub mod storage;

pub use auth::{AllowAll, Authorizer, Decision, RequestIdentity};
pub use config::StashConfig;
pub use error::{AuthorizerError, StorageError};
pub use key::TransferKey;
pub use storage::fs::FsStorage;
pub use storage::{ReadHandle, Storage, WriteHandle};
