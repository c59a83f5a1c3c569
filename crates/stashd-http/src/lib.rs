//! Request pipeline, streaming operations, and hyper service for stashd.
//!
//! This crate is the core of the server: an ordered chain of cross-cutting
//! guards wrapped around two terminal streaming operations, plus the hyper
//! plumbing to serve it. It handles:
//!
//! - **Pipeline** ([`pipeline`]): the fixed guard sequence — authorization,
//!   key presence, method dispatch — each able to short-circuit with a
//!   terminal response. Guards are pure pre-conditions; only the terminal
//!   operations touch storage.
//!
//! - **Upload** ([`upload`]): streams request-body frames into a storage
//!   write handle, enforcing the size budget both on the declared length
//!   (fast fail) and on the actual byte stream (cheat proof), with cleanup
//!   of partial objects on every failure path.
//!
//! - **Download** ([`download`]): streams a stored object back to the
//!   client, honoring `If-Modified-Since` and single-range `Range` requests
//!   via the handle's seek support.
//!
//! - **Service** ([`service`]): the [`TransferService`](service::TransferService)
//!   implementing hyper's `Service` trait, which establishes the per-request
//!   deadline around the *entire* pipeline (authorization included) and maps
//!   its expiry to 504.
//!
//! - **Body** ([`body`]): the [`TransferBody`](body::TransferBody) response
//!   body supporting buffered, streaming, and empty modes.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> TransferService (hyper Service, per-request deadline)
//!     -> Pipeline::handle
//!       -> Authorization guard (401 / 500)
//!       -> Key-presence guard (400)
//!       -> Method dispatch (400 on unknown)
//!         -> upload (POST)  | download (GET)
//!   <- HTTP Response (+ x-request-id, Server headers)
//! ```

pub mod body;
pub mod download;
pub mod pipeline;
pub mod response;
pub mod service;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_util;

pub use body::TransferBody;
pub use pipeline::Pipeline;
pub use service::{TransferService, TransferServiceConfig};
