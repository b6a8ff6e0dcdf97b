//! # Waypost
//!
//! A best-effort service-advertisement heartbeat client. Waypost keeps a set
//! of locally-hosted services registered with one or more remote registry
//! peers: after a successful advertise it re-registers on a fuzzed interval
//! (so the registry sees a smooth stream instead of bursts), and on failure
//! it retries inside a jittered exponential-backoff window (so a recovering
//! registry is not hit by a synchronized retry storm).
//!
//! One independent heartbeat loop runs per peer. Loops never share
//! scheduling state; a peer that is down forever just keeps retrying at the
//! backoff ceiling without affecting any other peer.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use waypost::{AdvertiseConfig, AdvertiseManager, PeerConfig, ServiceEntry};
//!
//! # #[tokio::main]
//! # async fn main() -> waypost::Result<()> {
//! let config = AdvertiseConfig {
//!     services: vec![ServiceEntry::new("search-api")],
//!     peers: vec![PeerConfig { host: "registry-a.internal".into(), port: 21300 }],
//!     ..AdvertiseConfig::default()
//! };
//!
//! let manager = AdvertiseManager::new(config)?;
//! manager.advertise()?; // returns immediately; loops run in the background
//!
//! // ... at process shutdown:
//! manager.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! The transport is a trait seam ([`Transport`]); the default implementation
//! POSTs the JSON payload over HTTP. Tests (and embedders with their own RPC
//! stack) supply a different implementation via
//! [`AdvertiseManager::with_transport`].

pub mod backoff;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod jitter;
pub mod manager;
pub mod transport;
pub mod types;

pub use config::{AdvertiseConfig, PeerConfig};
pub use error::{Result, WaypostError};
pub use manager::AdvertiseManager;
pub use transport::{HttpTransport, Transport};
pub use types::{
    AdvertiseRequest, AdvertiseResponse, AdvertiseStatus, PeerAddr, PeerStatusSnapshot,
    ServiceEntry,
};

use once_cell::sync::OnceCell;
use std::sync::Arc;

static GLOBAL_ADVERTISE_MANAGER: OnceCell<Arc<AdvertiseManager>> = OnceCell::new();

/// Set the global advertise manager (called once during process startup).
pub fn set_global_manager(manager: Arc<AdvertiseManager>) {
    let _ = GLOBAL_ADVERTISE_MANAGER.set(manager);
}

/// Get the global advertise manager if advertising is enabled.
pub fn get_global_manager() -> Option<Arc<AdvertiseManager>> {
    GLOBAL_ADVERTISE_MANAGER.get().map(Arc::clone)
}
