use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use crate::error::{Result, WaypostError};

/// One locally-hosted service with its advertised routing cost.
///
/// Cost is an opaque weight forwarded to the registry; `0` (the default)
/// means "no preference" in the hyperbahn convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub service_name: String,
    #[serde(default)]
    pub cost: i32,
}

impl ServiceEntry {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            cost: 0,
        }
    }

    pub fn with_cost(service_name: impl Into<String>, cost: i32) -> Self {
        Self {
            service_name: service_name.into(),
            cost,
        }
    }
}

/// Registration payload sent to a registry peer.
///
/// Built fresh for every attempt so the payload always reflects the service
/// set at the moment the request is constructed, not at loop start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertiseRequest {
    pub services: Vec<ServiceEntry>,
}

impl AdvertiseRequest {
    /// Snapshot the given service set into a request.
    pub fn build(services: &[ServiceEntry]) -> Self {
        Self {
            services: services.to_vec(),
        }
    }
}

/// Acknowledgment body returned by the registry on a successful advertise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertiseResponse {
    /// Number of registry-side connections tracking this node.
    #[serde(default)]
    pub connection_count: u32,
}

/// A registry peer endpoint, resolved once at manager build time.
///
/// Identity is `(host, port)`; exactly one heartbeat loop runs per peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddr {
    pub host: IpAddr,
    pub port: u16,
}

impl PeerAddr {
    /// Resolve a configured `host:port` pair to a concrete address.
    ///
    /// Resolution happens here, at construction, so a bad hostname is a
    /// [`WaypostError::Config`] before any loop starts rather than a
    /// per-attempt failure.
    pub fn resolve(host: &str, port: u16) -> Result<Self> {
        let mut addrs = (host, port).to_socket_addrs().map_err(|e| {
            WaypostError::Config(format!("cannot resolve registry peer {}:{}: {}", host, port, e))
        })?;
        let addr = addrs.next().ok_or_else(|| {
            WaypostError::Config(format!(
                "registry peer {}:{} resolved to no addresses",
                host, port
            ))
        })?;
        Ok(Self {
            host: addr.ip(),
            port: addr.port(),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.socket_addr().fmt(f)
    }
}

/// Per-peer counters as reported by [`crate::manager::AdvertiseManager::status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerStatusSnapshot {
    pub peer: String,
    pub attempts: u64,
    pub consecutive_failures: u32,
    /// Unix timestamp (seconds) of the last successful advertise, 0 if never.
    pub last_success: u64,
}

/// Point-in-time view of the whole advertising subsystem, for monitoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertiseStatus {
    pub node_id: String,
    pub started: bool,
    pub peer_count: usize,
    pub peers: Vec<PeerStatusSnapshot>,
}
