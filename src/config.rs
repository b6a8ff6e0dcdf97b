use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::ServiceEntry;

pub const DEFAULT_ADVERTISE_INTERVAL_MS: u64 = 50_000;
pub const DEFAULT_FUZZ_INTERVAL_MS: u64 = 20_000;
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_MAX_RETRY_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_RESPONSE_WAIT_MS: u64 = 1_000;
pub const DEFAULT_REGISTRY_SERVICE: &str = "hyperbahn";

/// One registry peer endpoint as configured (unresolved).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerConfig {
    pub host: String, // e.g. "10.0.1.2" or "registry-a.internal"
    pub port: u16,
}

/// Full configuration for the advertising subsystem.
///
/// All timing fields are milliseconds. The defaults follow the hyperbahn
/// client convention: re-advertise every 50s plus up to 20s of fuzz, retry
/// from a 1s base window, and wait at most 1s for any single response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvertiseConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    /// Well-known service name the registry listens under.
    #[serde(default = "default_registry_service")]
    pub registry_service: String,
    /// Services advertised on behalf of this node.
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
    /// Registry peers; one heartbeat loop runs per entry.
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
    #[serde(default = "default_advertise_interval_ms")]
    pub advertise_interval_ms: u64,
    #[serde(default = "default_fuzz_interval_ms")]
    pub fuzz_interval_ms: u64,
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// Backoff ceiling: no retry window ever exceeds this.
    #[serde(default = "default_max_retry_interval_ms")]
    pub max_retry_interval_ms: u64,
    #[serde(default = "default_response_wait_ms")]
    pub response_wait_ms: u64,
}

fn default_node_id() -> String {
    std::env::var("WAYPOST_NODE_ID").unwrap_or_else(|_| {
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string())
    })
}

fn default_registry_service() -> String {
    DEFAULT_REGISTRY_SERVICE.to_string()
}

fn default_advertise_interval_ms() -> u64 {
    DEFAULT_ADVERTISE_INTERVAL_MS
}

fn default_fuzz_interval_ms() -> u64 {
    DEFAULT_FUZZ_INTERVAL_MS
}

fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL_MS
}

fn default_max_retry_interval_ms() -> u64 {
    DEFAULT_MAX_RETRY_INTERVAL_MS
}

fn default_response_wait_ms() -> u64 {
    DEFAULT_RESPONSE_WAIT_MS
}

impl Default for AdvertiseConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            registry_service: default_registry_service(),
            services: Vec::new(),
            peers: Vec::new(),
            advertise_interval_ms: DEFAULT_ADVERTISE_INTERVAL_MS,
            fuzz_interval_ms: DEFAULT_FUZZ_INTERVAL_MS,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            max_retry_interval_ms: DEFAULT_MAX_RETRY_INTERVAL_MS,
            response_wait_ms: DEFAULT_RESPONSE_WAIT_MS,
        }
    }
}

impl AdvertiseConfig {
    /// Load configuration from `{data_dir}/waypost.json` or return defaults.
    ///
    /// When no service list is configured, the node advertises itself under
    /// its own `node_id`.
    pub fn load_or_default(data_dir: &Path) -> Self {
        let waypost_json = data_dir.join("waypost.json");

        let mut config = if waypost_json.exists() {
            match std::fs::read_to_string(&waypost_json) {
                Ok(content) => match serde_json::from_str::<AdvertiseConfig>(&content) {
                    Ok(config) => {
                        tracing::info!(
                            "Loaded advertise config: node_id={}, services={}, peers={}",
                            config.node_id,
                            config.services.len(),
                            config.peers.len()
                        );
                        config
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse waypost.json: {}, using defaults", e);
                        AdvertiseConfig::default()
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to read waypost.json: {}, using defaults", e);
                    AdvertiseConfig::default()
                }
            }
        } else {
            tracing::info!("No waypost.json found, using default advertise config");
            AdvertiseConfig::default()
        };

        if config.services.is_empty() {
            config.services = vec![ServiceEntry::new(config.node_id.clone())];
        }

        config
    }

    pub fn advertise_interval(&self) -> Duration {
        Duration::from_millis(self.advertise_interval_ms)
    }

    pub fn fuzz_interval(&self) -> Duration {
        Duration::from_millis(self.fuzz_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn max_retry_interval(&self) -> Duration {
        Duration::from_millis(self.max_retry_interval_ms)
    }

    pub fn response_wait(&self) -> Duration {
        Duration::from_millis(self.response_wait_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_or_default_no_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = AdvertiseConfig::load_or_default(temp_dir.path());

        assert_eq!(config.peers.len(), 0);
        assert!(!config.node_id.is_empty());
        assert_eq!(config.advertise_interval_ms, 50_000);
        assert_eq!(config.response_wait_ms, 1_000);
        // Falls back to advertising the node itself
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.services[0].service_name, config.node_id);
    }

    #[test]
    fn test_load_or_default_valid_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let waypost_json_path = temp_dir.path().join("waypost.json");

        let config_str = r#"{
            "node_id": "test-node",
            "services": [
                {"serviceName": "search-api", "cost": 0}
            ],
            "peers": [
                {"host": "registry-a.internal", "port": 21300}
            ],
            "retry_interval_ms": 500
        }"#;

        let mut file = std::fs::File::create(&waypost_json_path).unwrap();
        file.write_all(config_str.as_bytes()).unwrap();

        let config = AdvertiseConfig::load_or_default(temp_dir.path());

        assert_eq!(config.node_id, "test-node");
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.services[0].service_name, "search-api");
        assert_eq!(config.peers.len(), 1);
        assert_eq!(config.peers[0].host, "registry-a.internal");
        assert_eq!(config.peers[0].port, 21300);
        // Overridden field takes effect, the rest stay at defaults
        assert_eq!(config.retry_interval_ms, 500);
        assert_eq!(config.fuzz_interval_ms, 20_000);
    }

    #[test]
    fn test_load_or_default_invalid_json() {
        let temp_dir = tempfile::tempdir().unwrap();
        let waypost_json_path = temp_dir.path().join("waypost.json");

        let mut file = std::fs::File::create(&waypost_json_path).unwrap();
        file.write_all(b"invalid json").unwrap();

        let config = AdvertiseConfig::load_or_default(temp_dir.path());

        // Falls back to defaults
        assert_eq!(config.peers.len(), 0);
        assert_eq!(config.advertise_interval_ms, 50_000);
    }
}
