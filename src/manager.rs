use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backoff::BackoffPolicy;
use crate::config::AdvertiseConfig;
use crate::error::{Result, WaypostError};
use crate::heartbeat::{HeartbeatLoop, PeerStats};
use crate::transport::{HttpTransport, Transport};
use crate::types::{AdvertiseStatus, PeerAddr, PeerStatusSnapshot, ServiceEntry};

/// Coordinates advertising to all configured registry peers.
///
/// Construction resolves and validates the peer list; [`advertise`] then
/// spawns one independent heartbeat loop per peer and returns immediately.
/// Loops never share scheduling state and run until [`shutdown`].
///
/// [`advertise`]: AdvertiseManager::advertise
/// [`shutdown`]: AdvertiseManager::shutdown
pub struct AdvertiseManager {
    config: AdvertiseConfig,
    peers: Vec<PeerAddr>,
    /// Current service set; swapped wholesale so loops only ever observe a
    /// complete snapshot.
    services: Arc<RwLock<Arc<Vec<ServiceEntry>>>>,
    transport: Arc<dyn Transport>,
    policy: BackoffPolicy,
    started: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    peer_stats: DashMap<String, Arc<PeerStats>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl AdvertiseManager {
    /// Build a manager using the default HTTP transport.
    pub fn new(config: AdvertiseConfig) -> Result<Arc<Self>> {
        let transport = Arc::new(HttpTransport::new(
            config.registry_service.clone(),
            config.response_wait(),
        ));
        Self::with_transport(config, transport)
    }

    /// Build a manager over a caller-supplied transport.
    pub fn with_transport(
        config: AdvertiseConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Arc<Self>> {
        if config.peers.is_empty() {
            return Err(WaypostError::Config(
                "registry peer list is empty".to_string(),
            ));
        }

        let peers = config
            .peers
            .iter()
            .map(|p| PeerAddr::resolve(&p.host, p.port))
            .collect::<Result<Vec<_>>>()?;

        let services = Arc::new(RwLock::new(Arc::new(config.services.clone())));
        let policy = BackoffPolicy::from_config(&config);
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Arc::new(Self {
            config,
            peers,
            services,
            transport,
            policy,
            started: AtomicBool::new(false),
            shutdown_tx,
            peer_stats: DashMap::new(),
            tasks: Mutex::new(Vec::new()),
        }))
    }

    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Start one heartbeat loop per configured peer and return immediately.
    ///
    /// Must be called within a Tokio runtime. One-shot: a second call
    /// returns [`WaypostError::AlreadyStarted`] instead of spawning
    /// duplicate loops.
    pub fn advertise(&self) -> Result<()> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WaypostError::AlreadyStarted);
        }

        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        for peer in &self.peers {
            let stats = Arc::new(PeerStats::default());
            self.peer_stats.insert(peer.to_string(), Arc::clone(&stats));

            let heartbeat = HeartbeatLoop {
                peer: *peer,
                services: Arc::clone(&self.services),
                transport: Arc::clone(&self.transport),
                policy: self.policy.clone(),
                response_wait: self.config.response_wait(),
                stats,
                shutdown: self.shutdown_tx.subscribe(),
            };

            tasks.push(tokio::spawn(heartbeat.run()));
            tracing::info!("[ADV] started heartbeat loop for peer {}", peer);
        }

        Ok(())
    }

    /// Stop all heartbeat loops and wait for in-flight attempts to settle.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);

        let handles: Vec<JoinHandle<()>> = {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            tasks.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }

        tracing::info!("[ADV] all heartbeat loops stopped");
    }

    /// Replace the advertised service set.
    ///
    /// Each loop picks the new snapshot up when it next builds a request; an
    /// attempt already in flight still carries the set it was built from.
    pub fn update_services(&self, services: Vec<ServiceEntry>) {
        let mut current = self.services.write().unwrap_or_else(|e| e.into_inner());
        *current = Arc::new(services);
    }

    /// Point-in-time counters for every peer, for monitoring endpoints.
    pub fn status(&self) -> AdvertiseStatus {
        let peers = self
            .peers
            .iter()
            .map(|peer| {
                self.peer_stats
                    .get(&peer.to_string())
                    .map(|stats| stats.snapshot(peer))
                    .unwrap_or_else(|| PeerStatusSnapshot {
                        peer: peer.to_string(),
                        attempts: 0,
                        consecutive_failures: 0,
                        last_success: 0,
                    })
            })
            .collect();

        AdvertiseStatus {
            node_id: self.config.node_id.clone(),
            started: self.started.load(Ordering::SeqCst),
            peer_count: self.peers.len(),
            peers,
        }
    }
}
