use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;

use crate::backoff::BackoffPolicy;
use crate::error::WaypostError;
use crate::transport::Transport;
use crate::types::{AdvertiseRequest, PeerAddr, PeerStatusSnapshot, ServiceEntry};

/// Live counters for one peer's heartbeat loop.
///
/// The loop is the only writer; the manager reads them for `status()`. The
/// authoritative failure counter lives on the loop's stack; these atomics
/// are an observability mirror, never an input to scheduling.
#[derive(Debug, Default)]
pub struct PeerStats {
    pub attempts: AtomicU64,
    pub consecutive_failures: AtomicU32,
    pub last_success: AtomicU64, // unix seconds, 0 = never advertised
}

impl PeerStats {
    pub fn snapshot(&self, peer: &PeerAddr) -> PeerStatusSnapshot {
        PeerStatusSnapshot {
            peer: peer.to_string(),
            attempts: self.attempts.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            last_success: self.last_success.load(Ordering::Relaxed),
        }
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// One peer's infinite advertise/retry cycle.
///
/// Each cycle builds a fresh request from the current service snapshot,
/// issues exactly one bounded call, then sleeps: a fuzzed steady-state
/// interval after success, a jittered exponential-backoff window after
/// failure. No attempt outcome is fatal; only the shutdown signal ends the
/// loop.
pub(crate) struct HeartbeatLoop {
    pub(crate) peer: PeerAddr,
    pub(crate) services: Arc<RwLock<Arc<Vec<ServiceEntry>>>>,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) policy: BackoffPolicy,
    pub(crate) response_wait: Duration,
    pub(crate) stats: Arc<PeerStats>,
    pub(crate) shutdown: watch::Receiver<bool>,
}

impl HeartbeatLoop {
    pub(crate) async fn run(self) {
        let HeartbeatLoop {
            peer,
            services,
            transport,
            policy,
            response_wait,
            stats,
            mut shutdown,
        } = self;

        let mut consecutive_failures: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let snapshot = services
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            let request = AdvertiseRequest::build(&snapshot);
            stats.attempts.fetch_add(1, Ordering::Relaxed);

            let call = tokio::select! {
                res = tokio::time::timeout(response_wait, transport.advertise(&peer, &request)) => Some(res),
                _ = shutdown.changed() => None,
            };
            let Some(call) = call else { break };

            let outcome = match call {
                Ok(inner) => inner,
                Err(_) => Err(WaypostError::ResponseTimeout(peer.to_string())),
            };

            let sleep_for = match outcome {
                Ok(resp) => {
                    consecutive_failures = 0;
                    stats.consecutive_failures.store(0, Ordering::Relaxed);
                    stats.last_success.store(unix_now(), Ordering::Relaxed);

                    let delay = policy.next_advertise_delay();
                    tracing::info!(
                        "[ADV {}] advertised {} services (connections: {}), next in {:?}",
                        peer,
                        request.services.len(),
                        resp.connection_count,
                        delay
                    );
                    delay
                }
                Err(e) => {
                    // Delay is drawn from the window for the pre-increment
                    // count: the first failure retries within 2^0 * base.
                    let delay = policy.next_retry_delay(consecutive_failures);
                    consecutive_failures += 1;
                    stats
                        .consecutive_failures
                        .store(consecutive_failures, Ordering::Relaxed);

                    tracing::warn!(
                        "[ADV {}] advertise failed ({}), {} consecutive failures, retry in {:?}",
                        peer,
                        e,
                        consecutive_failures,
                        delay
                    );
                    delay
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = shutdown.changed() => break,
            }
        }

        tracing::info!("[ADV {}] heartbeat loop stopped", peer);
    }
}
