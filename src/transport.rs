use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Result, WaypostError};
use crate::types::{AdvertiseRequest, AdvertiseResponse, PeerAddr};

/// The collaborator seam: "send one advertise request to this peer and tell
/// me how it went."
///
/// The heartbeat loop bounds every call with its own response wait, so
/// implementations do not need to guarantee timely returns. The default
/// HTTP transport still carries a client-level timeout so abandoned calls
/// do not hold connections open.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn advertise(
        &self,
        peer: &PeerAddr,
        request: &AdvertiseRequest,
    ) -> Result<AdvertiseResponse>;
}

/// HTTP/JSON transport: POSTs the request to
/// `http://{peer}/{registry_service}/advertise`.
pub struct HttpTransport {
    registry_service: String,
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(registry_service: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            registry_service: registry_service.into(),
            http_client,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn advertise(
        &self,
        peer: &PeerAddr,
        request: &AdvertiseRequest,
    ) -> Result<AdvertiseResponse> {
        let url = format!("http://{}/{}/advertise", peer, self.registry_service);

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| WaypostError::Transport {
                peer: peer.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(WaypostError::Rejected {
                peer: peer.to_string(),
                status: response.status().as_u16(),
            });
        }

        let resp: AdvertiseResponse =
            response.json().await.map_err(|e| WaypostError::Transport {
                peer: peer.to_string(),
                message: format!("invalid response body: {}", e),
            })?;

        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_creation() {
        // Just exercises the builder path; no network involved.
        let _ = HttpTransport::new("hyperbahn", Duration::from_secs(1));
    }
}
