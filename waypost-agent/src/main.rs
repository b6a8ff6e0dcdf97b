use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waypost::{AdvertiseConfig, AdvertiseManager, PeerConfig, ServiceEntry};

#[derive(Parser)]
#[command(name = "waypost")]
struct Cli {
    #[arg(long, env = "WAYPOST_DATA_DIR", default_value = "./data")]
    data_dir: String,
    /// Registry peer as host:port. Repeatable; overrides waypost.json.
    #[arg(long = "peer", value_parser = parse_peer)]
    peers: Vec<PeerConfig>,
    /// Service to advertise as name or name:cost. Repeatable; overrides waypost.json.
    #[arg(long = "service", value_parser = parse_service)]
    services: Vec<ServiceEntry>,
}

fn parse_peer(s: &str) -> Result<PeerConfig, String> {
    let (host, port) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected host:port, got '{}'", s))?;
    if host.is_empty() {
        return Err(format!("missing host in '{}'", s));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| format!("invalid port in '{}'", s))?;
    Ok(PeerConfig {
        host: host.to_string(),
        port,
    })
}

fn parse_service(s: &str) -> Result<ServiceEntry, String> {
    match s.rsplit_once(':') {
        Some((name, _)) if name.is_empty() => Err("service name must not be empty".to_string()),
        Some((name, cost)) => {
            let cost: i32 = cost
                .parse()
                .map_err(|_| format!("invalid cost in '{}'", s))?;
            Ok(ServiceEntry::with_cost(name, cost))
        }
        None if s.is_empty() => Err("service name must not be empty".to_string()),
        None => Ok(ServiceEntry::new(s)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = AdvertiseConfig::load_or_default(std::path::Path::new(&cli.data_dir));
    if !cli.peers.is_empty() {
        config.peers = cli.peers;
    }
    if !cli.services.is_empty() {
        config.services = cli.services;
    }

    let manager = AdvertiseManager::new(config)?;
    waypost::set_global_manager(Arc::clone(&manager));
    manager.advertise()?;

    tracing::info!(
        "waypost agent running: node_id={}, peers={}",
        manager.node_id(),
        manager.peer_count()
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    manager.shutdown().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_peer() {
        let peer = parse_peer("registry-a.internal:21300").unwrap();
        assert_eq!(peer.host, "registry-a.internal");
        assert_eq!(peer.port, 21300);

        assert!(parse_peer("no-port").is_err());
        assert!(parse_peer(":21300").is_err());
        assert!(parse_peer("host:notaport").is_err());
    }

    #[test]
    fn test_parse_service() {
        let plain = parse_service("search-api").unwrap();
        assert_eq!(plain.service_name, "search-api");
        assert_eq!(plain.cost, 0);

        let weighted = parse_service("search-api:5").unwrap();
        assert_eq!(weighted.service_name, "search-api");
        assert_eq!(weighted.cost, 5);

        assert!(parse_service("").is_err());
        assert!(parse_service("search-api:x").is_err());
    }
}
