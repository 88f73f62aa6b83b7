//! Waiting for a DB server to be discovered.

use crate::protocol::config::DiscoveryConfig;
use crate::protocol::error::ExchangeError;
use std::net::IpAddr;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Shared list of candidate DB server addresses.
///
/// Some other component (a beacon listener, a static list) fills it; the
/// exchange only reads the head. Clones share the same list.
#[derive(Clone, Debug, Default)]
pub struct PeerDirectory {
    peers: Arc<RwLock<Vec<IpAddr>>>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_peers(peers: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            peers: Arc::new(RwLock::new(peers.into_iter().collect())),
        }
    }

    /// Add a peer unless it is already listed.
    pub fn add(&self, peer: IpAddr) {
        let mut peers = self.peers.write().unwrap_or_else(PoisonError::into_inner);
        if !peers.contains(&peer) {
            peers.push(peer);
        }
    }

    pub fn first(&self) -> Option<IpAddr> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .first()
            .copied()
    }

    pub fn len(&self) -> usize {
        self.peers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Poll `directory` until it lists a peer.
///
/// Checks once immediately, then once after each of up to
/// `policy.max_tries` sleeps of `policy.interval()`.
pub async fn wait_for_peer(
    directory: &PeerDirectory,
    policy: &DiscoveryConfig,
) -> Result<IpAddr, ExchangeError> {
    info!("looking for available DB servers");
    let mut tries = 0;
    loop {
        if let Some(peer) = directory.first() {
            info!(%peer, tries, "found a DB server");
            return Ok(peer);
        }
        if tries >= policy.max_tries {
            warn!(tries, "no DB server found in reasonable time");
            return Err(ExchangeError::DiscoveryTimeout { tries });
        }
        tries += 1;
        debug!(tries, "no DB server yet");
        tokio::time::sleep(policy.interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    const HOST_A: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const HOST_B: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    fn policy(max_tries: u32) -> DiscoveryConfig {
        DiscoveryConfig {
            max_tries,
            interval_ms: 1000,
        }
    }

    #[test]
    fn directory_keeps_insertion_order_without_duplicates() {
        let directory = PeerDirectory::new();
        directory.add(HOST_A);
        directory.add(HOST_B);
        directory.add(HOST_A);

        assert_eq!(directory.len(), 2);
        assert_eq!(directory.first(), Some(HOST_A));
    }

    #[tokio::test(start_paused = true)]
    async fn known_peer_is_returned_immediately() {
        let directory = PeerDirectory::from_peers([HOST_A]);
        let started = tokio::time::Instant::now();

        assert_eq!(wait_for_peer(&directory, &policy(3)).await.unwrap(), HOST_A);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_directory_times_out_after_budget() {
        let directory = PeerDirectory::new();
        let started = tokio::time::Instant::now();

        let err = wait_for_peer(&directory, &policy(3)).await.unwrap_err();

        assert!(matches!(err, ExchangeError::DiscoveryTimeout { tries: 3 }));
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn peer_added_concurrently_is_picked_up() {
        let directory = PeerDirectory::new();
        let writer = directory.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            writer.add(HOST_B);
        });

        let peer = wait_for_peer(&directory, &policy(10)).await.unwrap();

        assert_eq!(peer, HOST_B);
    }
}
