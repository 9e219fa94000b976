//! Outgoing message delivery

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tally_types::{Message, NodeId};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, error, warn};

/// Sends framed JSON messages to roster peers over short-lived
/// connections, after a fixed one-way delay that simulates WAN latency.
///
/// Sends are fire-and-forget: a refused connection means the peer is down
/// and is silently ignored; any other transport error is logged and the
/// message dropped. While the local peer is marked failed, nothing leaves
/// this messenger: the flag is checked at submission, before the delay
/// sleep, and again after it.
#[derive(Clone)]
pub struct Messenger {
    local: NodeId,
    peers: Arc<BTreeMap<NodeId, SocketAddr>>,
    delay: Duration,
    failed: Arc<RwLock<bool>>,
}

impl Messenger {
    /// New messenger for `local`, given the roster's addresses.
    pub fn new(
        local: NodeId,
        peers: Arc<BTreeMap<NodeId, SocketAddr>>,
        delay: Duration,
        failed: Arc<RwLock<bool>>,
    ) -> Self {
        Self {
            local,
            peers,
            delay,
            failed,
        }
    }

    /// Queue one message to `target`.
    pub fn send(&self, target: NodeId, msg: &Message) {
        if *self.failed.read() {
            return;
        }
        let Some(addr) = self.peers.get(&target).copied() else {
            warn!(node = %self.local, %target, "unknown send target");
            return;
        };
        let payload = match serde_json::to_string(msg) {
            Ok(payload) => payload,
            Err(e) => {
                error!(node = %self.local, error = %e, "message serialization failed");
                return;
            }
        };

        let kind = msg.kind();
        let local = self.local;
        let delay = self.delay;
        let failed = self.failed.clone();
        tokio::spawn(async move {
            if *failed.read() {
                return;
            }
            tokio::time::sleep(delay).await;
            if *failed.read() {
                return;
            }
            match TcpStream::connect(addr).await {
                Ok(mut stream) => {
                    if let Err(e) = stream.write_all(payload.as_bytes()).await {
                        warn!(node = %local, %target, kind, error = %e, "send failed");
                        return;
                    }
                    let _ = stream.shutdown().await;
                    debug!(node = %local, %target, kind, "sent");
                }
                Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                    // Peer presumed down.
                }
                Err(e) => {
                    warn!(node = %local, %target, kind, error = %e, "connect failed");
                }
            }
        });
    }

    /// Queue one message to every roster peer except the local one.
    pub fn broadcast(&self, msg: &Message) {
        for target in self.peers.keys() {
            if *target != self.local {
                self.send(*target, msg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn_listener;
    use tokio::net::TcpListener;
    use tokio::sync::{mpsc, watch};

    fn n(id: u32) -> NodeId {
        NodeId::new(id)
    }

    fn live_flag() -> Arc<RwLock<bool>> {
        Arc::new(RwLock::new(false))
    }

    async fn endpoint(
        failed: Arc<RwLock<bool>>,
    ) -> (SocketAddr, mpsc::Receiver<Message>, watch::Sender<bool>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel(64);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        spawn_listener(listener, failed, tx, shutdown_rx);
        (addr, rx, shutdown_tx)
    }

    fn ping(from: u32) -> Message {
        Message::RequestBlockchain {
            sender: n(from),
            my_depth: 0,
        }
    }

    #[tokio::test]
    async fn test_send_delivers_after_delay() {
        let (addr, mut rx, _guard) = endpoint(live_flag()).await;
        let peers = Arc::new(BTreeMap::from([(n(2), addr)]));
        let messenger = Messenger::new(n(1), peers, Duration::from_millis(20), live_flag());

        messenger.send(n(2), &ping(1));
        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.sender(), n(1));
        assert_eq!(msg.kind(), "REQUEST_BLOCKCHAIN");
    }

    #[tokio::test]
    async fn test_broadcast_skips_self() {
        let (self_addr, mut self_rx, _g1) = endpoint(live_flag()).await;
        let (peer_addr, mut peer_rx, _g2) = endpoint(live_flag()).await;
        let peers = Arc::new(BTreeMap::from([(n(1), self_addr), (n(2), peer_addr)]));
        let messenger = Messenger::new(n(1), peers, Duration::from_millis(10), live_flag());

        messenger.broadcast(&ping(1));

        let msg = tokio::time::timeout(Duration::from_secs(2), peer_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.sender(), n(1));

        // Nothing loops back to the local endpoint.
        let nothing =
            tokio::time::timeout(Duration::from_millis(100), self_rx.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_failed_sender_drops_outgoing() {
        let (addr, mut rx, _guard) = endpoint(live_flag()).await;
        let peers = Arc::new(BTreeMap::from([(n(2), addr)]));
        let failed = Arc::new(RwLock::new(true));
        let messenger = Messenger::new(n(1), peers, Duration::from_millis(5), failed);

        messenger.send(n(2), &ping(1));
        let nothing = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_failure_during_delay_drops_send() {
        let (addr, mut rx, _guard) = endpoint(live_flag()).await;
        let peers = Arc::new(BTreeMap::from([(n(2), addr)]));
        let failed = live_flag();
        let messenger =
            Messenger::new(n(1), peers, Duration::from_millis(150), failed.clone());

        messenger.send(n(2), &ping(1));
        // Fail while the send is sleeping.
        tokio::time::sleep(Duration::from_millis(30)).await;
        *failed.write() = true;

        let nothing = tokio::time::timeout(Duration::from_millis(400), rx.recv()).await;
        assert!(nothing.is_err());
    }

    #[tokio::test]
    async fn test_refused_connection_is_silent() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let peers = Arc::new(BTreeMap::from([(n(2), addr)]));
        let messenger = Messenger::new(n(1), peers, Duration::from_millis(5), live_flag());
        messenger.send(n(2), &ping(1));
        // Nothing to assert beyond "does not panic"; give the task time.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_unknown_target_is_dropped() {
        let peers = Arc::new(BTreeMap::new());
        let messenger = Messenger::new(n(1), peers, Duration::from_millis(5), live_flag());
        messenger.send(n(9), &ping(1));
    }
}
