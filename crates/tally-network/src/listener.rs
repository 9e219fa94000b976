//! Inbound connection handling

use parking_lot::RwLock;
use std::sync::Arc;
use tally_types::Message;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Spawn the accept loop on an already-bound listener.
///
/// Every connection carries one JSON message, read until the peer closes.
/// While the failed flag is set, connections are closed without reading.
/// Malformed payloads are logged and dropped. The loop ends when
/// `shutdown` flips to true or the driver side of `inbound` goes away.
pub fn spawn_listener(
    listener: TcpListener,
    failed: Arc<RwLock<bool>>,
    inbound: mpsc::Sender<Message>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let (mut stream, addr) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                },
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("listener shutting down");
                        return;
                    }
                    continue;
                }
            };

            if *failed.read() {
                // Simulated crash: refuse to even read.
                drop(stream);
                continue;
            }

            let inbound = inbound.clone();
            tokio::spawn(async move {
                let mut body = String::new();
                if let Err(e) = stream.read_to_string(&mut body).await {
                    warn!(%addr, error = %e, "read failed");
                    return;
                }
                if body.trim().is_empty() {
                    return;
                }
                match serde_json::from_str::<Message>(&body) {
                    Ok(msg) => {
                        debug!(%addr, kind = msg.kind(), sender = %msg.sender(), "received");
                        let _ = inbound.send(msg).await;
                    }
                    Err(e) => {
                        warn!(%addr, error = %e, "invalid message payload");
                    }
                }
            });
        }
    })
}
