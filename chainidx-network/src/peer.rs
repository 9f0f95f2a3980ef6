//! A single outbound connection to a remote Bitcoin-family node.
//!
//! `Peer` owns the TCP socket, performs the version/verack handshake, and
//! then runs a reader task that auto-answers `ping` and auto-requests
//! `getdata` for every block `inv` entry, forwarding everything else (block,
//! tx, and the inv itself) to a caller-registered handler.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tokio_util::codec::Framed;
use tracing::{debug, trace, warn};

use chainidx_chain::{block, parameters::ChainParams};

use crate::constants;
use crate::error::{ConnectError, PeerError};
use crate::protocol::external::{Codec, GetBlocks, InventoryHash, Message, Version};
use crate::types::Nonce;

/// A per-message callback the reader task invokes for every decoded message,
/// after any built-in handling (auto-pong, auto-getdata) has run.
pub type MessageHandler = Arc<dyn Fn(Message) + Send + Sync + 'static>;

struct Shared {
    connected: AtomicBool,
    disconnect: Notify,
    handler: Mutex<Option<MessageHandler>>,
}

/// A connection to one remote peer.
pub struct Peer {
    addr: SocketAddr,
    chain_params: ChainParams,
    outbound: mpsc::UnboundedSender<Message>,
    shared: Arc<Shared>,
}

impl Peer {
    /// Dials `addr` and performs the version/verack handshake.
    ///
    /// The peer driver doesn't track chain height itself (the sync manager
    /// does, via locators), so the `best_block` advertised in our `version`
    /// message is always genesis; real nodes tolerate a stale announced
    /// height here and rely on `getblocks` locators for actual sync state.
    pub async fn connect(addr: SocketAddr, chain_params: ChainParams) -> Result<Peer, ConnectError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| ConnectError::Dial(addr, e))?;
        let codec = Codec::builder().for_magic(chain_params.magic).finish();
        let mut framed = Framed::new(stream, codec);

        let unroutable = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 0);
        let our_version = Version::new(
            constants::CURRENT_VERSION,
            addr,
            crate::types::PeerServices::NODE_NONE,
            constants::our_services(),
            unroutable,
            Nonce::random(),
            constants::USER_AGENT.to_owned(),
            block::Height::GENESIS,
            true,
        );
        framed
            .send(Message::Version(our_version))
            .await
            .map_err(|e| ConnectError::Handshake(PeerError::Malformed(e)))?;

        let mut seen_version = false;
        let mut seen_verack = false;
        while !seen_version || !seen_verack {
            match framed.next().await {
                Some(Ok(Message::Version(theirs))) => {
                    if theirs.version < constants::MIN_PEER_VERSION {
                        return Err(ConnectError::ProtocolVersionTooLow(theirs.version));
                    }
                    seen_version = true;
                    framed
                        .send(Message::Verack)
                        .await
                        .map_err(|e| ConnectError::Handshake(PeerError::Malformed(e)))?;
                }
                Some(Ok(Message::Verack)) => seen_verack = true,
                Some(Ok(_other)) => {
                    return Err(ConnectError::Handshake(
                        PeerError::UnexpectedDuringHandshake("expected version/verack"),
                    ))
                }
                Some(Err(e)) => return Err(ConnectError::Handshake(PeerError::Malformed(e))),
                None => return Err(ConnectError::Handshake(PeerError::ConnectionClosed)),
            }
        }

        debug!(%addr, "handshake complete");

        let (sink, mut stream) = framed.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

        let shared = Arc::new(Shared {
            connected: AtomicBool::new(true),
            disconnect: Notify::new(),
            handler: Mutex::new(None),
        });

        // Writer task: drains the outbound queue onto the socket.
        tokio::spawn({
            let mut sink = sink;
            async move {
                while let Some(msg) = outbound_rx.recv().await {
                    if sink.send(msg).await.is_err() {
                        break;
                    }
                }
            }
        });

        // Reader task: decodes messages, answers pings and inv announcements
        // inline, and forwards everything to the registered handler.
        tokio::spawn({
            let shared = Arc::clone(&shared);
            let outbound_tx = outbound_tx.clone();
            async move {
                loop {
                    match stream.next().await {
                        Some(Ok(msg)) => {
                            trace!(%msg, "received message");
                            match &msg {
                                Message::Ping(nonce) => {
                                    let _ = outbound_tx.send(Message::Pong(*nonce));
                                }
                                Message::Inv(items) => {
                                    let block_items: Vec<InventoryHash> = items
                                        .iter()
                                        .copied()
                                        .filter(|i| matches!(i, InventoryHash::Block(_)))
                                        .collect();
                                    if !block_items.is_empty() {
                                        let _ =
                                            outbound_tx.send(Message::GetData(block_items));
                                    }
                                }
                                _ => {}
                            }
                            let handler = shared.handler.lock().unwrap().clone();
                            if let Some(handler) = handler {
                                handler(msg);
                            }
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "peer connection error, disconnecting");
                            break;
                        }
                        None => {
                            debug!("peer closed the connection");
                            break;
                        }
                    }
                }
                shared.connected.store(false, Ordering::SeqCst);
                shared.disconnect.notify_waiters();
            }
        });

        Ok(Peer {
            addr,
            chain_params,
            outbound: outbound_tx,
            shared,
        })
    }

    /// Sends a `getblocks` request built from the given locator and stop hash.
    pub fn push_get_blocks(&self, locator: Vec<block::Hash>, stop_hash: Option<block::Hash>) {
        let _ = self
            .outbound
            .send(Message::GetBlocks(GetBlocks::new(locator, stop_hash)));
    }

    /// Registers a callback invoked for every message the reader task
    /// decodes, after any built-in handling (auto-pong, auto-getdata) runs.
    /// Replaces any previously registered handler.
    pub fn on_message<F>(&self, handler: F)
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        *self.shared.handler.lock().unwrap() = Some(Arc::new(handler));
    }

    /// Resolves once the connection has been torn down.
    pub async fn wait_for_disconnect(&self) {
        loop {
            if !self.connected() {
                return;
            }
            self.shared.disconnect.notified().await;
        }
    }

    /// Dials a fresh connection to the same address and chain, repeating the
    /// handshake. Does not reuse any state from this connection.
    pub async fn reconnect(&self) -> Result<Peer, ConnectError> {
        Peer::connect(self.addr, self.chain_params.clone()).await
    }

    pub fn connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }
}
