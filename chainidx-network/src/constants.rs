//! Fixed protocol knobs: the handshake version, advertised services, and
//! the trickle interval the request driver paces itself against.

use std::time::Duration;

use crate::types::{PeerServices, ProtocolVersion};

/// The protocol version this indexer speaks. Chosen high enough that peers
/// negotiate witness-aware `getdata`/`inv` behavior (BIP144) when both sides
/// advertise `NODE_WITNESS`.
pub const CURRENT_VERSION: ProtocolVersion = ProtocolVersion(70015);

/// The lowest protocol version this indexer accepts from a peer.
pub const MIN_PEER_VERSION: ProtocolVersion = ProtocolVersion(70001);

/// Our advertised user agent, following the BIP14 `/Name:Version/` convention.
pub const USER_AGENT: &str = "/chainidx:0.1.0/";

/// How often the peer driver flushes queued outbound messages. Named for the
/// same anti-fingerprinting/traffic-shaping role it plays in Bitcoin Core.
pub const TRICKLE_INTERVAL: Duration = Duration::from_secs(10);

/// Services we advertise in our own `version` message: a full archival node
/// that also serves SegWit witness data.
pub fn our_services() -> PeerServices {
    PeerServices::NODE_NETWORK | PeerServices::NODE_WITNESS
}
