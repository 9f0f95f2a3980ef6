//! The P2P peer driver: a single outbound connection to a Bitcoin-family
//! node, the wire codec it speaks, and the message types that cross it.
//!
//! This crate deliberately knows nothing about chain state, reorgs, or
//! storage — it hands decoded messages to whatever handler its caller
//! registers via [`peer::Peer::on_message`] and otherwise just keeps the
//! socket alive (handshake, ping/pong, inv-to-getdata).

pub mod constants;
pub mod error;
pub mod peer;
pub mod protocol;
pub mod types;

pub use error::{ConnectError, PeerError};
pub use peer::Peer;
pub use protocol::external::{Command, GetBlocks, InventoryHash, Message, Version};
