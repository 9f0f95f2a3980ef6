//! Definitions of network messages.

use std::{fmt, sync::Arc};

use chainidx_chain::{
    block::{self, Block},
    transaction::Transaction,
};

use super::command::Command;
use super::inv::InventoryHash;
use crate::types::Nonce;

mod version;
pub use version::Version;

mod get_blocks;
pub use get_blocks::GetBlocks;

/// A Bitcoin network message.
///
/// The wire format of these messages is described on [the Bitcoin
/// wiki][btc_wiki_protocol]; this enum stores an internal representation
/// unlinked from that format. Bitcoin identifies messages by a 12-byte ascii
/// command string; this indexer treats that as a serialization detail and
/// uses the enum discriminant instead, via [`Message::command`].
///
/// Only the message subset this indexer's peer driver actually speaks is
/// represented here — `getdata`/`ping`/`pong` round out the handshake and
/// sync loop; everything else Bitcoin Core supports (filters, compact
/// blocks, headers-first sync, address gossip) is out of scope.
///
/// [btc_wiki_protocol]: https://en.bitcoin.it/wiki/Protocol_documentation
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Message {
    /// A `version` message, analogous to a TLS `ClientHello`; begins the
    /// handshake.
    ///
    /// [Bitcoin reference](https://en.bitcoin.it/wiki/Protocol_documentation#version)
    Version(Version),

    /// A `verack` message.
    ///
    /// [Bitcoin reference](https://en.bitcoin.it/wiki/Protocol_documentation#verack)
    Verack,

    /// A `ping` message.
    ///
    /// [Bitcoin reference](https://en.bitcoin.it/wiki/Protocol_documentation#ping)
    Ping(Nonce),

    /// A `pong` message, carrying the nonce from the `ping` it answers.
    ///
    /// [Bitcoin reference](https://en.bitcoin.it/wiki/Protocol_documentation#pong)
    Pong(Nonce),

    /// A `getblocks` message.
    ///
    /// `known_blocks` is a block locator: known hashes spaced out along the
    /// sender's best chain, used by the remote peer to find the common
    /// ancestor with its own chain. The peer replies with an `inv` of the
    /// blocks that follow.
    ///
    /// [Bitcoin reference](https://en.bitcoin.it/wiki/Protocol_documentation#getblocks)
    GetBlocks(GetBlocks),

    /// An `inv` message, advertising knowledge of one or more objects. Sent
    /// unsolicited or in reply to `getblocks`.
    ///
    /// [Bitcoin reference](https://en.bitcoin.it/wiki/Protocol_documentation#inv)
    Inv(Vec<InventoryHash>),

    /// A `getdata` message, requesting the content of specific objects
    /// previously advertised via `inv`.
    ///
    /// [Bitcoin reference](https://en.bitcoin.it/wiki/Protocol_documentation#getdata)
    GetData(Vec<InventoryHash>),

    /// A `block` message.
    ///
    /// [Bitcoin reference](https://en.bitcoin.it/wiki/Protocol_documentation#block)
    Block(Arc<Block>),

    /// A `tx` message.
    ///
    /// [Bitcoin reference](https://en.bitcoin.it/wiki/Protocol_documentation#tx)
    Tx(Arc<Transaction>),
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Message::Version { .. } => "version",
            Message::Verack => "verack",
            Message::Ping(_) => "ping",
            Message::Pong(_) => "pong",
            Message::GetBlocks { .. } => "getblocks",
            Message::Inv(_) => "inv",
            Message::GetData(_) => "getdata",
            Message::Block(_) => "block",
            Message::Tx(_) => "tx",
        })
    }
}

impl Message {
    pub fn command(&self) -> Command {
        match self {
            Message::Version { .. } => Command::Version,
            Message::Verack => Command::Verack,
            Message::Ping(_) => Command::Ping,
            Message::Pong(_) => Command::Pong,
            Message::GetBlocks { .. } => Command::GetBlocks,
            Message::Inv(_) => Command::Inv,
            Message::GetData(_) => Command::GetData,
            Message::Block(_) => Command::Block,
            Message::Tx(_) => Command::Tx,
        }
    }

    /// Convenience constructor for a block announcement.
    pub fn inv_block(hash: block::Hash) -> InventoryHash {
        InventoryHash::Block(hash)
    }
}
