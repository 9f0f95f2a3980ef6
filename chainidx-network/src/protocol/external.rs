//! The wire-level Bitcoin message protocol: commands, message bodies, and
//! the [`Codec`] that frames them onto a byte stream.

/// A single byte enum representing a Bitcoin message type.
mod command;
/// A Tokio codec that transforms an `AsyncRead` into a `Stream` of `Message`s.
pub mod codec;
/// Inventory items.
mod inv;
/// An enum of all supported Bitcoin message types.
mod message;

pub use codec::Codec;
pub use command::Command;
pub use inv::InventoryHash;
pub use message::{GetBlocks, Message, Version};
