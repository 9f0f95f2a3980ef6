//! Small newtype wrappers for primitive wire fields shared across messages.

use std::io;

use chainidx_chain::serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError};

/// The protocol version number exchanged during the `version` handshake.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct ProtocolVersion(pub u32);

impl BitcoinSerialize for ProtocolVersion {
    fn bitcoin_serialize<W: io::Write>(&self, target: W) -> Result<(), io::Error> {
        self.0.bitcoin_serialize(target)
    }
}

impl BitcoinDeserialize for ProtocolVersion {
    fn bitcoin_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError> {
        Ok(ProtocolVersion(u32::bitcoin_deserialize(reader)?))
    }
}

/// A nonce used to detect self-connections during the handshake, and to
/// match `pong` replies to the `ping` that triggered them.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Nonce(pub u64);

impl BitcoinSerialize for Nonce {
    fn bitcoin_serialize<W: io::Write>(&self, target: W) -> Result<(), io::Error> {
        self.0.bitcoin_serialize(target)
    }
}

impl BitcoinDeserialize for Nonce {
    fn bitcoin_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError> {
        Ok(Nonce(u64::bitcoin_deserialize(reader)?))
    }
}

impl Nonce {
    pub fn random() -> Nonce {
        Nonce(rand::random())
    }
}

/// The service bits a peer advertises in its `version` message.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PeerServices(pub u64);

impl PeerServices {
    pub const NODE_NONE: PeerServices = PeerServices(0);
    pub const NODE_NETWORK: PeerServices = PeerServices(1 << 0);
    pub const NODE_WITNESS: PeerServices = PeerServices(1 << 3);

    pub fn contains(&self, other: PeerServices) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for PeerServices {
    type Output = PeerServices;
    fn bitor(self, rhs: PeerServices) -> PeerServices {
        PeerServices(self.0 | rhs.0)
    }
}

impl BitcoinSerialize for PeerServices {
    fn bitcoin_serialize<W: io::Write>(&self, target: W) -> Result<(), io::Error> {
        self.0.bitcoin_serialize(target)
    }
}

impl BitcoinDeserialize for PeerServices {
    fn bitcoin_deserialize<R: io::Read>(reader: R) -> Result<Self, SerializationError> {
        Ok(PeerServices(u64::bitcoin_deserialize(reader)?))
    }
}

/// The 4-byte magic that opens every message on a given network.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Magic(pub [u8; 4]);

impl std::fmt::Debug for Magic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_tuple("Magic").field(&hex::encode(&self.0)).finish()
    }
}
