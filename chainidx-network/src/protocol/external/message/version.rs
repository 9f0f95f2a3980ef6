use std::io;
use std::net::SocketAddr;

use chainidx_chain::{
    block,
    serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError},
};
use chrono::{DateTime, TimeZone, Utc};

use crate::types::{Nonce, PeerServices, ProtocolVersion};

/// A `version` message.
///
/// Note that although this is called `version` in Bitcoin, its role is really
/// analogous to a `ClientHello` message in TLS, used to begin a handshake, and
/// is distinct from a simple version number.
///
/// [Bitcoin reference](https://en.bitcoin.it/wiki/Protocol_documentation#version)
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Version {
    /// The network version number supported by the sender.
    pub version: ProtocolVersion,
    /// The network services advertised by the sender.
    pub services: PeerServices,
    /// The time when the version message was sent.
    pub timestamp: DateTime<Utc>,
    /// The network address of the node receiving this message, and its
    /// advertised network services.
    pub address_recv: (PeerServices, SocketAddr),
    /// The network address of the node sending this message, and its
    /// advertised network services.
    pub address_from: (PeerServices, SocketAddr),
    /// A random nonce, generated fresh for every `version` sent, used to
    /// detect self-connections.
    pub nonce: Nonce,
    /// The user agent advertised by the sender.
    pub user_agent: String,
    /// The last block height known by the sender.
    pub best_block: block::Height,
    /// Whether the remote peer should announce relayed transactions. See
    /// [BIP 0037](https://github.com/bitcoin/bips/blob/master/bip-0037.mediawiki).
    pub relay: bool,
}

impl Version {
    pub fn new(
        version: ProtocolVersion,
        their_addr: SocketAddr,
        their_services: PeerServices,
        our_services: PeerServices,
        our_addr: SocketAddr,
        nonce: Nonce,
        user_agent: String,
        best_block: block::Height,
        relay: bool,
    ) -> Version {
        // Truncate the timestamp to the nearest 5 minutes, which keeps us
        // within the range where Bitcoin Core tolerates clock skew.
        let now = Utc::now().timestamp();
        let timestamp = Utc.timestamp(now - now.rem_euclid(5 * 60), 0);
        Version {
            version,
            services: our_services,
            timestamp,
            address_recv: (their_services, their_addr),
            address_from: (our_services, our_addr),
            nonce,
            user_agent,
            best_block,
            relay,
        }
    }
}

impl BitcoinSerialize for Version {
    fn bitcoin_serialize<W: io::Write>(&self, mut target: W) -> Result<(), io::Error> {
        self.version.bitcoin_serialize(&mut target)?;
        self.services.bitcoin_serialize(&mut target)?;
        self.timestamp.bitcoin_serialize(&mut target)?;
        self.address_recv.bitcoin_serialize(&mut target)?;
        self.address_from.bitcoin_serialize(&mut target)?;
        self.nonce.bitcoin_serialize(&mut target)?;
        self.user_agent.bitcoin_serialize(&mut target)?;
        (self.best_block.0 as u32).bitcoin_serialize(&mut target)?;
        self.relay.bitcoin_serialize(&mut target)
    }
}

impl BitcoinDeserialize for Version {
    fn bitcoin_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(Version {
            version: ProtocolVersion::bitcoin_deserialize(&mut reader)?,
            services: PeerServices::bitcoin_deserialize(&mut reader)?,
            timestamp: DateTime::<Utc>::bitcoin_deserialize(&mut reader)?,
            address_recv: <(PeerServices, SocketAddr)>::bitcoin_deserialize(&mut reader)?,
            address_from: <(PeerServices, SocketAddr)>::bitcoin_deserialize(&mut reader)?,
            nonce: Nonce::bitcoin_deserialize(&mut reader)?,
            user_agent: String::bitcoin_deserialize(&mut reader)?,
            best_block: block::Height(u32::bitcoin_deserialize(&mut reader)? as u64),
            relay: bool::bitcoin_deserialize(&mut reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn version_roundtrips() {
        let services = PeerServices::NODE_NETWORK;
        let v = Version::new(
            crate::constants::CURRENT_VERSION,
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 6)), 8333),
            services,
            services,
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7)), 8333),
            Nonce(0x9082_4908_8927_9238),
            "Beaver".to_owned(),
            block::Height(540_000),
            true,
        );
        let bytes = v.bitcoin_serialize_to_vec().unwrap();
        let decoded = Version::bitcoin_deserialize(&bytes[..]).unwrap();
        assert_eq!(v, decoded);
    }
}
