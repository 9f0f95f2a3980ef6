//! Per-network chain parameters: wire magic, default port, address
//! encoding, and genesis data, for every (family, network) pair this
//! indexer knows how to talk to.

mod genesis;

use serde::{Deserialize, Serialize};

use crate::block;

/// Which Bitcoin-derived chain a `ChainParams` value describes. Each family
/// shares Bitcoin's 80-byte header format and varint-framed transaction
/// encoding but varies its network magic, address version bytes, and
/// genesis block.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ChainFamily {
    Bitcoin,
    Dogecoin,
    Litecoin,
}

/// Which of a family's three conventional network tiers these params target.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Network {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            _ => Err(SerializationError::Parse("unknown network name")),
        }
    }
}

use crate::SerializationError;

/// Everything the peer driver, address encoder, and sync manager need to
/// know about the network they're talking to.
#[derive(Clone, Debug)]
pub struct ChainParams {
    pub family: ChainFamily,
    pub network: Network,

    /// The 4 magic bytes that open every P2P message on this network.
    pub magic: [u8; 4],
    /// Default TCP port for this network.
    pub default_port: u16,

    /// Base58Check version byte for P2PKH addresses.
    pub p2pkh_version: u8,
    /// Base58Check version byte for P2SH addresses.
    pub p2sh_version: u8,
    /// Bech32 human-readable part for native SegWit addresses, if this
    /// network supports them.
    pub bech32_hrp: Option<&'static str>,
    /// Whether the peer driver should advertise/accept SegWit witness data.
    pub supports_witness: bool,

    /// The header of block 0.
    pub genesis_header: block::Header,
}

impl ChainParams {
    pub fn genesis_hash(&self) -> block::Hash {
        self.genesis_header.hash()
    }

    pub fn bitcoin(network: Network) -> ChainParams {
        genesis::bitcoin(network)
    }

    pub fn dogecoin(network: Network) -> ChainParams {
        genesis::dogecoin(network)
    }

    pub fn litecoin(network: Network) -> ChainParams {
        genesis::litecoin(network)
    }

    /// Looks up the built-in parameter set for a (family, network) pair.
    pub fn for_family(family: ChainFamily, network: Network) -> ChainParams {
        match family {
            ChainFamily::Bitcoin => Self::bitcoin(network),
            ChainFamily::Dogecoin => Self::dogecoin(network),
            ChainFamily::Litecoin => Self::litecoin(network),
        }
    }
}
