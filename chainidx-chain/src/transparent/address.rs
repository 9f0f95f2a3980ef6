//! Address encoding for transparent (Bitcoin-inherited) outputs.

use std::fmt;

use ripemd160::{Digest, Ripemd160};
use secp256k1::PublicKey;
use sha2::{Digest as Sha2Digest, Sha256};

use crate::parameters::ChainParams;
use crate::serialization::SerializationError;

use super::Script;

/// A resolved spender address for a transparent output.
///
/// Base58Check (P2PKH/P2SH) and bech32 (P2WPKH) are both supported; which
/// one a given script resolves to depends on its `ScriptClass` and on
/// whether the network's `ChainParams` advertises a bech32 HRP.
#[derive(Clone, Eq, PartialEq)]
pub enum Address {
    PayToPublicKeyHash { version: u8, hash: [u8; 20] },
    PayToScriptHash { version: u8, hash: [u8; 20] },
    PayToWitnessPublicKeyHash { hrp: &'static str, hash: [u8; 20] },
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Address::PayToPublicKeyHash { version, hash } => {
                let mut payload = vec![*version];
                payload.extend_from_slice(hash);
                f.write_str(&bs58::encode(payload).with_check().into_string())
            }
            Address::PayToScriptHash { version, hash } => {
                let mut payload = vec![*version];
                payload.extend_from_slice(hash);
                f.write_str(&bs58::encode(payload).with_check().into_string())
            }
            Address::PayToWitnessPublicKeyHash { hrp, hash } => {
                let encoded = bech32::encode(hrp, bech32_program(hash)).map_err(|_| fmt::Error)?;
                f.write_str(&encoded)
            }
        }
    }
}

fn bech32_program(hash: &[u8; 20]) -> Vec<bech32::u5> {
    use bech32::ToBase32;
    let mut data = vec![bech32::u5::try_from_u8(0).expect("0 fits in u5")];
    data.extend(hash.to_base32());
    data
}

impl Address {
    /// Resolves a standard pay-to-pubkey-hash script to its address.
    pub fn from_pubkey_hash(params: &ChainParams, hash: [u8; 20]) -> Address {
        Address::PayToPublicKeyHash {
            version: params.p2pkh_version,
            hash,
        }
    }

    /// Resolves a standard pay-to-script-hash script to its address.
    pub fn from_script_hash(params: &ChainParams, hash: [u8; 20]) -> Address {
        Address::PayToScriptHash {
            version: params.p2sh_version,
            hash,
        }
    }

    /// Resolves a native SegWit v0 pay-to-witness-pubkey-hash script to its
    /// bech32 address, if this network supports it.
    pub fn from_witness_pubkey_hash(
        params: &ChainParams,
        hash: [u8; 20],
    ) -> Result<Address, SerializationError> {
        let hrp = params
            .bech32_hrp
            .ok_or(SerializationError::Parse("network has no bech32 HRP"))?;
        Ok(Address::PayToWitnessPublicKeyHash { hrp, hash })
    }

    /// A hash of a transparent address payload: RIPEMD160(SHA256(bytes)),
    /// used for both P2PKH and P2SH/P2WPKH payloads.
    pub fn hash_payload(bytes: &[u8]) -> [u8; 20] {
        let sha_hash = Sha256::digest(bytes);
        let ripe_hash = Ripemd160::digest(&sha_hash);
        let mut payload = [0u8; 20];
        payload.copy_from_slice(&ripe_hash[..]);
        payload
    }
}

/// Derives the P2PKH address a public key pays to on the given network.
pub fn pubkey_to_address(params: &ChainParams, pub_key: &PublicKey) -> Address {
    Address::from_pubkey_hash(params, Address::hash_payload(&pub_key.serialize()[..]))
}

/// Derives the P2SH address a redeem script pays to on the given network.
pub fn script_to_address(params: &ChainParams, script: &Script) -> Address {
    Address::from_script_hash(params, Address::hash_payload(&script.0[..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Network;

    #[test]
    fn pubkey_mainnet() {
        let pub_key = PublicKey::from_slice(&[
            2, 29, 21, 35, 40, 231, 60, 42, 219, 34, 219, 111, 27, 155, 17, 87, 91, 150, 47, 166,
            123, 234, 36, 162, 254, 17, 18, 181, 12, 215, 35, 198, 196,
        ])
        .expect("a valid compressed public key");

        let address = pubkey_to_address(&ChainParams::bitcoin(Network::Mainnet), &pub_key);
        assert!(matches!(address, Address::PayToPublicKeyHash { .. }));
    }

    #[test]
    fn empty_script_mainnet_testnet_differ() {
        let script = Script(vec![0; 20]);
        let mainnet = script_to_address(&ChainParams::bitcoin(Network::Mainnet), &script);
        let testnet = script_to_address(&ChainParams::bitcoin(Network::Testnet), &script);
        assert_ne!(mainnet.to_string(), testnet.to_string());
    }

    #[test]
    fn witness_pubkey_hash_requires_bech32_hrp() {
        let hash = [0u8; 20];
        let dogecoin = ChainParams::dogecoin(Network::Mainnet);
        assert!(Address::from_witness_pubkey_hash(&dogecoin, hash).is_err());

        let bitcoin = ChainParams::bitcoin(Network::Mainnet);
        let address = Address::from_witness_pubkey_hash(&bitcoin, hash).unwrap();
        assert!(address.to_string().starts_with("bc1"));
    }
}
