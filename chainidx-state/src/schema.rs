//! Key encoding for the single flat keyspace described in the storage
//! design: every record type lives in the same byte-ordered map,
//! disambiguated by a literal prefix or (for hashes/heights) by the fact
//! that hex digits never collide with the reserved prefixes below.

const LATEST_HEIGHT: &[u8] = b"latestBlockHeight";
const ORPHAN_PREFIX: &str = "orphan_";
const PK_PREFIX: &str = "pk";
const ADDR_TX_PREFIX: &str = "tx";

pub fn latest_height_key() -> Vec<u8> {
    LATEST_HEIGHT.to_vec()
}

pub fn block_by_hash_key(hash: &str) -> Vec<u8> {
    hash.as_bytes().to_vec()
}

pub fn block_by_height_key(height: u64) -> Vec<u8> {
    height.to_string().into_bytes()
}

pub fn orphan_by_hash_key(hash: &str) -> Vec<u8> {
    format!("{}{}", ORPHAN_PREFIX, hash).into_bytes()
}

pub fn orphan_by_height_key(height: u64) -> Vec<u8> {
    format!("{}{}", ORPHAN_PREFIX, height).into_bytes()
}

pub fn tx_by_hash_key(hash: &str) -> Vec<u8> {
    hash.as_bytes().to_vec()
}

/// The funding index, zero-padded so lexicographic and numeric order agree
/// within a shared script-pubkey prefix.
fn padded_index(index: u32) -> String {
    format!("{:010}", index)
}

pub fn utxo_key(script_pubkey_hex: &str, funding_tx_hash: &str, funding_index: u32) -> Vec<u8> {
    format!(
        "{}{}{}",
        script_pubkey_hex,
        funding_tx_hash,
        padded_index(funding_index)
    )
    .into_bytes()
}

pub fn utxo_prefix(script_pubkey_hex: &str) -> Vec<u8> {
    script_pubkey_hex.as_bytes().to_vec()
}

pub fn pk_inverse_key(funding_tx_hash: &str, funding_index: u32) -> Vec<u8> {
    format!(
        "{}{}{}",
        PK_PREFIX,
        funding_tx_hash,
        padded_index(funding_index)
    )
    .into_bytes()
}

pub fn address_index_key(script_pubkey_hex: &str, tx_hash: &str) -> Vec<u8> {
    format!("{}{}{}", ADDR_TX_PREFIX, script_pubkey_hex, tx_hash).into_bytes()
}

pub fn address_index_prefix(script_pubkey_hex: &str) -> Vec<u8> {
    format!("{}{}", ADDR_TX_PREFIX, script_pubkey_hex).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utxo_keys_share_a_scannable_prefix() {
        let a = utxo_key("76a914", "aa", 0);
        let b = utxo_key("76a914", "bb", 1);
        let prefix = utxo_prefix("76a914");
        assert!(a.starts_with(&prefix));
        assert!(b.starts_with(&prefix));
    }

    #[test]
    fn reserved_prefixes_never_collide_with_hex_script_keys() {
        // Hex alphabet is 0-9a-f; none of our reserved literal prefixes are
        // composed entirely of those characters.
        assert!(utxo_prefix("deadbeef") != orphan_by_hash_key("deadbeef"));
        assert!(!pk_inverse_key("aa", 0).starts_with(b"dead"));
    }
}
