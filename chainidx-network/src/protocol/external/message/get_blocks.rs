use chainidx_chain::{
    block, compactint::CompactInt, serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError},
};

/// The payload of a `getblocks` message: a descending-height block locator
/// plus an optional stop hash.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GetBlocks {
    /// The sender's block locator, ordered from newest to oldest.
    pub block_header_hashes: Vec<block::Hash>,
    /// The stop hash. `None` means "as many as you can send" (up to 500),
    /// encoded on the wire as the all-zero hash.
    pub stop_hash: Option<block::Hash>,
}

impl BitcoinDeserialize for GetBlocks {
    fn bitcoin_deserialize<R: std::io::Read>(mut reader: R) -> Result<Self, SerializationError>
    where
        Self: Sized,
    {
        let block_header_hashes = Vec::bitcoin_deserialize(&mut reader)?;
        let raw_stop_hash = block::Hash::bitcoin_deserialize(&mut reader)?;
        let stop_hash = if raw_stop_hash.0 == [0u8; 32] {
            None
        } else {
            Some(raw_stop_hash)
        };
        Ok(GetBlocks {
            block_header_hashes,
            stop_hash,
        })
    }
}

impl BitcoinSerialize for GetBlocks {
    fn bitcoin_serialize<W: std::io::Write>(&self, mut target: W) -> Result<(), std::io::Error> {
        self.block_header_hashes.bitcoin_serialize(&mut target)?;
        match self.stop_hash {
            Some(hash) => hash.bitcoin_serialize(&mut target),
            None => [0u8; 32].bitcoin_serialize(&mut target),
        }
    }
}

impl GetBlocks {
    pub fn new(locator: Vec<block::Hash>, stop_hash: Option<block::Hash>) -> GetBlocks {
        GetBlocks {
            block_header_hashes: locator,
            stop_hash,
        }
    }

    fn serialized_size(&self) -> usize {
        CompactInt::size(self.block_header_hashes.len()) + (self.block_header_hashes.len() * 32) + 32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_size() {
        let hashes = vec![block::Hash([0u8; 32]), block::Hash([1u8; 32]), block::Hash([3u8; 32])];
        let msg = GetBlocks::new(hashes, Some(block::Hash([0u8; 32])));
        let serial = msg
            .bitcoin_serialize_to_vec()
            .expect("serializing into a vec shouldn't fail");
        assert_eq!(serial.len(), msg.serialized_size());
    }

    #[test]
    fn roundtrips_with_no_stop_hash() {
        let msg = GetBlocks::new(vec![block::Hash([9u8; 32])], None);
        let bytes = msg.bitcoin_serialize_to_vec().unwrap();
        let decoded = GetBlocks::bitcoin_deserialize(&bytes[..]).unwrap();
        assert_eq!(msg, decoded);
    }
}
