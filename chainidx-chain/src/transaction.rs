//! Transactions and transaction-related structures.

mod hash;

use std::io::{self, Read};

use serde::{Deserialize, Serialize};

pub use hash::Hash;

use crate::compactint::CompactInt;
use crate::serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError};
use crate::transparent;

const SEGWIT_MARKER: u8 = 0x00;
const SEGWIT_FLAG: u8 = 0x01;

/// A Bitcoin-family transaction, including an optional per-input SegWit
/// witness stack (empty stacks for every input on a non-witness transaction).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction version. Versions >= 2 enable BIP 68 relative locktime.
    pub version: i32,
    pub inputs: Vec<transparent::Input>,
    pub outputs: Vec<transparent::Output>,
    /// One witness stack per input, in input order. Empty stacks throughout
    /// mean this transaction carries no witness data.
    pub witnesses: Vec<Vec<Vec<u8>>>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn new(
        version: i32,
        inputs: Vec<transparent::Input>,
        outputs: Vec<transparent::Output>,
        lock_time: u32,
    ) -> Transaction {
        let witnesses = vec![Vec::new(); inputs.len()];
        Transaction {
            version,
            inputs,
            outputs,
            witnesses,
            lock_time,
        }
    }

    /// Get the hash of this transaction (excludes witness data, matching
    /// Bitcoin's `txid` rather than its witness-committing `wtxid`).
    pub fn hash(&self) -> Hash {
        Hash::from(self)
    }

    pub fn has_witness(&self) -> bool {
        self.witnesses.iter().any(|stack| !stack.is_empty())
    }

    pub fn contains_coinbase_input(&self) -> bool {
        self.inputs
            .iter()
            .any(|input| matches!(input, transparent::Input::Coinbase { .. }))
    }

    /// Returns `true` if this transaction is a coinbase transaction.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1
            && matches!(
                self.inputs.get(0),
                Some(transparent::Input::Coinbase { .. })
            )
    }

    /// Serializes the non-witness portion of the transaction: the part that
    /// determines its `txid`.
    pub(crate) fn bitcoin_serialize_non_witness<W: io::Write>(
        &self,
        mut target: W,
    ) -> Result<(), io::Error> {
        self.version.bitcoin_serialize(&mut target)?;
        self.inputs.bitcoin_serialize(&mut target)?;
        self.outputs.bitcoin_serialize(&mut target)?;
        self.lock_time.bitcoin_serialize(&mut target)
    }
}

impl BitcoinSerialize for Transaction {
    fn bitcoin_serialize<W: io::Write>(&self, mut target: W) -> Result<(), io::Error> {
        self.version.bitcoin_serialize(&mut target)?;
        if self.has_witness() {
            target.write_all(&[SEGWIT_MARKER, SEGWIT_FLAG])?;
        }
        self.inputs.bitcoin_serialize(&mut target)?;
        self.outputs.bitcoin_serialize(&mut target)?;
        if self.has_witness() {
            for stack in &self.witnesses {
                CompactInt::from(stack.len()).bitcoin_serialize(&mut target)?;
                for item in stack {
                    item.bitcoin_serialize(&mut target)?;
                }
            }
        }
        self.lock_time.bitcoin_serialize(&mut target)
    }
}

/// Decodes a `CompactInt` whose first byte has already been consumed off
/// the wire (used to peek past the optional SegWit marker byte).
fn compact_int_with_first_byte<R: Read>(
    first: u8,
    mut reader: R,
) -> Result<CompactInt, SerializationError> {
    if first < 253 {
        Ok(CompactInt::from(first as usize))
    } else if first == 253 {
        Ok(CompactInt::from(
            u16::bitcoin_deserialize(&mut reader)? as usize
        ))
    } else if first == 254 {
        Ok(CompactInt::from(
            u32::bitcoin_deserialize(&mut reader)? as usize
        ))
    } else {
        Ok(CompactInt::from(
            u64::bitcoin_deserialize(&mut reader)? as usize
        ))
    }
}

impl BitcoinDeserialize for Transaction {
    fn bitcoin_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let version = i32::bitcoin_deserialize(&mut reader)?;

        let mut marker = [0u8; 1];
        reader.read_exact(&mut marker)?;
        let segwit = marker[0] == SEGWIT_MARKER;
        let input_count = if segwit {
            let mut flag = [0u8; 1];
            reader.read_exact(&mut flag)?;
            if flag[0] != SEGWIT_FLAG {
                return Err(SerializationError::Parse("invalid segwit flag byte"));
            }
            CompactInt::bitcoin_deserialize(&mut reader)?
        } else {
            compact_int_with_first_byte(marker[0], &mut reader)?
        };

        let mut inputs = Vec::with_capacity(std::cmp::min(input_count.value() as usize, 1024));
        for _ in 0..input_count.value() {
            inputs.push(transparent::Input::bitcoin_deserialize(&mut reader)?);
        }

        let outputs = Vec::<transparent::Output>::bitcoin_deserialize(&mut reader)?;

        let witnesses = if segwit {
            let mut witnesses = Vec::with_capacity(inputs.len());
            for _ in 0..inputs.len() {
                let item_count = CompactInt::bitcoin_deserialize(&mut reader)?.value();
                let mut stack = Vec::with_capacity(std::cmp::min(item_count as usize, 1024));
                for _ in 0..item_count {
                    stack.push(Vec::<u8>::bitcoin_deserialize(&mut reader)?);
                }
                witnesses.push(stack);
            }
            witnesses
        } else {
            vec![Vec::new(); inputs.len()]
        };

        let lock_time = u32::bitcoin_deserialize(&mut reader)?;

        Ok(Transaction {
            version,
            inputs,
            outputs,
            witnesses,
            lock_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transparent::{CoinbaseData, Input, Output, Script};

    fn coinbase_tx() -> Transaction {
        Transaction::new(
            1,
            vec![Input::Coinbase {
                data: CoinbaseData(vec![1, 2, 3]),
                sequence: 0xffff_ffff,
            }],
            vec![Output {
                value: 50_0000_0000,
                lock_script: Script(vec![0x76, 0xa9]),
            }],
            0,
        )
    }

    #[test]
    fn roundtrips_without_witness() {
        let tx = coinbase_tx();
        let bytes = tx.bitcoin_serialize_to_vec().unwrap();
        let decoded = Transaction::bitcoin_deserialize(&bytes[..]).unwrap();
        assert_eq!(tx, decoded);
        assert!(!decoded.has_witness());
    }

    #[test]
    fn is_coinbase_detects_single_coinbase_input() {
        assert!(coinbase_tx().is_coinbase());
    }
}
