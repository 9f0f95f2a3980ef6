//! Maps wire block/transaction shapes onto the persisted index record
//! shapes, deriving the write set (new outputs, consumed spends, tx
//! records) a block's ingestion applies to storage.

use chainidx_chain::block::Block as WireBlock;
use chainidx_chain::parameters::ChainParams;
use chainidx_chain::transaction::Transaction as WireTransaction;
use chainidx_chain::transparent::{address::Address, script::ScriptClass, Input};
use chainidx_state::model::{Block, Spend, Transaction, Vin, Vout};

fn coinbase_sentinel_hash() -> String {
    "0".repeat(64)
}

/// Everything a newly-accepted (non-orphan) block's ingestion writes.
pub struct BlockWriteSet {
    pub block: Block,
    pub transactions: Vec<Transaction>,
    pub new_outputs: Vec<Vout>,
    pub spends: Vec<Spend>,
}

/// Builds the full write set for `wire_block`, to be recorded at `height`
/// with the given orphan status.
///
/// When `is_orphan` is true, `new_outputs`/`spends` are still populated
/// (callers that store orphans ignore them, since orphan storage has no
/// UTXO effects) and every transaction's `block_hash` is left empty, per
/// the data model's orphan lifecycle.
pub fn build_block_write_set(
    params: &ChainParams,
    wire_block: &WireBlock,
    height: u64,
    is_orphan: bool,
) -> BlockWriteSet {
    let hash = wire_block.hash().to_string();
    let tx_hashes: Vec<String> = wire_block
        .transactions
        .iter()
        .map(|tx| tx.hash().to_string())
        .collect();

    let block = Block {
        hash: hash.clone(),
        height,
        previous_hash: wire_block.header.previous_block_hash.to_string(),
        version: wire_block.header.version,
        merkle_root: hex::encode(wire_block.header.merkle_root),
        time: wire_block.header.time.timestamp(),
        bits: wire_block.header.bits,
        nonce: wire_block.header.nonce,
        is_orphan,
        tx_hashes,
    };

    let mut transactions = Vec::with_capacity(wire_block.transactions.len());
    let mut new_outputs = Vec::new();
    let mut spends = Vec::new();

    for wire_tx in &wire_block.transactions {
        let (tx, tx_outputs, tx_spends) =
            build_transaction(params, wire_tx, if is_orphan { "" } else { &hash });
        new_outputs.extend(tx_outputs);
        spends.extend(tx_spends);
        transactions.push(tx);
    }

    BlockWriteSet {
        block,
        transactions,
        new_outputs,
        spends,
    }
}

/// Maps one wire transaction to its persisted record, plus the outputs it
/// produced and the spends its inputs consume (coinbase inputs produce
/// neither).
pub fn build_transaction(
    params: &ChainParams,
    wire_tx: &WireTransaction,
    block_hash: &str,
) -> (Transaction, Vec<Vout>, Vec<Spend>) {
    let tx_hash = wire_tx.hash().to_string();

    let mut vin = Vec::with_capacity(wire_tx.inputs.len());
    let mut spends = Vec::new();
    for (index, input) in wire_tx.inputs.iter().enumerate() {
        let witness = wire_tx
            .witnesses
            .get(index)
            .map(|stack| {
                stack
                    .iter()
                    .map(hex::encode)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();

        match input {
            Input::Coinbase { data, sequence } => {
                vin.push(Vin {
                    prev_tx_hash: coinbase_sentinel_hash(),
                    prev_tx_index: 0xffff_ffff,
                    sequence: *sequence,
                    script_sig: hex::encode(&data.0),
                    witness,
                });
            }
            Input::PrevOut {
                outpoint,
                unlock_script,
                sequence,
            } => {
                let prev_tx_hash = outpoint.hash.to_string();
                vin.push(Vin {
                    prev_tx_hash: prev_tx_hash.clone(),
                    prev_tx_index: outpoint.index,
                    sequence: *sequence,
                    script_sig: hex::encode(&unlock_script.0),
                    witness,
                });
                if !outpoint.is_coinbase_sentinel() {
                    spends.push(Spend {
                        prev_tx_hash,
                        prev_tx_index: outpoint.index,
                        spending_tx_hash: tx_hash.clone(),
                    });
                }
            }
        }
    }

    let mut vout = Vec::with_capacity(wire_tx.outputs.len());
    for (index, output) in wire_tx.outputs.iter().enumerate() {
        let class = output.lock_script.classify();
        let address = resolve_address(params, &class).map(|a| a.to_string());
        vout.push(Vout {
            tx_hash: tx_hash.clone(),
            index: index as u32,
            script_pubkey: hex::encode(&output.lock_script.0),
            value: output.value,
            script_type: class.name().to_string(),
            address: address.unwrap_or_default(),
        });
    }

    let tx = Transaction {
        hash: tx_hash,
        version: wire_tx.version,
        lock_time: wire_tx.lock_time,
        block_hash: block_hash.to_owned(),
        vin,
        vout: vout.clone(),
    };

    (tx, vout, spends)
}

fn resolve_address(params: &ChainParams, class: &ScriptClass) -> Option<Address> {
    match class {
        ScriptClass::PubKeyHash(hash) => Some(Address::from_pubkey_hash(params, *hash)),
        ScriptClass::ScriptHash(hash) => Some(Address::from_script_hash(params, *hash)),
        ScriptClass::WitnessPubKeyHash(hash) => {
            Address::from_witness_pubkey_hash(params, *hash).ok()
        }
        // No native encoding is defined for P2WSH on this indexer's address
        // type; nulldata and non-standard scripts have no spender address.
        ScriptClass::WitnessScriptHash(_)
        | ScriptClass::NullData
        | ScriptClass::NonStandard => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainidx_chain::parameters::{ChainFamily, Network};
    use chainidx_chain::transparent::{CoinbaseData, Output, Script};

    fn params() -> ChainParams {
        ChainParams::for_family(ChainFamily::Bitcoin, Network::Regtest)
    }

    fn p2pkh_script(hash: [u8; 20]) -> Script {
        let mut bytes = vec![0x76, 0xa9, 20];
        bytes.extend_from_slice(&hash);
        bytes.push(0x88);
        bytes.push(0xac);
        Script(bytes)
    }

    #[test]
    fn coinbase_input_produces_no_spend() {
        let tx = WireTransaction::new(
            1,
            vec![Input::Coinbase {
                data: CoinbaseData(vec![1, 2, 3]),
                sequence: 0xffff_ffff,
            }],
            vec![Output {
                value: 50_0000_0000,
                lock_script: p2pkh_script([7u8; 20]),
            }],
            0,
        );
        let (record, outputs, spends) = build_transaction(&params(), &tx, "blockhash");
        assert!(spends.is_empty());
        assert_eq!(outputs.len(), 1);
        assert_eq!(record.vin[0].prev_tx_hash, coinbase_sentinel_hash());
        assert_eq!(outputs[0].script_type, "pubkeyhash");
        assert!(!outputs[0].address.is_empty());
    }

    #[test]
    fn op_return_output_has_no_address() {
        let tx = WireTransaction::new(
            1,
            vec![Input::Coinbase {
                data: CoinbaseData(vec![]),
                sequence: 0xffff_ffff,
            }],
            vec![Output {
                value: 0,
                lock_script: Script(vec![0x6a, 0x02, 0xde, 0xad]),
            }],
            0,
        );
        let (_, outputs, _) = build_transaction(&params(), &tx, "blockhash");
        assert_eq!(outputs[0].script_type, "nulldata");
        assert!(outputs[0].address.is_empty());
    }
}
