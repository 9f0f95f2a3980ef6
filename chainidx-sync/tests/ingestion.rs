//! End-to-end ingestion scenarios against a temp-dir sled storage: linear
//! extension, same-block spends, orphan blocks, and reorganization.

use chrono::{TimeZone, Utc};

use chainidx_chain::block::{Block, Hash as BlockHash, Header};
use chainidx_chain::parameters::{ChainFamily, ChainParams, Network};
use chainidx_chain::transaction::{Hash as TxHash, Transaction};
use chainidx_chain::transparent::{CoinbaseData, Input, OutPoint, Output, Script};
use chainidx_sync::{bootstrap_genesis, ingest_block};

fn params() -> ChainParams {
    ChainParams::for_family(ChainFamily::Bitcoin, Network::Regtest)
}

fn p2pkh_script(seed: u8) -> Script {
    let mut bytes = vec![0x76, 0xa9, 20];
    bytes.extend(std::iter::repeat(seed).take(20));
    bytes.push(0x88);
    bytes.push(0xac);
    Script(bytes)
}

fn coinbase_block(previous: BlockHash, nonce: u32, value: i64, pay_to: u8) -> Block {
    let coinbase = Transaction::new(
        1,
        vec![Input::Coinbase {
            data: CoinbaseData(vec![nonce as u8]),
            sequence: 0xffff_ffff,
        }],
        vec![Output {
            value,
            lock_script: p2pkh_script(pay_to),
        }],
        0,
    );
    Block {
        header: Header::new(1, previous, [0u8; 32], Utc.timestamp(1_700_000_000, 0), 0x207fffff, nonce),
        transactions: vec![std::sync::Arc::new(coinbase)],
    }
}

/// A non-coinbase block spending `spend` (outpoint) and paying two outputs.
fn spend_block(previous: BlockHash, nonce: u32, spend: OutPoint, outputs: Vec<(i64, u8)>) -> Block {
    let coinbase = Transaction::new(
        1,
        vec![Input::Coinbase {
            data: CoinbaseData(vec![nonce as u8]),
            sequence: 0xffff_ffff,
        }],
        vec![Output {
            value: 0,
            lock_script: p2pkh_script(99),
        }],
        0,
    );
    let spender = Transaction::new(
        1,
        vec![Input::PrevOut {
            outpoint: spend,
            unlock_script: Script(vec![]),
            sequence: 0xffff_ffff,
        }],
        outputs
            .into_iter()
            .map(|(value, seed)| Output {
                value,
                lock_script: p2pkh_script(seed),
            })
            .collect(),
        0,
    );
    Block {
        header: Header::new(1, previous, [1u8; 32], Utc.timestamp(1_700_000_100, 0), 0x207fffff, nonce),
        transactions: vec![std::sync::Arc::new(coinbase), std::sync::Arc::new(spender)],
    }
}

#[test]
fn s1_cold_start_genesis_only() {
    chainidx_test::init();
    let params = params();
    let (storage, _dir) = chainidx_test::temp_storage(&params);

    bootstrap_genesis(&storage, &params).unwrap();

    assert_eq!(storage.get_latest_height().unwrap(), 0);
    let genesis = storage
        .get_block(&params.genesis_hash().to_string())
        .unwrap()
        .expect("genesis stored");
    assert!(!genesis.is_orphan);
    assert_eq!(genesis.height, 0);

    let sentinel = storage.get_tx(&"0".repeat(64)).unwrap();
    assert!(sentinel.is_some());
}

#[test]
fn s2_linear_extension() {
    chainidx_test::init();
    let params = params();
    let (storage, _dir) = chainidx_test::temp_storage(&params);
    bootstrap_genesis(&storage, &params).unwrap();

    let script_s = hex::encode(&p2pkh_script(1).0);

    let b1 = coinbase_block(params.genesis_hash(), 1, 50, 1);
    let b1_hash = b1.hash();
    ingest_block(&storage, &params, &b1).unwrap();

    let b2 = coinbase_block(b1_hash, 2, 50, 1);
    ingest_block(&storage, &params, &b2).unwrap();

    assert_eq!(storage.get_latest_height().unwrap(), 2);
    let utxos = storage.get_utxos_by_script(&script_s).unwrap();
    assert_eq!(utxos.len(), 2);
    assert_eq!(utxos.iter().map(|u| u.value).sum::<i64>(), 100);
    assert_eq!(storage.get_txs_of_script(&script_s).unwrap().len(), 2);
}

#[test]
fn block_ingestion_is_idempotent() {
    chainidx_test::init();
    let params = params();
    let (storage, _dir) = chainidx_test::temp_storage(&params);
    bootstrap_genesis(&storage, &params).unwrap();

    let b1 = coinbase_block(params.genesis_hash(), 1, 50, 1);
    ingest_block(&storage, &params, &b1).unwrap();
    ingest_block(&storage, &params, &b1).unwrap();

    assert_eq!(storage.get_latest_height().unwrap(), 1);
    let script_s = hex::encode(&p2pkh_script(1).0);
    assert_eq!(storage.get_utxos_by_script(&script_s).unwrap().len(), 1);
}

#[test]
fn s3_spend_within_same_block() {
    chainidx_test::init();
    let params = params();
    let (storage, _dir) = chainidx_test::temp_storage(&params);
    bootstrap_genesis(&storage, &params).unwrap();

    let script_s = hex::encode(&p2pkh_script(1).0);
    let script_t = hex::encode(&p2pkh_script(2).0);

    let b1 = coinbase_block(params.genesis_hash(), 1, 50, 1);
    let b1_hash = b1.hash();
    let b1_coinbase_txid: TxHash = b1.transactions[0].hash();
    ingest_block(&storage, &params, &b1).unwrap();

    let b2 = coinbase_block(b1_hash, 2, 50, 1);
    let b2_hash = b2.hash();
    ingest_block(&storage, &params, &b2).unwrap();

    let b3 = spend_block(
        b2_hash,
        3,
        OutPoint {
            hash: b1_coinbase_txid,
            index: 0,
        },
        vec![(30, 2), (20, 2)],
    );
    ingest_block(&storage, &params, &b3).unwrap();

    assert_eq!(storage.get_latest_height().unwrap(), 3);
    assert_eq!(storage.get_utxos_by_script(&script_s).unwrap().len(), 1);
    let t_utxos = storage.get_utxos_by_script(&script_t).unwrap();
    assert_eq!(t_utxos.len(), 2);
    assert_eq!(t_utxos.iter().map(|u| u.value).sum::<i64>(), 50);
    assert_eq!(storage.get_txs_of_script(&script_s).unwrap().len(), 3);
}

#[test]
fn s4_competing_block_is_stored_as_orphan() {
    chainidx_test::init();
    let params = params();
    let (storage, _dir) = chainidx_test::temp_storage(&params);
    bootstrap_genesis(&storage, &params).unwrap();

    let b1 = coinbase_block(params.genesis_hash(), 1, 50, 1);
    let b1_hash = b1.hash();
    let b1_coinbase_txid: TxHash = b1.transactions[0].hash();
    ingest_block(&storage, &params, &b1).unwrap();

    let b2 = coinbase_block(b1_hash, 2, 50, 1);
    let b2_hash = b2.hash();
    ingest_block(&storage, &params, &b2).unwrap();

    let b3 = spend_block(
        b2_hash,
        3,
        OutPoint {
            hash: b1_coinbase_txid,
            index: 0,
        },
        vec![(30, 2), (20, 2)],
    );
    ingest_block(&storage, &params, &b3).unwrap();

    let b3_prime = coinbase_block(b2_hash, 30, 50, 3);
    let b3_prime_hash = b3_prime.hash();
    ingest_block(&storage, &params, &b3_prime).unwrap();

    assert_eq!(storage.get_latest_height().unwrap(), 3);
    let orphan = storage
        .get_orphan_block(&b3_prime_hash.to_string())
        .unwrap()
        .expect("b3' stored as orphan");
    assert!(orphan.is_orphan);
    assert_eq!(orphan.height, 3);
}

#[test]
fn s5_reorganization_switches_the_main_chain() {
    chainidx_test::init();
    let params = params();
    let (storage, _dir) = chainidx_test::temp_storage(&params);
    bootstrap_genesis(&storage, &params).unwrap();

    let script_s = hex::encode(&p2pkh_script(1).0);
    let script_t = hex::encode(&p2pkh_script(2).0);

    let b1 = coinbase_block(params.genesis_hash(), 1, 50, 1);
    let b1_hash = b1.hash();
    let b1_coinbase_txid: TxHash = b1.transactions[0].hash();
    ingest_block(&storage, &params, &b1).unwrap();

    let b2 = coinbase_block(b1_hash, 2, 50, 1);
    let b2_hash = b2.hash();
    ingest_block(&storage, &params, &b2).unwrap();

    let b3 = spend_block(
        b2_hash,
        3,
        OutPoint {
            hash: b1_coinbase_txid,
            index: 0,
        },
        vec![(30, 2), (20, 2)],
    );
    ingest_block(&storage, &params, &b3).unwrap();

    let b3_prime = coinbase_block(b2_hash, 30, 50, 3);
    let b3_prime_hash = b3_prime.hash();
    ingest_block(&storage, &params, &b3_prime).unwrap();

    let b4_prime = coinbase_block(b3_prime_hash, 40, 50, 3);
    let b4_prime_hash = b4_prime.hash();
    ingest_block(&storage, &params, &b4_prime).unwrap();

    assert_eq!(storage.get_latest_height().unwrap(), 4);
    assert_eq!(storage.get_latest_tip_hash().unwrap(), b4_prime_hash.to_string());

    let b3_after = storage.get_orphan_block(&b3.hash().to_string()).unwrap().unwrap();
    assert!(b3_after.is_orphan);
    let b3_prime_after = storage
        .get_block(&b3_prime_hash.to_string())
        .unwrap()
        .expect("b3' now on main chain");
    assert!(!b3_prime_after.is_orphan);

    // B3's spend of B1's coinbase is undone: scriptS's output is unspent again.
    assert_eq!(storage.get_utxos_by_script(&script_s).unwrap().len(), 2);
    // B3's own outputs to scriptT are gone along with it.
    assert!(storage.get_utxos_by_script(&script_t).unwrap().is_empty());
}
