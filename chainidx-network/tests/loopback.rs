//! Drives a [`chainidx_network::Peer`] against a loopback TCP listener that
//! stands in for a remote node: handshake, a `block` announcement, an
//! unannounced disconnect, and a successful reconnect.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

use chainidx_chain::block::{Block, Header};
use chainidx_chain::parameters::{ChainFamily, ChainParams, Network};
use chainidx_chain::transaction::Transaction;
use chainidx_chain::transparent::{CoinbaseData, Input, Output};
use chainidx_network::protocol::external::Codec;
use chainidx_network::{Message, Peer};

fn params() -> ChainParams {
    ChainParams::for_family(ChainFamily::Bitcoin, Network::Regtest)
}

async fn remote_handshake(stream: TcpStream, magic: [u8; 4]) -> Framed<TcpStream, Codec> {
    let mut framed = Framed::new(stream, Codec::builder().for_magic(magic).finish());
    match framed.next().await {
        Some(Ok(Message::Version(_))) => {}
        other => panic!("expected version, got {:?}", other.map(|m| m.map(|m| m.to_string()))),
    }
    framed.send(Message::Verack).await.unwrap();
    framed
        .send(Message::Version(test_version()))
        .await
        .unwrap();
    match framed.next().await {
        Some(Ok(Message::Verack)) => {}
        other => panic!("expected verack, got {:?}", other.map(|m| m.map(|m| m.to_string()))),
    }
    framed
}

fn test_version() -> chainidx_network::Version {
    use chainidx_chain::block;
    use chainidx_network::types::{Nonce, PeerServices};
    chainidx_network::Version::new(
        chainidx_network::constants::CURRENT_VERSION,
        "127.0.0.1:0".parse().unwrap(),
        PeerServices::NODE_NONE,
        PeerServices::NODE_NETWORK,
        "127.0.0.1:0".parse().unwrap(),
        Nonce::random(),
        "/loopback:test/".to_owned(),
        block::Height::GENESIS,
        true,
    )
}

fn a_block(params: &ChainParams) -> Block {
    let coinbase = Transaction::new(
        1,
        vec![Input::Coinbase {
            data: CoinbaseData(vec![7]),
            sequence: 0xffff_ffff,
        }],
        vec![Output {
            value: 50,
            lock_script: chainidx_chain::transparent::Script(vec![0x51]),
        }],
        0,
    );
    Block {
        header: Header::new(
            1,
            params.genesis_hash(),
            [0u8; 32],
            Utc.timestamp(1_700_000_000, 0),
            0x207fffff,
            1,
        ),
        transactions: vec![Arc::new(coinbase)],
    }
}

#[tokio::test]
async fn reconnects_after_the_peer_drops_the_connection() {
    let params = params();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let magic = params.magic;

    let received = Arc::new(Mutex::new(Vec::new()));

    // First session: handshake, send one block, then drop the connection.
    let block_to_send = a_block(&params);
    let server_block = block_to_send.clone();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = remote_handshake(stream, magic).await;
        framed
            .send(Message::Block(Arc::new(server_block)))
            .await
            .unwrap();
        // Dropping `framed` here closes the socket, simulating an
        // unannounced disconnect.
        drop(framed);

        // Second session: a bare handshake proves a reconnect arrived.
        let (stream, _) = listener.accept().await.unwrap();
        let _framed = remote_handshake(stream, magic).await;
    });

    let peer = Peer::connect(addr, params.clone()).await.unwrap();
    let seen = Arc::clone(&received);
    peer.on_message(move |msg| {
        if let Message::Block(b) = msg {
            seen.lock().unwrap().push(b);
        }
    });

    tokio::time::timeout(Duration::from_secs(5), peer.wait_for_disconnect())
        .await
        .expect("peer should disconnect once the remote drops the socket");
    assert!(!peer.connected());
    assert_eq!(received.lock().unwrap().len(), 1);
    assert_eq!(received.lock().unwrap()[0].hash(), block_to_send.hash());

    let resumed = tokio::time::timeout(Duration::from_secs(5), peer.reconnect())
        .await
        .expect("reconnect should not hang")
        .expect("reconnect should succeed");
    assert!(resumed.connected());

    server.await.unwrap();
}
