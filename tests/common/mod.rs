#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{address, hex, TxKind, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use censorship_proxy::{
    CensorshipPolicy, ClientListener, ConfigStore, FramingLimits, RelayEngine, TransactionInspector,
};
use censorship_proxy::relay::RequestReader;

pub const WAIT: Duration = Duration::from_secs(5);
pub const QUIET: Duration = Duration::from_millis(300);

pub const RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 38\r\n\r\n{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":\"0x\"}";

pub fn signer(seed: u8) -> PrivateKeySigner {
    let mut key = [0u8; 32];
    key[31] = seed;
    PrivateKeySigner::from_slice(&key).expect("valid private key")
}

/// EIP-155 legacy transaction, 0x-prefixed
pub fn raw_legacy_tx(signer: &PrivateKeySigner, nonce: u64) -> String {
    let tx = TxLegacy {
        chain_id: Some(1337),
        nonce,
        gas_price: 20_000_000_000,
        gas_limit: 21_000,
        to: TxKind::Call(address!("3333333333333333333333333333333333333333")),
        value: U256::from(1u64),
        input: Default::default(),
    };
    let signature = signer.sign_hash_sync(&tx.signature_hash()).expect("signing works");
    let envelope = TxEnvelope::Legacy(tx.into_signed(signature));
    format!("0x{}", hex::encode(envelope.encoded_2718()))
}

pub fn raw_eip1559_tx(signer: &PrivateKeySigner, nonce: u64) -> String {
    let tx = TxEip1559 {
        chain_id: 1337,
        nonce,
        gas_limit: 21_000,
        max_fee_per_gas: 30_000_000_000,
        max_priority_fee_per_gas: 1_000_000_000,
        to: TxKind::Call(address!("3333333333333333333333333333333333333333")),
        value: U256::from(1u64),
        access_list: Default::default(),
        input: Default::default(),
    };
    let signature = signer.sign_hash_sync(&tx.signature_hash()).expect("signing works");
    let envelope = TxEnvelope::Eip1559(tx.into_signed(signature));
    format!("0x{}", hex::encode(envelope.encoded_2718()))
}

pub fn rpc_body(method: &str, params: serde_json::Value) -> String {
    serde_json::json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": 1 }).to_string()
}

pub fn http_post(body: &str) -> Vec<u8> {
    format!(
        "POST / HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    )
    .into_bytes()
}

pub fn send_raw_request(raw_tx: &str) -> Vec<u8> {
    http_post(&rpc_body("eth_sendRawTransaction", serde_json::json!([raw_tx])))
}

/// Upstream node stand-in: records every request it receives and answers each with RESPONSE
pub struct FakeNode {
    pub addr: SocketAddr,
    pub requests: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl FakeNode {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake node");
        let addr = listener.local_addr().expect("fake node address");
        let (tx, requests) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let (read, mut write) = stream.into_split();
                    let mut reader = RequestReader::new(read, FramingLimits::default());
                    while let Ok(Some(request)) = reader.next_request().await {
                        if tx.send(request.raw).is_err() {
                            break;
                        }
                        if write.write_all(RESPONSE).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        Self { addr, requests }
    }

    pub async fn next_request(&mut self) -> Vec<u8> {
        tokio::time::timeout(WAIT, self.requests.recv())
            .await
            .expect("timed out waiting for a request at the node")
            .expect("fake node stopped")
    }

    pub async fn assert_idle(&mut self) {
        let received = tokio::time::timeout(QUIET, self.requests.recv()).await;
        assert!(received.is_err(), "node unexpectedly received {:?}", received);
    }
}

/// Client listener on an ephemeral port relaying to `target`
pub async fn spawn_relay(target: &str) -> (SocketAddr, Arc<ConfigStore>) {
    let store = Arc::new(ConfigStore::new(target));
    let policy = CensorshipPolicy::new(Arc::clone(&store), Arc::new(TransactionInspector::new()));
    let engine = Arc::new(RelayEngine::new(policy, FramingLimits::default()));

    let listener = ClientListener::bind("127.0.0.1:0", engine).await.expect("bind relay");
    let addr = listener.local_addr().expect("relay address");
    tokio::spawn(listener.run());

    (addr, store)
}

pub async fn read_response(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = vec![0u8; RESPONSE.len()];
    tokio::time::timeout(WAIT, stream.read_exact(&mut buf))
        .await
        .expect("timed out waiting for a response")
        .expect("response read failed");
    buf
}

/// Read until the proxy closes the connection
pub async fn read_until_closed(stream: &mut TcpStream) -> Vec<u8> {
    let mut rest = Vec::new();
    let _ = tokio::time::timeout(WAIT, stream.read_to_end(&mut rest))
        .await
        .expect("connection was not closed");
    rest
}

/// Poll until `condition` holds
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
