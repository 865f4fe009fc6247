mod common;

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

use censorship_proxy::{
    AppConfig, CensorshipPolicy, ClientListener, ConfigStore, ControlListener, FramingLimits, Proxy,
    ProxyError, ProxySettings, RelayEngine, TransactionInspector,
};
use common::*;

fn engine(store: Arc<ConfigStore>) -> Arc<RelayEngine> {
    let policy = CensorshipPolicy::new(store, Arc::new(TransactionInspector::new()));
    Arc::new(RelayEngine::new(policy, FramingLimits::default()))
}

#[tokio::test]
async fn test_listeners_from_bound_sockets() {
    let store = Arc::new(ConfigStore::new("127.0.0.1:8545"));

    let control_socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let control_addr = control_socket.local_addr().unwrap();
    let control = ControlListener::from_listener(control_socket, Arc::clone(&store), 1024);
    assert_eq!(control.local_addr().unwrap(), control_addr);

    let client_socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client_addr = client_socket.local_addr().unwrap();
    let client = ClientListener::from_listener(client_socket, engine(store));
    assert_eq!(client.local_addr().unwrap(), client_addr);
}

#[tokio::test]
async fn test_address_in_use_is_a_bind_error() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = occupied.local_addr().unwrap().to_string();
    let store = Arc::new(ConfigStore::new("127.0.0.1:8545"));

    let result = ClientListener::bind(&addr, engine(store)).await;

    match result {
        Err(ProxyError::Bind { addr: reported, .. }) => assert_eq!(reported, addr),
        Err(other) => panic!("expected bind error, got {}", other),
        Ok(_) => panic!("bind on an occupied port should fail"),
    }
}

#[tokio::test]
async fn test_proxy_reports_control_bind_failure() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let settings = ProxySettings {
        control_addr: occupied.local_addr().unwrap().to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        target_addr: "127.0.0.1:8545".to_string(),
        initial_censored: Vec::new(),
    };

    let result = Proxy::bind(&settings, &AppConfig::default()).await;
    assert!(matches!(result, Err(ProxyError::Bind { .. })));
}

#[tokio::test]
async fn test_proxy_applies_relay_limits_from_config() {
    let mut node = FakeNode::spawn().await;
    let mut config = AppConfig::default();
    config.relay.max_body_bytes = 16;
    let settings = ProxySettings {
        control_addr: "127.0.0.1:0".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        target_addr: node.addr.to_string(),
        initial_censored: Vec::new(),
    };

    let proxy = Proxy::bind(&settings, &config).await.unwrap();
    let relay = proxy.client_addr().unwrap();
    tokio::spawn(proxy.run_until(std::future::pending::<()>()));

    let mut client = TcpStream::connect(relay).await.unwrap();
    client
        .write_all(&http_post(&rpc_body("eth_blockNumber", serde_json::json!([]))))
        .await
        .unwrap();

    read_until_closed(&mut client).await;
    node.assert_idle().await;
}
