//! End-to-end protocol tests over a real TCP socket.

use arenakv_common::{ServerConfig, StoreConfig};
use arenakv_core::Store;
use arenakv_server::server::Server;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

fn small_config() -> StoreConfig {
    StoreConfig {
        memory_size: 0x0010_0000,
        index_size: 0x1000,
        cache_slots: 64,
    }
}

async fn spawn_server(config: &StoreConfig) -> SocketAddr {
    let store = Arc::new(Mutex::new(Store::new(config).unwrap()));
    let server_config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let server = Server::bind(&server_config, store).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve());
    addr
}

/// Sends raw bytes, returns (status, body).
async fn send_raw(addr: SocketAddr, raw: &[u8]) -> (u16, Vec<u8>) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();

    let blank = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response without blank line");
    let head = std::str::from_utf8(&response[..blank]).unwrap();
    let status: u16 = head
        .split_whitespace()
        .nth(1)
        .expect("status code")
        .parse()
        .unwrap();
    (status, response[blank + 4..].to_vec())
}

async fn request(addr: SocketAddr, method: &str, path: &str, body: &[u8]) -> (u16, Vec<u8>) {
    let mut raw = format!(
        "{} {} HTTP/1.1\r\nHost: test\r\nContent-Length: {}\r\n\r\n",
        method,
        path,
        body.len()
    )
    .into_bytes();
    raw.extend_from_slice(body);
    send_raw(addr, &raw).await
}

#[tokio::test]
async fn basic_lifecycle() {
    let addr = spawn_server(&small_config()).await;

    let (status, _) = request(addr, "POST", "/nosql/key1", b"hello").await;
    assert_eq!(status, 200);

    let (status, body) = request(addr, "GET", "/nosql/key1", b"").await;
    assert_eq!(status, 200);
    assert_eq!(body, b"hello");

    let (status, body) = request(addr, "HEAD", "/nosql/key1", b"").await;
    assert_eq!(status, 200);
    assert!(body.is_empty());

    let (status, _) = request(addr, "DELETE", "/nosql/key1", b"").await;
    assert_eq!(status, 200);

    let (status, _) = request(addr, "GET", "/nosql/key1", b"").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn post_overwrites() {
    let addr = spawn_server(&small_config()).await;

    request(addr, "POST", "/nosql/k", b"v1").await;
    request(addr, "POST", "/nosql/k", b"v2").await;

    let (status, body) = request(addr, "GET", "/nosql/k", b"").await;
    assert_eq!(status, 200);
    assert_eq!(body, b"v2");
}

#[tokio::test]
async fn put_overwrites() {
    let addr = spawn_server(&small_config()).await;

    request(addr, "PUT", "/nosql/k", b"v1").await;
    request(addr, "PUT", "/nosql/k", b"v2").await;

    let (status, body) = request(addr, "GET", "/nosql/k", b"").await;
    assert_eq!(status, 200);
    assert_eq!(body, b"v2");
}

#[tokio::test]
async fn many_keys_then_delete_half() {
    let addr = spawn_server(&StoreConfig::default()).await;

    for i in 0..1024 {
        let (status, _) = request(
            addr,
            "POST",
            &format!("/nosql/k{}", i),
            format!("v{}", i).as_bytes(),
        )
        .await;
        assert_eq!(status, 200, "insert k{} failed", i);
    }
    for i in 0..1024 {
        let (status, body) = request(addr, "GET", &format!("/nosql/k{}", i), b"").await;
        assert_eq!(status, 200);
        assert_eq!(body, format!("v{}", i).into_bytes());
    }

    for i in 0..512 {
        let (status, _) = request(addr, "DELETE", &format!("/nosql/k{}", i), b"").await;
        assert_eq!(status, 200);
    }
    for i in 0..512 {
        let (status, _) = request(addr, "HEAD", &format!("/nosql/k{}", i), b"").await;
        assert_eq!(status, 404, "k{} should be gone", i);
    }
    for i in 512..1024 {
        let (status, _) = request(addr, "HEAD", &format!("/nosql/k{}", i), b"").await;
        assert_eq!(status, 200, "k{} should survive", i);
    }
}

#[tokio::test]
async fn empty_value_roundtrip() {
    let addr = spawn_server(&small_config()).await;

    let (status, _) = request(addr, "POST", "/nosql/empty", b"").await;
    assert_eq!(status, 200);

    let (status, body) = request(addr, "GET", "/nosql/empty", b"").await;
    assert_eq!(status, 200);
    assert!(body.is_empty());
}

#[tokio::test]
async fn value_with_nul_bytes_roundtrip() {
    let addr = spawn_server(&small_config()).await;
    let value = b"first\0second\0third";

    let (status, _) = request(addr, "POST", "/nosql/tricky", value).await;
    assert_eq!(status, 200);

    let (status, body) = request(addr, "GET", "/nosql/tricky", b"").await;
    assert_eq!(status, 200);
    assert_eq!(body, value);
}

#[tokio::test]
async fn empty_key_is_500() {
    let addr = spawn_server(&small_config()).await;

    let (status, _) = request(addr, "POST", "/nosql/", b"value").await;
    assert_eq!(status, 500);
}

#[tokio::test]
async fn query_suffix_ignored() {
    let addr = spawn_server(&small_config()).await;

    request(addr, "POST", "/nosql/key", b"plain").await;
    let (status, body) = request(addr, "GET", "/nosql/key?verbose=1", b"").await;
    assert_eq!(status, 200);
    assert_eq!(body, b"plain");
}

#[tokio::test]
async fn unknown_plugin_is_501() {
    let addr = spawn_server(&small_config()).await;

    let (status, _) = request(addr, "GET", "/metrics/anything", b"").await;
    assert_eq!(status, 501);
}

#[tokio::test]
async fn unknown_method_is_501() {
    let addr = spawn_server(&small_config()).await;

    let (status, _) = request(addr, "PATCH", "/nosql/k", b"x").await;
    assert_eq!(status, 501);
}

#[tokio::test]
async fn garbage_request_is_501() {
    let addr = spawn_server(&small_config()).await;

    let (status, _) = send_raw(addr, b"\r\n\r\n").await;
    assert_eq!(status, 501);
}

#[tokio::test]
async fn body_without_content_length() {
    // A client that half-closes after writing still gets served; the
    // body is whatever arrived with the head.
    let addr = spawn_server(&small_config()).await;

    let (status, _) = send_raw(addr, b"POST /nosql/raw HTTP/1.1\r\n\r\npayload").await;
    assert_eq!(status, 200);

    let (status, body) = request(addr, "GET", "/nosql/raw", b"").await;
    assert_eq!(status, 200);
    assert_eq!(body, b"payload");
}

#[tokio::test]
async fn snapshot_backup_and_restore_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arena.snapshot");
    let path_body = path.to_str().unwrap().as_bytes().to_vec();
    let config = small_config();

    // First instance: write data, back it up.
    let addr = spawn_server(&config).await;
    for i in 0..32 {
        request(
            addr,
            "POST",
            &format!("/nosql/stable{}", i),
            format!("payload{}", i).as_bytes(),
        )
        .await;
    }
    let (status, _) = request(addr, "POST", "/snapshot/backup", &path_body).await;
    assert_eq!(status, 200);

    // Second instance: fresh store, restore, verify.
    let addr2 = spawn_server(&config).await;
    let (status, _) = request(addr2, "GET", "/nosql/stable0", b"").await;
    assert_eq!(status, 404);

    let (status, _) = request(addr2, "POST", "/snapshot/restore", &path_body).await;
    assert_eq!(status, 200);

    for i in 0..32 {
        let (status, body) = request(addr2, "GET", &format!("/nosql/stable{}", i), b"").await;
        assert_eq!(status, 200);
        assert_eq!(body, format!("payload{}", i).into_bytes());
    }
}

#[tokio::test]
async fn snapshot_restore_missing_file_is_500_with_message() {
    let addr = spawn_server(&small_config()).await;

    let (status, body) = request(addr, "POST", "/snapshot/restore", b"/no/such/file.bin").await;
    assert_eq!(status, 500);
    assert!(!body.is_empty());
}

#[tokio::test]
async fn cache_colliding_keys_both_served() {
    // "Aa" and "BB" collide in the cache hash; both must round-trip.
    let addr = spawn_server(&small_config()).await;

    request(addr, "POST", "/nosql/Aa", b"first").await;
    request(addr, "POST", "/nosql/BB", b"second").await;

    let (_, body) = request(addr, "GET", "/nosql/Aa", b"").await;
    assert_eq!(body, b"first");
    let (_, body) = request(addr, "GET", "/nosql/BB", b"").await;
    assert_eq!(body, b"second");
}
