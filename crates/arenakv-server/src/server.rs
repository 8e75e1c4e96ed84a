//! TCP listener and per-connection handling.
//!
//! One request per connection: read the head, read the body, run the
//! handler under the store lock, write the response, close the socket.
//! Store operations are synchronous and serialized by a single mutex, so
//! every operation runs to completion before the next begins.

use crate::handler;
use crate::request::{parse_head, Request};
use crate::response::Response;
use arenakv_common::{KvError, Result, ServerConfig};
use arenakv_core::Store;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Upper bound on the request head; anything bigger is rejected.
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// TCP server for the ArenaKV protocol.
pub struct Server {
    listener: TcpListener,
    store: Arc<Mutex<Store>>,
}

impl Server {
    /// Binds the listener.
    pub async fn bind(config: &ServerConfig, store: Arc<Mutex<Store>>) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "server listening");
        Ok(Self { listener, store })
    }

    /// The bound address (useful when the configured port was 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the task is dropped.
    pub async fn serve(self) -> Result<()> {
        loop {
            let (stream, remote) = self.listener.accept().await?;
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                if let Err(error) = handle_connection(stream, store).await {
                    tracing::warn!(remote = %remote, %error, "connection error");
                }
            });
        }
    }
}

async fn handle_connection(mut stream: TcpStream, store: Arc<Mutex<Store>>) -> Result<()> {
    let response = match read_request(&mut stream).await {
        Ok(request) => {
            tracing::debug!(
                method = %request.method,
                plugin = %request.plugin,
                param = %request.param,
                "request"
            );
            handler::handle(&store, &request)
        }
        Err(error) => {
            tracing::debug!(%error, "rejecting request");
            Response::not_implemented()
        }
    };

    stream.write_all(&response.to_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Reads one request from the socket.
///
/// Buffers until the blank line terminating the head, then reads body
/// bytes: up to `Content-Length` when the header was present, otherwise
/// whatever already arrived with the head.
async fn read_request(stream: &mut TcpStream) -> Result<Request> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(at) = find_blank_line(&buffer) {
            break at;
        }
        if buffer.len() > MAX_HEAD_BYTES {
            return Err(KvError::MalformedRequest("request head too large".to_string()));
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(KvError::MalformedRequest(
                "connection closed before request head".to_string(),
            ));
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let head = parse_head(&buffer[..head_end])?;
    let mut body = buffer.split_off(head_end + 4);

    if let Some(length) = head.content_length {
        while body.len() < length {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(length);
    }

    Ok(Request {
        method: head.method,
        plugin: head.plugin,
        param: head.param,
        body,
    })
}

/// Offset of the first `\r\n\r\n`, if buffered.
fn find_blank_line(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}
