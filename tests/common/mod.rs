//! Loopback HTTP server standing in for both the search engine and the image hosts.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image_search_downloader::SearchEngine;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Path the results page is served under.
pub const SEARCH_PATH: &str = "/search";

#[derive(Debug, Clone)]
pub enum Route {
    /// `200 OK` with the given body.
    Body(Vec<u8>),
    /// Empty response with the given status.
    Status(u16),
    /// Announces `declared` bytes, sends `sent` and closes the connection.
    Truncated { declared: usize, sent: Vec<u8> },
    /// Announces `declared` bytes, sends `sent` and then goes quiet without closing.
    Hang { declared: usize, sent: Vec<u8> },
}

pub struct TestServer {
    addr: SocketAddr,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    connections: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Binds a free port and serves the routes built by `routes`, which receives the server's
    /// base URL so pages can link back to it.
    pub async fn start<F>(routes: F) -> Self
    where
        F: FnOnce(&str) -> Vec<(String, Route)>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let table: Arc<HashMap<String, Route>> =
            Arc::new(routes(&format!("http://{}", addr)).into_iter().collect());

        let hits = Arc::new(Mutex::new(HashMap::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let handle = tokio::spawn({
            let hits = hits.clone();
            let connections = connections.clone();
            async move {
                loop {
                    let Ok((stream, _)) = listener.accept().await else {
                        return;
                    };
                    connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(stream, table.clone(), hits.clone()));
                }
            }
        });

        Self {
            addr,
            hits,
            connections,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Engine whose results page is this server's [`SEARCH_PATH`].
    pub fn engine(&self) -> SearchEngine {
        SearchEngine {
            name: String::from("loopback"),
            base_url: format!("{}{}", self.base_url(), SEARCH_PATH),
            ..Default::default()
        }
    }

    /// Number of requests received for `path`, query string excluded.
    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    /// Number of requests received for any path starting with `prefix`.
    pub fn hits_under(&self, prefix: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(_, n)| n)
            .sum()
    }

    /// Number of accepted connections.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: Arc<HashMap<String, Route>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buf);
    let target = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let path = target.split('?').next().unwrap_or("/").to_string();

    *hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

    match routes.get(&path).cloned().unwrap_or(Route::Status(404)) {
        Route::Body(body) => {
            let _ = stream.write_all(&head_for(200, body.len())).await;
            let _ = stream.write_all(&body).await;
        }
        Route::Status(status) => {
            let _ = stream.write_all(&head_for(status, 0)).await;
        }
        Route::Truncated { declared, sent } => {
            let _ = stream.write_all(&head_for(200, declared)).await;
            let _ = stream.write_all(&sent).await;
            let _ = stream.flush().await;
        }
        Route::Hang { declared, sent } => {
            let _ = stream.write_all(&head_for(200, declared)).await;
            let _ = stream.write_all(&sent).await;
            let _ = stream.flush().await;
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }
    let _ = stream.shutdown().await;
}

fn head_for(status: u16, content_length: usize) -> Vec<u8> {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status, reason, content_length
    )
    .into_bytes()
}

/// Results page with one `div.rg_meta` element per payload, in order.
pub fn results_page(payloads: &[String]) -> Vec<u8> {
    let mut page = String::from("<!DOCTYPE html><html><head><title>results</title></head><body>");
    for (idx, payload) in payloads.iter().enumerate() {
        page.push_str(&format!(
            "<div class=\"rg_bx\"><img src=\"thumb{}.png\"><div class=\"rg_meta\">{}</div></div>",
            idx, payload
        ));
    }
    page.push_str("</body></html>");
    page.into_bytes()
}

/// Inline metadata pointing at `url`.
pub fn meta(url: &str) -> String {
    format!(
        "{{\"id\":\"x\",\"ou\":\"{}\",\"ow\":1920,\"oh\":1080,\"pt\":\"title\"}}",
        url
    )
}

/// Distinct body for image `name`, so saved files can be told apart.
pub fn image_bytes(name: &str) -> Vec<u8> {
    let mut bytes = b"\xff\xd8\xff\xe0".to_vec();
    bytes.extend_from_slice(name.as_bytes());
    bytes.extend(std::iter::repeat(0x42).take(2048));
    bytes
}
