//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use secret_tx::config::PipelineConfig;

/// Private key whose 32 bytes double as the encryption seed `[0x11; 32]`.
pub const TEST_PRIVATE_KEY: &str =
    "1111111111111111111111111111111111111111111111111111111111111111";

pub const CONTRACT_A: &str = "secret1qqqsyqcyq5rqwzqfpg9scrgwpugpzysnpn9nv9";
pub const CONTRACT_B: &str = "secret1m6kmam774klwlh4dhmhaatd7al02m0h0rhmwyz";
pub const CODE_HASH: &str = "9a00ca4ad505e9be7e6e6dddf8d939b7ec7e9ac8e109c8681f10db9cacb36d42";

/// A request as seen by the mock LCD.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    /// Path including any query string.
    pub path: String,
    pub body: String,
}

impl MockRequest {
    /// Path without the query string.
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }

    pub fn query_param(&self, key: &str) -> Option<String> {
        let query = self.path.split_once('?')?.1;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

/// Handle to a running mock LCD.
#[derive(Clone)]
pub struct MockLcd {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockLcd {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose path starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .count()
    }
}

/// Start a programmable mock LCD on an ephemeral port.
///
/// The handler sees every request and returns `(status, body)`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockLcd
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let log = requests.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let log = log.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        log.lock().unwrap().push(request.clone());

                        let (status, body) = f(request).await;
                        let reason = reqwest::StatusCode::from_u16(status)
                            .ok()
                            .and_then(|code| code.canonical_reason())
                            .unwrap_or_else(|| panic!("no reason phrase for status {}", status));

                        let response_str = format!(
                            "HTTP/1.1 {} {}\r\n\
                             Content-Type: application/json\r\n\
                             Content-Length: {}\r\n\
                             Connection: close\r\n\r\n{}",
                            status,
                            reason,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockLcd { addr, requests }
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).into_owned();

    Some(MockRequest { method, path, body })
}

/// Config pointing at `lcd` with short confirmation timings.
pub fn test_config(lcd: &MockLcd) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.lcd.url = lcd.url();
    config.lcd.request_timeout_secs = 5;
    config.network.chain_id = Some("secret-4".to_string());
    config.confirmation.initial_delay_ms = 10;
    config.confirmation.poll_interval_ms = 10;
    config.confirmation.max_attempts = 4;
    config.confirmation.budget_secs = 10;
    config.operation.timeout_secs = 20;
    config
}

pub fn account_body(account_number: u64, sequence: u64) -> String {
    serde_json::json!({
        "account": {
            "@type": "/cosmos.auth.v1beta1.BaseAccount",
            "address": "secret1...",
            "pub_key": null,
            "account_number": account_number.to_string(),
            "sequence": sequence.to_string()
        }
    })
    .to_string()
}

pub fn not_found_body() -> String {
    r#"{"code":5,"message":"not found","details":[]}"#.to_string()
}
