//! Minimal HTTP/1.1 stub standing in for the Steam endpoints.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    dead_code
)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use steamwatch_upstream::SteamClientConfig;
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::{TcpListener, TcpStream};

/// One request as the stub received it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path plus query string.
    pub target: String,
    pub body: String,
}

impl Recorded {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn query(&self) -> &str {
        self.target.split_once('?').map_or("", |(_, query)| query)
    }
}

/// How the stub answers one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Status line code and a body sent as `application/json`.
    Json(u16, String),
    /// Read the request and never answer.
    Hang,
}

impl Reply {
    pub fn ok(body: serde_json::Value) -> Self {
        Self::Json(200, body.to_string())
    }
}

type Responder = dyn Fn(&Recorded) -> Reply + Send + Sync;

/// Local listener that records requests and answers them from a closure.
pub struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    pub async fn start(respond: impl Fn(&Recorded) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let log = Arc::clone(&log);
                let respond = Arc::clone(&respond);
                tokio::spawn(async move { serve(stream, &log, respond.as_ref()).await });
            }
        });

        Self { base_url, requests }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Client settings pointing every Steam endpoint at this stub. Store
    /// calls land under `/store`.
    pub fn client_config(&self, api_key: Option<&str>) -> SteamClientConfig {
        SteamClientConfig {
            web_api_url: self.base_url.clone(),
            store_api_url: format!("{}/store", self.base_url),
            api_key: api_key.map(ToOwned::to_owned),
            request_timeout: Duration::from_secs(5),
        }
    }
}

async fn serve(mut stream: TcpStream, log: &Mutex<Vec<Recorded>>, respond: &Responder) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };
    log.lock().unwrap().push(request.clone());

    match respond(&request) {
        Reply::Json(status, body) => {
            let head = format!(
                "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes()).await;
            let _ = stream.write_all(body.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        Reply::Hang => {
            std::future::pending::<()>().await;
        }
    }
}

async fn read_request(stream: &mut TcpStream) -> Option<Recorded> {
    let mut raw = Vec::new();
    let mut chunk = [0_u8; 1024];
    let header_end = loop {
        if let Some(at) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break at + 4;
        }
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            return None;
        }
        raw.extend_from_slice(&chunk[..read]);
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).into_owned();
    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_owned();
    let target = request_line.next()?.to_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while raw.len() < header_end + content_length {
        let read = stream.read(&mut chunk).await.ok()?;
        if read == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..read]);
    }
    let body = String::from_utf8_lossy(&raw[header_end..]).into_owned();

    Some(Recorded {
        method,
        target,
        body,
    })
}
