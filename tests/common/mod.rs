#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use api_brute::Transport;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    Fail(&'static str),
    /// Never answers.
    Hang,
    Panic,
}

/// Synthetic transport answering from a url -> reply table.
pub struct ScriptedTransport {
    replies: HashMap<String, Reply>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    answered: AtomicUsize,
    starts: Mutex<Vec<(String, Instant)>>,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedTransport {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = (String, Reply)>,
    {
        Self {
            replies: replies.into_iter().collect(),
            latency: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            answered: AtomicUsize::new(0),
            starts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn answered(&self) -> usize {
        self.answered.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.starts.lock().len()
    }

    /// Request start instants in issue order.
    pub fn start_times(&self) -> Vec<Instant> {
        self.starts.lock().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<u16, String> {
        self.starts.lock().push((url.to_string(), Instant::now()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let reply = self.replies.get(url).cloned().unwrap_or(Reply::Status(404));
        let result = match reply {
            Reply::Status(code) => Ok(code),
            Reply::Fail(msg) => Err(msg.to_string()),
            Reply::Hang => std::future::pending::<Result<u16, String>>().await,
            Reply::Panic => panic!("scripted transport blew up on {}", url),
        };
        self.answered.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Minimal HTTP/1.1 responder on an ephemeral port. Returns the base URL and
/// the request heads it received.
pub async fn spawn_responder(routes: &[(&str, u16)]) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let routes: Arc<HashMap<String, u16>> =
        Arc::new(routes.iter().map(|(p, s)| (p.to_string(), *s)).collect());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let seen_srv = seen.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else { break };
            let routes = routes.clone();
            let seen = seen_srv.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match sock.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&buf).into_owned();
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                seen.lock().push(head);

                let status = routes.get(&path).copied().unwrap_or(404);
                let mut resp = format!("HTTP/1.1 {} Scripted\r\nContent-Length: 0\r\nConnection: close\r\n", status);
                if (300..400).contains(&status) {
                    resp.push_str("Location: /admin\r\n");
                }
                resp.push_str("\r\n");
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });
    (base, seen)
}
