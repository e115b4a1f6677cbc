//! HTTP front end for the relay.
//!
//! Runs a `tiny_http` listener with a fixed pool of worker threads. Each
//! worker pulls requests off the shared listener and runs every
//! `POST /api/process` as an independent cycle.
//!
//! ## Routes
//!
//! - `POST /api/process` — `{"text": "..."}` in, `{"text": "..."}` out;
//!   cycle failures answer 500 with `{"detail": "..."}`
//! - `GET /health` — `ok`
//! - `OPTIONS *` — CORS preflight (when enabled)
//! - anything else — 404

use anon_config::ServerConfig;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::logging::{event_names, generate_request_id, request_span};
use crate::runtime::Relay;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// How often idle workers check the shutdown flag.
const ACCEPT_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
struct ProcessRequest {
    text: String,
}

#[derive(Debug, Serialize)]
struct ProcessResponse<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    detail: &'a str,
}

/// Running relay server. Dropping it stops the workers.
pub struct RelayServer {
    server: Arc<tiny_http::Server>,
    shutdown: Arc<AtomicBool>,
    workers: Vec<thread::JoinHandle<()>>,
    addr: SocketAddr,
}

impl RelayServer {
    /// Bind the listener and start the worker threads.
    pub fn start(config: &ServerConfig, relay: Arc<Relay>) -> Result<Self, String> {
        let requested: SocketAddr = config
            .address()
            .parse()
            .map_err(|e| format!("invalid bind address {}: {}", config.address(), e))?;

        let server = tiny_http::Server::http(requested)
            .map_err(|e| format!("failed to start server on {}: {}", requested, e))?;
        let addr = server.server_addr().to_ip().unwrap_or(requested);
        let server = Arc::new(server);

        let shutdown = Arc::new(AtomicBool::new(false));
        let worker_count = config.workers.max(1);
        let mut workers = Vec::with_capacity(worker_count);

        for i in 0..worker_count {
            let server = Arc::clone(&server);
            let relay = Arc::clone(&relay);
            let shutdown = Arc::clone(&shutdown);
            let cors = config.cors;
            let handle = thread::Builder::new()
                .name(format!("anon-worker-{}", i))
                .spawn(move || serve_loop(&server, &relay, &shutdown, cors))
                .map_err(|e| format!("failed to spawn worker thread: {}", e))?;
            workers.push(handle);
        }

        info!(
            event = event_names::SERVER_STARTED,
            addr = %addr,
            workers = worker_count,
            cors = config.cors,
            transformer = relay.transformer_name(),
            "relay server started"
        );

        Ok(Self {
            server,
            shutdown,
            workers,
            addr,
        })
    }

    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Block until every worker exits.
    pub fn wait(mut self) {
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }

    /// Stop accepting requests and join the workers.
    pub fn shutdown(mut self) {
        self.stop();
        info!(event = event_names::SERVER_STOPPED, "relay server stopped");
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for _ in 0..self.workers.len() {
            self.server.unblock();
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn serve_loop(server: &tiny_http::Server, relay: &Relay, shutdown: &AtomicBool, cors: bool) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let request = match server.recv_timeout(ACCEPT_TIMEOUT) {
            Ok(Some(req)) => req,
            Ok(None) => continue,
            Err(e) => {
                if !shutdown.load(Ordering::SeqCst) {
                    error!(error = %e, "server accept error");
                }
                break;
            }
        };

        if shutdown.load(Ordering::SeqCst) {
            let _ = request
                .respond(tiny_http::Response::from_string("shutting down").with_status_code(503));
            break;
        }

        handle_request(request, relay, cors);
    }
}

/// Route and answer a single request.
fn handle_request(mut request: tiny_http::Request, relay: &Relay, cors: bool) {
    let request_id = generate_request_id();
    let span = request_span(&request_id);
    let _enter = span.enter();

    let method = request.method().clone();
    // Ignore any query string when routing.
    let path = request
        .url()
        .split('?')
        .next()
        .unwrap_or_default()
        .to_string();
    debug!(
        event = event_names::REQUEST_RECEIVED,
        method = %method,
        path = %path,
        "request received"
    );

    let (status, body, content_type) = match (&method, path.as_str()) {
        (tiny_http::Method::Post, "/api/process") => {
            let (status, body) = process_body(&mut request, relay);
            (status, body, "application/json")
        }
        (tiny_http::Method::Get, "/health") | (tiny_http::Method::Get, "/healthz") => {
            (200, "ok".to_string(), "text/plain; charset=utf-8")
        }
        (tiny_http::Method::Options, _) if cors => (204, String::new(), "text/plain; charset=utf-8"),
        _ => (404, detail_json("Not Found"), "application/json"),
    };

    let mut response = tiny_http::Response::from_string(body).with_status_code(status);
    if let Some(h) = header("Content-Type", content_type) {
        response.add_header(h);
    }
    if let Some(h) = header("X-Request-Id", &request_id) {
        response.add_header(h);
    }
    if cors {
        for (name, value) in [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
            ("Access-Control-Allow-Headers", "*"),
        ] {
            if let Some(h) = header(name, value) {
                response.add_header(h);
            }
        }
    }

    if let Err(e) = request.respond(response) {
        warn!(error = %e, "failed to send response");
    }
}

/// Run one cycle over a `/api/process` body. Returns status and JSON body.
fn process_body(request: &mut tiny_http::Request, relay: &Relay) -> (u16, String) {
    let mut raw = String::new();
    if let Err(e) = request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_string(&mut raw)
    {
        warn!(event = event_names::REQUEST_REJECTED, error = %e, "unreadable body");
        return (400, detail_json("request body must be UTF-8 text"));
    }
    if raw.len() as u64 > MAX_BODY_BYTES {
        warn!(event = event_names::REQUEST_REJECTED, "body too large");
        return (413, detail_json("request body too large"));
    }

    let parsed: ProcessRequest = match serde_json::from_str(&raw) {
        Ok(p) => p,
        Err(e) => {
            warn!(event = event_names::REQUEST_REJECTED, error = %e, "malformed body");
            return (422, detail_json(&format!("invalid request body: {}", e)));
        }
    };

    match relay.process(&parsed.text) {
        Ok(outcome) => {
            info!(
                event = event_names::CYCLE_FINISHED,
                spans = outcome.spans_detected,
                restored = outcome.restored,
                unresolved = outcome.unresolved.len(),
                "cycle finished"
            );
            let body = serde_json::to_string(&ProcessResponse {
                text: &outcome.text,
            })
            .unwrap_or_default();
            (200, body)
        }
        Err(e) => {
            // No partial text is ever returned.
            error!(
                event = event_names::CYCLE_FAILED,
                kind = %e.kind(),
                error = %e,
                "cycle failed"
            );
            (500, detail_json(&e.to_string()))
        }
    }
}

fn detail_json(detail: &str) -> String {
    serde_json::to_string(&ErrorResponse { detail }).unwrap_or_default()
}

fn header(name: &str, value: &str) -> Option<tiny_http::Header> {
    tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}
