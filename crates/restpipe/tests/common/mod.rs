//! Shared test support: a scripted in-memory transport

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use restpipe::{Request, Transport, TransportError, TransportResponse};

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("restpipe=trace")
            .with_test_writer()
            .try_init();
    });
}

/// What the scripted transport does for one call
#[derive(Debug)]
pub enum Reply {
    Respond(TransportResponse),
    Fail(TransportError),
}

/// Header naming how long the echo transport waits before answering
pub const DELAY_HEADER: &str = "X-Delay-Ms";

/// Transport that records every request and plays back scripted replies
///
/// When the script runs out every call gets an empty 200, or an echo of the
/// request when built with [`ScriptedTransport::echo`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<Request>>>,
    delay: Option<Duration>,
    echo: bool,
}

/// Body returned by the echo transport
#[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, Vec<String>)>,
}

fn echo_response(request: &Request) -> TransportResponse {
    let echo = Echo {
        method: request.method.to_string(),
        path: request.url.path().to_string(),
        query: request.url.query().map(str::to_string),
        headers: request
            .headers
            .iter()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect(),
    };
    let body = serde_json::to_vec(&echo).expect("echo serializes");
    TransportResponse::new(200, body).with_headers(
        restpipe::HeaderCollection::new()
            .append("Content-Type", "application/json")
            .append("X-Echo-Path", echo.path),
    )
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every unscripted call with an [`Echo`] of its own request,
    /// after the delay named by [`DELAY_HEADER`]
    pub fn echo() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    pub fn respond(self, response: TransportResponse) -> Self {
        self.push(Reply::Respond(response))
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.push(Reply::Fail(error))
    }

    pub fn json(self, status: u16, body: &str) -> Self {
        self.respond(
            TransportResponse::new(status, body.as_bytes()).with_headers(
                restpipe::HeaderCollection::new()
                    .append("Content-Type", "application/json; charset=utf-8"),
            ),
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn push(self, reply: Reply) -> Self {
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .push_back(reply);
        self
    }

    /// Requests seen so far, in arrival order
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().expect("requests lock poisoned").clone()
    }

    pub fn last_request(&self) -> Request {
        self.requests()
            .pop()
            .expect("at least one request was sent")
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<TransportResponse, TransportError> {
        let per_call_delay = request
            .headers
            .first(DELAY_HEADER)
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis);
        let echoed = self.echo.then(|| echo_response(&request));
        self.requests
            .lock()
            .expect("requests lock poisoned")
            .push(request);

        if let Some(delay) = per_call_delay.or(self.delay) {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .lock()
            .expect("replies lock poisoned")
            .pop_front();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(error)) => Err(error),
            None => Ok(echoed.unwrap_or_else(|| TransportResponse::new(200, Vec::new()))),
        }
    }
}
