//! bitreq-based transport

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bitreq::RequestExt;

use crate::error::{Error, TransportError};
use crate::headers::HeaderCollection;
use crate::request::{Method, Request};
use crate::transport::{Transport, TransportResponse};

/// Connections kept by the bitreq client
const CONNECTION_CACHE_SIZE: usize = 10;

/// Details bitreq reports for a completed exchange
///
/// Available through [`Response::artifact`](crate::Response::artifact).
#[derive(Debug, Clone)]
pub struct BitreqArtifact {
    /// Reason phrase from the status line
    pub reason_phrase: String,
    /// Final URL after redirects
    pub final_url: String,
}

/// [`Transport`] backed by [`bitreq`]
#[derive(Clone)]
pub struct BitreqTransport {
    client: Arc<bitreq::Client>,
    proxy: Option<bitreq::Proxy>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for BitreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitreqTransport")
            .field("proxy", &self.proxy.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Default for BitreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl BitreqTransport {
    /// Create a new transport
    pub fn new() -> Self {
        if rustls::crypto::CryptoProvider::get_default().is_none() {
            let _ = rustls::crypto::ring::default_provider().install_default();
        }

        Self {
            client: Arc::new(bitreq::Client::new(CONNECTION_CACHE_SIZE)),
            proxy: None,
            timeout: None,
        }
    }

    /// Route every request through an HTTP proxy
    pub fn with_proxy(mut self, proxy: url::Url) -> Result<Self, Error> {
        let proxy = bitreq::Proxy::new_http(proxy)
            .map_err(|e| Error::Config(format!("Invalid proxy: {}", e)))?;
        self.proxy = Some(proxy);
        Ok(self)
    }

    /// Per-request timeout, rounded up to whole seconds
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn prepare_request(&self, request: Request) -> bitreq::Request {
        let url = request.url.as_str();
        let mut prepared = match request.method {
            Method::Get => bitreq::get(url),
            Method::Post => bitreq::post(url),
            Method::Put => bitreq::put(url),
            Method::Patch => bitreq::patch(url),
            Method::Delete => bitreq::delete(url),
        };

        for (name, values) in request.headers.iter() {
            // bitreq keeps one value per name
            prepared = prepared.with_header(name, values.join(", "));
        }
        if let Some(body) = request.body {
            prepared = prepared.with_body(body);
        }
        if let Some(timeout) = self.timeout {
            let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
            prepared = prepared.with_timeout(secs);
        }
        if let Some(proxy) = &self.proxy {
            prepared = prepared.with_proxy(proxy.clone());
        }
        prepared
    }
}

#[async_trait]
impl Transport for BitreqTransport {
    async fn send(&self, request: Request) -> Result<TransportResponse, TransportError> {
        let response = self
            .prepare_request(request)
            .send_async_with_client(&self.client)
            .await?;

        let status = u16::try_from(response.status_code).map_err(|_| {
            TransportError::other(format!("invalid status code {}", response.status_code))
        })?;
        let mut pairs: Vec<(&String, &String)> = response.headers.iter().collect();
        pairs.sort();
        let headers: HeaderCollection = pairs
            .into_iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let artifact = BitreqArtifact {
            reason_phrase: response.reason_phrase.clone(),
            final_url: response.url.clone(),
        };

        Ok(TransportResponse::new(status, response.into_bytes())
            .with_headers(headers)
            .with_artifact(artifact))
    }
}

impl From<bitreq::Error> for TransportError {
    fn from(err: bitreq::Error) -> Self {
        use std::io;

        use bitreq::Error;

        match err {
            Error::IoError(io_err) => {
                if io_err.kind() == io::ErrorKind::TimedOut {
                    TransportError::timeout(io_err)
                } else if io_err.kind() == io::ErrorKind::ConnectionRefused
                    || io_err.kind() == io::ErrorKind::ConnectionReset
                    || io_err.kind() == io::ErrorKind::ConnectionAborted
                    || io_err.kind() == io::ErrorKind::NotConnected
                {
                    TransportError::connection(io_err)
                } else {
                    TransportError::other(io_err)
                }
            }
            Error::AddressNotFound => TransportError::connection(err.to_string()),
            _ => TransportError::other(err.to_string()),
        }
    }
}
