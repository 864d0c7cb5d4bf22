//! reqwest-based transport

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, TransportError};
use crate::headers::HeaderCollection;
use crate::request::{Method, Request};
use crate::transport::{Transport, TransportResponse};

/// Connection details reqwest reports for a completed exchange
///
/// Available through [`Response::artifact`](crate::Response::artifact).
#[derive(Debug, Clone)]
pub struct ReqwestArtifact {
    /// Protocol version negotiated
    pub version: reqwest::Version,
    /// Peer address, when known
    pub remote_addr: Option<SocketAddr>,
    /// Final URL after redirects
    pub final_url: url::Url,
}

/// [`Transport`] backed by [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    /// Create a new transport with default settings
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Create a new transport builder
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Create a transport from a reqwest::Client
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .inner
            .request(to_reqwest_method(request.method), request.url.as_str());

        for (name, values) in request.headers.iter() {
            for value in values {
                builder = builder.header(name, value.as_str());
            }
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .fold(HeaderCollection::new(), |headers, (name, value)| {
                headers.append(
                    name.as_str(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            });
        let artifact = ReqwestArtifact {
            version: response.version(),
            remote_addr: response.remote_addr(),
            final_url: response.url().clone(),
        };
        let body = response.bytes().await?.to_vec();

        Ok(TransportResponse::new(status, body)
            .with_headers(headers)
            .with_artifact(artifact))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::timeout(err)
        } else if err.is_connect() {
            TransportError::connection(err)
        } else {
            TransportError::other(err)
        }
    }
}

/// Builder for configuring proxy, timeout and TLS settings
#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    accept_invalid_certs: bool,
    proxy: Option<ProxyConfig>,
    timeout: Option<Duration>,
}

#[derive(Debug)]
struct ProxyConfig {
    url: url::Url,
    matcher: Option<regex::Regex>,
}

impl ReqwestTransportBuilder {
    /// Accept invalid TLS certificates
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set a proxy URL
    pub fn proxy(mut self, url: url::Url) -> Self {
        self.proxy = Some(ProxyConfig { url, matcher: None });
        self
    }

    /// Set a proxy URL used only for hosts matching `pattern`
    pub fn proxy_with_matcher(mut self, url: url::Url, pattern: &str) -> Result<Self, Error> {
        let matcher = regex::Regex::new(pattern)
            .map_err(|e| Error::Config(format!("Invalid proxy pattern: {}", e)))?;
        self.proxy = Some(ProxyConfig {
            url,
            matcher: Some(matcher),
        });
        Ok(self)
    }

    /// Total time allowed for a request, surfaced as a timeout transport error
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the transport
    pub fn build(self) -> Result<ReqwestTransport, Error> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(self.accept_invalid_certs);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(proxy_config) = self.proxy {
            let proxy_url = proxy_config.url.to_string();
            let proxy = if let Some(matcher) = proxy_config.matcher {
                reqwest::Proxy::custom(move |url| {
                    if matcher.is_match(url.host_str().unwrap_or("")) {
                        Some(proxy_url.clone())
                    } else {
                        None
                    }
                })
            } else {
                reqwest::Proxy::all(&proxy_url).map_err(|e| Error::Config(e.to_string()))?
            };
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Client build error: {}", e)))?;
        Ok(ReqwestTransport { inner: client })
    }
}
