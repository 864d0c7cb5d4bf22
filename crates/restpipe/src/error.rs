//! Error types

use std::fmt;

use thiserror::Error;

use crate::headers::HeaderCollection;
use crate::request::Method;
use crate::urls::AbsoluteUrl;

/// Boxed cause carried by a [`TransportError`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the request pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed base or relative URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// A singular header was set twice
    #[error("Header conflict: {0} is already set")]
    HeaderConflict(String),
    /// Header name or value not allowed on the wire
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// The adapter cannot handle the requested type
    #[error("Unsupported type for {adapter} adapter: {type_name}")]
    UnsupportedType {
        /// Adapter name
        adapter: &'static str,
        /// Rust type name
        type_name: &'static str,
    },
    /// Encoding or decoding failed inside an adapter
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// No response was obtained
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    /// A response was obtained but its status indicates failure
    #[error(transparent)]
    Status(Box<HttpStatusError>),
    /// The call was cancelled while waiting on the transport
    #[error("Request cancelled")]
    Cancelled,
    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Only transport failures are worth retrying; everything else is either a
    /// usage error or a definitive answer from the server.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// The status error, if this is one
    pub fn as_status(&self) -> Option<&HttpStatusError> {
        match self {
            Error::Status(err) => Some(&**err),
            _ => None,
        }
    }

    /// HTTP status code, if a response was received
    pub fn status(&self) -> Option<u16> {
        self.as_status().map(HttpStatusError::status)
    }
}

impl From<HttpStatusError> for Error {
    fn from(err: HttpStatusError) -> Self {
        Error::Status(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// A response whose status falls outside the client's success range
///
/// The raw body is kept as received so the caller can decode its own error
/// shape with the same adapter that would have decoded a success body.
#[derive(Debug, Clone, Error)]
#[error("HTTP error ({status}) from {method} {url}")]
pub struct HttpStatusError {
    status: u16,
    method: Method,
    url: AbsoluteUrl,
    headers: HeaderCollection,
    body: Vec<u8>,
}

impl HttpStatusError {
    pub(crate) fn new(
        status: u16,
        method: Method,
        url: AbsoluteUrl,
        headers: HeaderCollection,
        body: Vec<u8>,
    ) -> Self {
        Self {
            status,
            method,
            url,
            headers,
            body,
        }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Verb of the failed call
    pub fn method(&self) -> Method {
        self.method
    }

    /// URL of the failed call
    pub fn url(&self) -> &AbsoluteUrl {
        &self.url
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderCollection {
        &self.headers
    }

    /// Raw error body, possibly empty
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Error body decoded as UTF-8, replacing invalid sequences
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Take ownership of the raw error body
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Broad category of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, reset or DNS failure
    Connection,
    /// The transport gave up waiting
    Timeout,
    /// Anything else
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Connection => write!(f, "connection failed"),
            TransportErrorKind::Timeout => write!(f, "timed out"),
            TransportErrorKind::Other => write!(f, "request failed"),
        }
    }
}

/// Failure raised by a [`Transport`](crate::Transport) before any status was received
#[derive(Debug, Error)]
#[error("{kind}: {source}")]
pub struct TransportError {
    kind: TransportErrorKind,
    source: BoxError,
}

impl TransportError {
    /// Create a transport error of the given kind
    pub fn new(kind: TransportErrorKind, cause: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: cause.into(),
        }
    }

    /// Connection-level failure
    pub fn connection(cause: impl Into<BoxError>) -> Self {
        Self::new(TransportErrorKind::Connection, cause)
    }

    /// Timeout
    pub fn timeout(cause: impl Into<BoxError>) -> Self {
        Self::new(TransportErrorKind::Timeout, cause)
    }

    /// Any other failure
    pub fn other(cause: impl Into<BoxError>) -> Self {
        Self::new(TransportErrorKind::Other, cause)
    }

    /// Failure category
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Underlying cause
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.source.as_ref()
    }
}
