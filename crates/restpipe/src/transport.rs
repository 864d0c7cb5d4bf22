//! Transport trait
//!
//! The client never opens connections itself. A [`Transport`] takes a fully
//! built [`Request`] and returns the status, headers and complete body, or a
//! [`TransportError`] when no response was obtained. Retries, tracing of the
//! raw exchange and similar concerns are expressed as transports wrapping
//! other transports.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::headers::HeaderCollection;
use crate::request::Request;

/// Backend specific value kept alongside a response for advanced inspection
pub type TransportArtifact = Arc<dyn Any + Send + Sync>;

/// What a transport returns for a completed exchange
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderCollection,
    /// Complete response body
    pub body: Vec<u8>,
    /// Backend specific artifact
    pub artifact: Option<TransportArtifact>,
}

impl TransportResponse {
    /// Response with the given status and body and no headers
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderCollection::new(),
            body: body.into(),
            artifact: None,
        }
    }

    /// Attach headers
    pub fn with_headers(mut self, headers: HeaderCollection) -> Self {
        self.headers = headers;
        self
    }

    /// Attach an artifact
    pub fn with_artifact<T: Any + Send + Sync>(mut self, artifact: T) -> Self {
        self.artifact = Some(Arc::new(artifact));
        self
    }
}

/// Sends requests over the wire
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Send `request` and wait for the complete response
    async fn send(&self, request: Request) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: Request) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: Request) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}
