//! HTTP response envelope

use std::any::Any;
use std::sync::Arc;

use crate::adapter::Deserializes;
use crate::error::{Error, HttpStatusError};
use crate::headers::HeaderCollection;
use crate::options::StatusRange;
use crate::request::Method;
use crate::transport::{TransportArtifact, TransportResponse};
use crate::urls::AbsoluteUrl;

/// Completed response with lazy typed access to the body
///
/// The raw body is kept for the lifetime of the response. [`Response::to_model`]
/// decodes it with the adapter the client was built with, every time it is
/// called; nothing is cached and the response is never modified.
#[derive(Debug, Clone)]
pub struct Response<A> {
    status: u16,
    method: Method,
    url: AbsoluteUrl,
    headers: HeaderCollection,
    body: Vec<u8>,
    artifact: Option<TransportArtifact>,
    adapter: Arc<A>,
    success: StatusRange,
}

impl<A> Response<A> {
    pub(crate) fn new(
        method: Method,
        url: AbsoluteUrl,
        response: TransportResponse,
        adapter: Arc<A>,
        success: StatusRange,
    ) -> Self {
        Self {
            status: response.status,
            method,
            url,
            headers: response.headers,
            body: response.body,
            artifact: response.artifact,
            adapter,
            success,
        }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Verb of the call that produced this response
    pub fn method(&self) -> Method {
        self.method
    }

    /// URL the request was sent to
    pub fn url(&self) -> &AbsoluteUrl {
        &self.url
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderCollection {
        &self.headers
    }

    /// Raw body bytes
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as UTF-8
    pub fn text(&self) -> Result<String, Error> {
        String::from_utf8(self.body.clone()).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Adapter captured when the response was created
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Check if the status is inside the client's success range
    pub fn is_success(&self) -> bool {
        self.success.contains(self.status)
    }

    /// Check if the response status is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response status is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Transport artifact, if the backend left one of type `T`
    pub fn artifact<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.artifact.as_ref()?.downcast_ref::<T>()
    }

    /// Decode the body into `T`
    ///
    /// Adapter errors are returned as-is.
    pub fn to_model<T>(&self) -> Result<T, Error>
    where
        A: Deserializes<T>,
    {
        self.adapter.deserialize(&self.body, &self.headers)
    }

    /// Turn a failure response into [`Error::Status`], passing success through
    pub fn error_for_status(self) -> Result<Self, Error> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_status_error().into())
        }
    }

    pub(crate) fn into_status_error(self) -> HttpStatusError {
        HttpStatusError::new(self.status, self.method, self.url, self.headers, self.body)
    }
}
