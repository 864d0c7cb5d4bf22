//! REST client

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::adapter::{Deserializes, JsonAdapter, SerializationAdapter, Serializes};
use crate::error::Error;
use crate::headers::{HeaderCollection, CONTENT_TYPE};
use crate::options::{ClientBuilder, ClientOptions};
use crate::request::{Method, Request};
use crate::response::Response;
use crate::urls::{AbsoluteUrl, IntoRelativeUrl, RelativeUrl};

/// Typed REST client
///
/// Holds only immutable state behind an `Arc`; clones are cheap and any
/// number of calls may run concurrently on the same client.
#[derive(Debug)]
pub struct RestClient<A> {
    inner: Arc<ClientOptions<A>>,
}

impl<A> Clone for RestClient<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl RestClient<JsonAdapter> {
    /// Builder for a JSON client
    pub fn builder() -> ClientBuilder<JsonAdapter> {
        ClientBuilder::new(JsonAdapter::new())
    }
}

impl<A> RestClient<A>
where
    A: SerializationAdapter,
{
    /// Create a client from frozen options
    pub fn new(options: ClientOptions<A>) -> Self {
        Self {
            inner: Arc::new(options),
        }
    }

    /// Builder for a client using `adapter`
    pub fn builder_with(adapter: A) -> ClientBuilder<A> {
        ClientBuilder::new(adapter)
    }

    /// Options the client was built with
    pub fn options(&self) -> &ClientOptions<A> {
        &self.inner
    }

    /// Client name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Base URL
    pub fn base_url(&self) -> &AbsoluteUrl {
        &self.inner.base_url
    }

    /// Serialization adapter, also used to decode error bodies
    pub fn adapter(&self) -> &A {
        &self.inner.adapter
    }

    /// Decode `bytes` with the client's adapter
    ///
    /// Meant for bodies that never became a [`Response`], such as the raw body
    /// of an [`HttpStatusError`](crate::HttpStatusError).
    pub fn to_model_from<T>(&self, bytes: &[u8], headers: &HeaderCollection) -> Result<T, Error>
    where
        A: Deserializes<T>,
    {
        self.inner.adapter.deserialize(bytes, headers)
    }

    // === Verb methods ===

    /// GET `relative`
    pub async fn get(
        &self,
        relative: impl IntoRelativeUrl,
        headers: Option<HeaderCollection>,
    ) -> Result<Response<A>, Error> {
        self.request(Method::Get, relative)
            .headers(headers.unwrap_or_default())
            .send()
            .await
    }

    /// DELETE `relative`
    pub async fn delete(
        &self,
        relative: impl IntoRelativeUrl,
        headers: Option<HeaderCollection>,
    ) -> Result<Response<A>, Error> {
        self.request(Method::Delete, relative)
            .headers(headers.unwrap_or_default())
            .send()
            .await
    }

    /// POST `body` to `relative`
    pub async fn post<B>(
        &self,
        body: &B,
        relative: impl IntoRelativeUrl,
        headers: Option<HeaderCollection>,
    ) -> Result<Response<A>, Error>
    where
        B: ?Sized,
        A: Serializes<B>,
    {
        self.request(Method::Post, relative)
            .headers(headers.unwrap_or_default())
            .body(body)
            .send()
            .await
    }

    /// PUT `body` to `relative`
    pub async fn put<B>(
        &self,
        body: &B,
        relative: impl IntoRelativeUrl,
        headers: Option<HeaderCollection>,
    ) -> Result<Response<A>, Error>
    where
        B: ?Sized,
        A: Serializes<B>,
    {
        self.request(Method::Put, relative)
            .headers(headers.unwrap_or_default())
            .body(body)
            .send()
            .await
    }

    /// PATCH `relative` with `body`
    pub async fn patch<B>(
        &self,
        body: &B,
        relative: impl IntoRelativeUrl,
        headers: Option<HeaderCollection>,
    ) -> Result<Response<A>, Error>
    where
        B: ?Sized,
        A: Serializes<B>,
    {
        self.request(Method::Patch, relative)
            .headers(headers.unwrap_or_default())
            .body(body)
            .send()
            .await
    }

    /// POST to `relative` without a body
    pub async fn post_empty(
        &self,
        relative: impl IntoRelativeUrl,
        headers: Option<HeaderCollection>,
    ) -> Result<Response<A>, Error> {
        self.request(Method::Post, relative)
            .headers(headers.unwrap_or_default())
            .send()
            .await
    }

    /// PUT to `relative` without a body
    pub async fn put_empty(
        &self,
        relative: impl IntoRelativeUrl,
        headers: Option<HeaderCollection>,
    ) -> Result<Response<A>, Error> {
        self.request(Method::Put, relative)
            .headers(headers.unwrap_or_default())
            .send()
            .await
    }

    /// PATCH `relative` without a body
    pub async fn patch_empty(
        &self,
        relative: impl IntoRelativeUrl,
        headers: Option<HeaderCollection>,
    ) -> Result<Response<A>, Error> {
        self.request(Method::Patch, relative)
            .headers(headers.unwrap_or_default())
            .send()
            .await
    }

    // === Call builder ===

    /// Call builder for cases the verb methods don't cover (cancellation,
    /// headers added one at a time)
    pub fn request(&self, method: Method, relative: impl IntoRelativeUrl) -> CallBuilder<'_, A> {
        let (relative, error) = match relative.into_relative_url() {
            Ok(relative) => (relative, None),
            Err(err) => (RelativeUrl::EMPTY, Some(err)),
        };
        CallBuilder {
            client: self,
            method,
            relative,
            headers: HeaderCollection::new(),
            body: None,
            error,
            cancellation: None,
        }
    }

    async fn execute(&self, call: Call) -> Result<Response<A>, Error> {
        let options = &*self.inner;

        let mut headers = options.default_headers.clone().merge(call.headers);
        if call.body.is_some() && !headers.contains(CONTENT_TYPE) {
            if let Some(media_type) = options.adapter.media_type() {
                headers = headers.with_content_type(media_type)?;
            }
        }
        headers.validate()?;
        tracing::trace!(
            "[{}] {} request headers after merge",
            options.name,
            headers.len()
        );

        let url = options.base_url.join(&call.relative);
        let request = Request {
            method: call.method,
            url: url.clone(),
            headers,
            body: call.body,
        };

        tracing::debug!("[{}] {} {}", options.name, call.method, url);

        let sent = options.transport.send(request);
        let result = match call.cancellation {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!("[{}] {} {} cancelled", options.name, call.method, url);
                    return Err(Error::Cancelled);
                }
                result = sent => result,
            },
            None => sent.await,
        };

        let transport_response = result.map_err(|err| {
            tracing::warn!("[{}] {} {} failed: {}", options.name, call.method, url, err);
            Error::Transport(err)
        })?;

        let response = Response::new(
            call.method,
            url,
            transport_response,
            Arc::clone(&options.adapter),
            options.success_status,
        );
        tracing::debug!(
            "[{}] {} {} -> {} ({} bytes)",
            options.name,
            call.method,
            response.url(),
            response.status(),
            response.body().len()
        );

        if options.throw_on_failure && !response.is_success() {
            tracing::warn!(
                "[{}] {} {} returned failure status {}",
                options.name,
                call.method,
                response.url(),
                response.status()
            );
            return Err(response.into_status_error().into());
        }

        Ok(response)
    }
}

struct Call {
    method: Method,
    relative: RelativeUrl,
    headers: HeaderCollection,
    body: Option<Vec<u8>>,
    cancellation: Option<CancellationToken>,
}

/// Builder for a single call
///
/// Errors raised while building (bad relative URL, body that fails to
/// serialize) are held and returned by [`CallBuilder::send`].
#[derive(Debug)]
pub struct CallBuilder<'a, A> {
    client: &'a RestClient<A>,
    method: Method,
    relative: RelativeUrl,
    headers: HeaderCollection,
    body: Option<Vec<u8>>,
    error: Option<Error>,
    cancellation: Option<CancellationToken>,
}

impl<A> CallBuilder<'_, A>
where
    A: SerializationAdapter,
{
    /// Add a per-call header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers = self.headers.append(name, value);
        self
    }

    /// Merge per-call headers
    pub fn headers(mut self, headers: HeaderCollection) -> Self {
        self.headers = self.headers.merge(headers);
        self
    }

    /// Serialize `body` with the client's adapter
    pub fn body<B>(mut self, body: &B) -> Self
    where
        B: ?Sized,
        A: Serializes<B>,
    {
        match self.client.adapter().serialize(body) {
            Ok(bytes) => self.body = Some(bytes),
            Err(err) => self.error = Some(err),
        }
        self
    }

    /// Abort the call when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Send the call
    pub async fn send(self) -> Result<Response<A>, Error> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.client
            .execute(Call {
                method: self.method,
                relative: self.relative,
                headers: self.headers,
                body: self.body,
                cancellation: self.cancellation,
            })
            .await
    }
}
