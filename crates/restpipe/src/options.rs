//! Client options and builder

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapter::SerializationAdapter;
use crate::client::RestClient;
use crate::error::Error;
use crate::headers::HeaderCollection;
use crate::settings::ClientSettings;
use crate::transport::Transport;
use crate::urls::AbsoluteUrl;

/// Inclusive range of status codes treated as success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStatusRange")]
pub struct StatusRange {
    min: u16,
    max: u16,
}

#[derive(Deserialize)]
struct RawStatusRange {
    min: u16,
    max: u16,
}

impl TryFrom<RawStatusRange> for StatusRange {
    type Error = Error;

    fn try_from(raw: RawStatusRange) -> Result<Self, Self::Error> {
        StatusRange::new(raw.min, raw.max)
    }
}

impl StatusRange {
    /// `200..=299`
    pub const SUCCESS: StatusRange = StatusRange { min: 200, max: 299 };

    /// Build a range; both ends must be valid status codes and `min <= max`
    pub fn new(min: u16, max: u16) -> Result<Self, Error> {
        if !(100..=599).contains(&min) || !(100..=599).contains(&max) || min > max {
            return Err(Error::Config(format!(
                "invalid success status range {min}..={max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Lowest success status
    pub fn min(&self) -> u16 {
        self.min
    }

    /// Highest success status
    pub fn max(&self) -> u16 {
        self.max
    }

    /// Whether `status` counts as success
    pub fn contains(&self, status: u16) -> bool {
        (self.min..=self.max).contains(&status)
    }
}

impl Default for StatusRange {
    fn default() -> Self {
        Self::SUCCESS
    }
}

/// Immutable configuration a [`RestClient`] is built from
#[derive(Debug)]
pub struct ClientOptions<A> {
    pub(crate) name: String,
    pub(crate) base_url: AbsoluteUrl,
    pub(crate) default_headers: HeaderCollection,
    pub(crate) adapter: Arc<A>,
    pub(crate) throw_on_failure: bool,
    pub(crate) success_status: StatusRange,
    pub(crate) transport: Arc<dyn Transport>,
}

impl<A> ClientOptions<A> {
    /// Client name, used in logs
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL every relative URL is joined onto
    pub fn base_url(&self) -> &AbsoluteUrl {
        &self.base_url
    }

    /// Headers sent with every call
    pub fn default_headers(&self) -> &HeaderCollection {
        &self.default_headers
    }

    /// Serialization adapter
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Whether failure statuses are returned as [`Error::Status`]
    pub fn throw_on_failure(&self) -> bool {
        self.throw_on_failure
    }

    /// Statuses considered successful
    pub fn success_status(&self) -> StatusRange {
        self.success_status
    }

    /// Transport in use
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

/// Builder for [`ClientOptions`] and [`RestClient`]
#[derive(Debug)]
pub struct ClientBuilder<A> {
    name: String,
    base_url: Option<AbsoluteUrl>,
    default_headers: HeaderCollection,
    adapter: A,
    throw_on_failure: bool,
    success_status: StatusRange,
    transport: Option<Arc<dyn Transport>>,
    timeout: Option<Duration>,
    error: Option<Error>,
}

impl<A> ClientBuilder<A>
where
    A: SerializationAdapter,
{
    /// Start a builder around `adapter`
    pub fn new(adapter: A) -> Self {
        Self {
            name: "default".to_string(),
            base_url: None,
            default_headers: HeaderCollection::new(),
            adapter,
            throw_on_failure: true,
            success_status: StatusRange::SUCCESS,
            transport: None,
            timeout: None,
            error: None,
        }
    }

    /// Name the client
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Parse and set the base URL
    ///
    /// A parse failure is reported by [`ClientBuilder::build`].
    pub fn base_url(mut self, url: &str) -> Self {
        match AbsoluteUrl::parse(url) {
            Ok(url) => self.base_url = Some(url),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Set an already parsed base URL
    pub fn base(mut self, url: AbsoluteUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Add a header sent with every call
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers = self.default_headers.append(name, value);
        self
    }

    /// Merge `headers` into the default headers
    pub fn default_headers(mut self, headers: HeaderCollection) -> Self {
        self.default_headers = self.default_headers.merge(headers);
        self
    }

    /// Replace the adapter
    pub fn adapter(mut self, adapter: A) -> Self {
        self.adapter = adapter;
        self
    }

    /// Return failure statuses as [`Error::Status`] (default `true`)
    pub fn throw_on_failure(mut self, throw: bool) -> Self {
        self.throw_on_failure = throw;
        self
    }

    /// Statuses considered successful (default `200..=299`)
    pub fn success_status(mut self, range: StatusRange) -> Self {
        self.success_status = range;
        self
    }

    /// Use `transport` to send requests
    pub fn transport<T>(self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.shared_transport(Arc::new(transport))
    }

    /// Use a transport shared with other clients
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Timeout applied to the bundled transport when none was supplied
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Apply loaded settings on top of the current builder state
    pub fn settings(mut self, settings: &ClientSettings) -> Self {
        if let Some(base_url) = &settings.base_url {
            self.base_url = Some(base_url.clone());
        }
        for (name, value) in &settings.default_headers {
            self.default_headers = self.default_headers.replace(name.as_str(), value.as_str());
        }
        self.throw_on_failure = settings.throw_on_failure;
        self.success_status = settings.success_status;
        if let Some(secs) = settings.timeout_secs {
            self.timeout = Some(Duration::from_secs(secs));
        }
        self
    }

    /// Validate and freeze the options
    pub fn build_options(self) -> Result<ClientOptions<A>, Error> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config(format!("client {} has no base URL", self.name)))?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(self.timeout)?,
        };

        Ok(ClientOptions {
            name: self.name,
            base_url,
            default_headers: self.default_headers,
            adapter: Arc::new(self.adapter),
            throw_on_failure: self.throw_on_failure,
            success_status: self.success_status,
            transport,
        })
    }

    /// Build the client
    pub fn build(self) -> Result<RestClient<A>, Error> {
        self.build_options().map(RestClient::new)
    }
}

#[cfg(feature = "reqwest")]
fn default_transport(timeout: Option<Duration>) -> Result<Arc<dyn Transport>, Error> {
    let mut builder = crate::backends::ReqwestTransport::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(Arc::new(builder.build()?))
}

#[cfg(all(feature = "bitreq", not(feature = "reqwest")))]
fn default_transport(timeout: Option<Duration>) -> Result<Arc<dyn Transport>, Error> {
    let mut transport = crate::backends::BitreqTransport::new();
    if let Some(timeout) = timeout {
        transport = transport.with_timeout(timeout);
    }
    Ok(Arc::new(transport))
}

#[cfg(not(any(feature = "reqwest", feature = "bitreq")))]
fn default_transport(_timeout: Option<Duration>) -> Result<Arc<dyn Transport>, Error> {
    Err(Error::Config(
        "no transport supplied and no transport backend feature enabled".to_string(),
    ))
}
