//! Named client construction

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::SerializationAdapter;
use crate::client::RestClient;
use crate::error::Error;
use crate::options::ClientBuilder;
use crate::settings::{ClientSettings, FactorySettings};
use crate::transport::Transport;

/// Build a named client, letting `configure` fill in the builder
///
/// ```no_run
/// use restpipe::{create_client, JsonAdapter};
///
/// let client = create_client::<JsonAdapter, _>("inventory", |builder| {
///     builder.base_url("https://inventory.example.com/v2")
/// })?;
/// # Ok::<(), restpipe::Error>(())
/// ```
pub fn create_client<A, F>(name: &str, configure: F) -> Result<RestClient<A>, Error>
where
    A: SerializationAdapter + Default,
    F: FnOnce(ClientBuilder<A>) -> ClientBuilder<A>,
{
    configure(ClientBuilder::new(A::default()).name(name)).build()
}

/// Creates clients from named settings over a shared transport
///
/// Settings registered under a name are applied first, then the caller's
/// `configure` closure, so code can always override what a file says.
#[derive(Debug, Default, Clone)]
pub struct ClientFactory {
    transport: Option<Arc<dyn Transport>>,
    settings: HashMap<String, ClientSettings>,
}

impl ClientFactory {
    /// Empty factory; clients get the bundled transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory over loaded settings
    pub fn from_settings(settings: FactorySettings) -> Self {
        Self {
            transport: None,
            settings: settings.clients,
        }
    }

    /// Share `transport` between every client this factory creates
    pub fn with_transport<T>(mut self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Register settings for `name`, replacing earlier ones
    pub fn register(mut self, name: impl Into<String>, settings: ClientSettings) -> Self {
        self.settings.insert(name.into(), settings);
        self
    }

    /// Names with registered settings
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str)
    }

    /// Build the client registered as `name`
    pub fn create_client<A, F>(&self, name: &str, configure: F) -> Result<RestClient<A>, Error>
    where
        A: SerializationAdapter + Default,
        F: FnOnce(ClientBuilder<A>) -> ClientBuilder<A>,
    {
        let mut builder = ClientBuilder::new(A::default()).name(name);
        match self.settings.get(name) {
            Some(settings) => builder = builder.settings(settings),
            None => tracing::debug!("No settings registered for client {}", name),
        }
        if let Some(transport) = &self.transport {
            builder = builder.shared_transport(Arc::clone(transport));
        }
        configure(builder).build()
    }
}
