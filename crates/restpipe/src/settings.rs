//! File and environment based client settings

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::options::StatusRange;
use crate::urls::AbsoluteUrl;

/// Prefix of environment variables overriding file settings
pub const ENV_PREFIX: &str = "RESTPIPE";

/// Header names whose values are never printed
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "x-api-key"];

fn default_throw_on_failure() -> bool {
    true
}

/// Settings for a single client
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Base URL every relative URL is joined onto
    pub base_url: Option<AbsoluteUrl>,
    /// Headers sent with every call
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
    /// Return failure statuses as errors
    #[serde(default = "default_throw_on_failure")]
    pub throw_on_failure: bool,
    /// Statuses considered successful
    #[serde(default)]
    pub success_status: StatusRange,
    /// Timeout for the bundled transport, in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            default_headers: BTreeMap::new(),
            throw_on_failure: default_throw_on_failure(),
            success_status: StatusRange::default(),
            timeout_secs: None,
        }
    }
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .default_headers
            .iter()
            .map(|(name, value)| {
                let lower = name.to_ascii_lowercase();
                if SENSITIVE_HEADERS.contains(&lower.as_str()) {
                    (name.as_str(), "<redacted>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("ClientSettings")
            .field("base_url", &self.base_url)
            .field("default_headers", &headers)
            .field("throw_on_failure", &self.throw_on_failure)
            .field("success_status", &self.success_status)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Named client settings, as consumed by [`ClientFactory`](crate::ClientFactory)
///
/// ```toml
/// [clients.inventory]
/// base_url = "https://inventory.example.com/v2"
/// timeout_secs = 10
///
/// [clients.inventory.default_headers]
/// Accept = "application/json"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactorySettings {
    /// Settings per client name
    #[serde(default)]
    pub clients: HashMap<String, ClientSettings>,
}

impl FactorySettings {
    /// Load from a TOML file, then apply `RESTPIPE__*` environment overrides
    ///
    /// `RESTPIPE__CLIENTS__INVENTORY__BASE_URL` overrides
    /// `clients.inventory.base_url`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        tracing::debug!("Loading client settings from {}", path.display());

        let config = Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse TOML text
    pub fn from_toml_str(toml: &str) -> Result<Self, Error> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Settings for `name`
    pub fn client(&self, name: &str) -> Option<&ClientSettings> {
        self.clients.get(name)
    }
}
