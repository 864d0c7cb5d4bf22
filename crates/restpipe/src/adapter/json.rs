//! JSON adapter

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{check_content_type, text_passthrough, Deserializes, SerializationAdapter, Serializes};
use crate::error::Error;
use crate::headers::{HeaderCollection, JSON_MEDIA_TYPE};

/// JSON via `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAdapter;

impl JsonAdapter {
    /// Create a JSON adapter
    pub fn new() -> Self {
        Self
    }
}

fn is_json(essence: &str) -> bool {
    essence == JSON_MEDIA_TYPE || essence == "text/json" || essence.ends_with("+json")
}

impl SerializationAdapter for JsonAdapter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn media_type(&self) -> Option<&'static str> {
        Some(JSON_MEDIA_TYPE)
    }
}

impl<T> Serializes<T> for JsonAdapter
where
    T: Serialize + ?Sized,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(value).map_err(Error::from)
    }
}

impl<T> Deserializes<T> for JsonAdapter
where
    T: DeserializeOwned + 'static,
{
    fn deserialize(&self, bytes: &[u8], headers: &HeaderCollection) -> Result<T, Error> {
        if let Some(text) = text_passthrough::<T>(bytes) {
            return text;
        }
        check_content_type(self.name(), headers, is_json)?;
        serde_json::from_slice(bytes).map_err(Error::from)
    }
}
