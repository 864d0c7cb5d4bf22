//! Protocol Buffers adapter

use prost::Message;

use super::{text_passthrough, Deserializes, SerializationAdapter, Serializes};
use crate::error::Error;
use crate::headers::HeaderCollection;

/// Protocol Buffers media type
pub const PROTOBUF_MEDIA_TYPE: &str = "application/x-protobuf";

/// Protocol Buffers via `prost`
///
/// Any type implementing [`prost::Message`] is supported. Content types are
/// not checked on decode, since servers label protobuf bodies inconsistently.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtobufAdapter;

impl ProtobufAdapter {
    /// Create a protobuf adapter
    pub fn new() -> Self {
        Self
    }
}

impl SerializationAdapter for ProtobufAdapter {
    fn name(&self) -> &'static str {
        "protobuf"
    }

    fn media_type(&self) -> Option<&'static str> {
        Some(PROTOBUF_MEDIA_TYPE)
    }
}

impl<T> Serializes<T> for ProtobufAdapter
where
    T: Message,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>, Error> {
        Ok(value.encode_to_vec())
    }
}

impl<T> Deserializes<T> for ProtobufAdapter
where
    T: Message + Default + 'static,
{
    fn deserialize(&self, bytes: &[u8], _headers: &HeaderCollection) -> Result<T, Error> {
        if let Some(text) = text_passthrough::<T>(bytes) {
            return text;
        }
        T::decode(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Message)]
    struct Item {
        #[prost(uint32, tag = "1")]
        id: u32,
        #[prost(string, tag = "2")]
        name: String,
        #[prost(string, repeated, tag = "3")]
        tags: Vec<String>,
    }

    #[test]
    fn test_round_trip() {
        let adapter = ProtobufAdapter::new();
        let item = Item {
            id: 5,
            name: "widget".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
        };
        let bytes = adapter.serialize(&item).expect("message encodes");
        let decoded: Item = adapter
            .deserialize(&bytes, &HeaderCollection::new())
            .expect("message decodes");
        assert_eq!(decoded, item);
    }

    #[test]
    fn test_string_is_passed_through() {
        let text: String = ProtobufAdapter::new()
            .deserialize(b"upstream timeout", &HeaderCollection::new())
            .expect("text passes through");
        assert_eq!(text, "upstream timeout");
    }

    #[test]
    fn test_truncated_body_fails() {
        let adapter = ProtobufAdapter::new();
        let bytes = adapter
            .serialize(&Item {
                id: 1,
                name: "a long enough name".to_string(),
                tags: Vec::new(),
            })
            .expect("message encodes");
        let result: Result<Item, _> =
            adapter.deserialize(&bytes[..bytes.len() - 3], &HeaderCollection::new());
        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
