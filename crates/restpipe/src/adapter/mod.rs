//! Serialization adapters
//!
//! An adapter converts between typed values and body bytes. The base
//! [`SerializationAdapter`] trait is object safe and describes the adapter;
//! the per-type capabilities [`Serializes`] and [`Deserializes`] are resolved
//! at compile time, so asking an adapter for a type it has no encoding for is
//! usually a build error rather than a runtime one.
//!
//! Adapters hold no shared mutable state and are safe to call from many
//! in-flight requests at once.

mod cbor;
mod json;
mod protobuf;

use std::any::{type_name, Any, TypeId};
use std::fmt::Debug;

pub use cbor::{CborAdapter, KnownTypes, KnownTypesBuilder};
pub use json::JsonAdapter;
pub use protobuf::ProtobufAdapter;

use crate::error::Error;
use crate::headers::HeaderCollection;

/// Media types every adapter tolerates on an incoming body
const GENERIC_MEDIA_TYPES: &[&str] = &["text/plain", "application/octet-stream"];

/// Describes a wire format
pub trait SerializationAdapter: Debug + Send + Sync + 'static {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Media type written to `Content-Type` when sending a body
    fn media_type(&self) -> Option<&'static str>;
}

/// Adapter able to encode `T`
pub trait Serializes<T: ?Sized>: SerializationAdapter {
    /// Encode `value` into body bytes
    fn serialize(&self, value: &T) -> Result<Vec<u8>, Error>;
}

/// Adapter able to decode `T`
pub trait Deserializes<T>: SerializationAdapter {
    /// Decode body bytes into `T`, consulting the headers that came with them
    fn deserialize(&self, bytes: &[u8], headers: &HeaderCollection) -> Result<T, Error>;
}

/// When `T` is `String`, decode the body as UTF-8 text without running the
/// wire format parser
///
/// Returns `None` for every other type.
pub(crate) fn text_passthrough<T: 'static>(bytes: &[u8]) -> Option<Result<T, Error>> {
    if TypeId::of::<T>() != TypeId::of::<String>() {
        return None;
    }

    let text = match String::from_utf8(bytes.to_vec()) {
        Ok(text) => text,
        Err(err) => return Some(Err(Error::Serialization(err.to_string()))),
    };
    let boxed: Box<dyn Any> = Box::new(text);
    Some(
        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::Serialization(format!("cannot read text as {}", type_name::<T>()))),
    )
}

/// Essence of a media type: lowercase, parameters stripped
pub(crate) fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Reject a body whose declared `Content-Type` is some other specific format
///
/// A missing `Content-Type`, a generic one, or one for which `accepts`
/// returns true all pass.
pub(crate) fn check_content_type(
    adapter: &'static str,
    headers: &HeaderCollection,
    accepts: impl Fn(&str) -> bool,
) -> Result<(), Error> {
    let Some(content_type) = headers.content_type() else {
        return Ok(());
    };
    let essence = essence(content_type);
    if essence.is_empty() || GENERIC_MEDIA_TYPES.contains(&essence.as_str()) || accepts(&essence)
    {
        return Ok(());
    }
    Err(Error::Serialization(format!(
        "{adapter} adapter cannot decode a {essence} body"
    )))
}
