//! Contract based binary adapter
//!
//! Bodies are CBOR encoded as a two element array `[contract, value]`. The
//! contract is the stable name a type was registered under in [`KnownTypes`],
//! so a peer can tell which message it received and a mismatched body fails
//! loudly instead of decoding into the wrong shape.
//!
//! The registry is built once with [`KnownTypesBuilder`] during startup and is
//! immutable afterwards. Adapters share it through an `Arc`, so lookups from
//! concurrent requests need no locking.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{check_content_type, text_passthrough, Deserializes, SerializationAdapter, Serializes};
use crate::error::Error;
use crate::headers::HeaderCollection;

/// CBOR media type
pub const CBOR_MEDIA_TYPE: &str = "application/cbor";

/// Frozen registry of types the binary adapter may encode
#[derive(Debug, Clone, Default)]
pub struct KnownTypes {
    contracts: HashMap<TypeId, &'static str>,
}

impl KnownTypes {
    /// Start building a registry
    pub fn builder() -> KnownTypesBuilder {
        KnownTypesBuilder::default()
    }

    /// Contract name registered for `T`
    pub fn contract_of<T: ?Sized + 'static>(&self) -> Option<&'static str> {
        self.contracts.get(&TypeId::of::<T>()).copied()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

/// Collects registrations; [`KnownTypesBuilder::build`] validates and freezes them
#[derive(Debug, Default)]
pub struct KnownTypesBuilder {
    entries: Vec<(TypeId, &'static str, &'static str)>,
}

impl KnownTypesBuilder {
    /// Register `T` under `contract`
    pub fn register<T: ?Sized + 'static>(mut self, contract: &'static str) -> Self {
        self.entries
            .push((TypeId::of::<T>(), type_name::<T>(), contract));
        self
    }

    /// Freeze the registry
    ///
    /// Fails when a type is registered twice or two types share a contract name.
    pub fn build(self) -> Result<KnownTypes, Error> {
        let mut contracts = HashMap::with_capacity(self.entries.len());
        let mut owners: HashMap<&'static str, &'static str> = HashMap::new();

        for (type_id, rust_name, contract) in self.entries {
            if contracts.insert(type_id, contract).is_some() {
                return Err(Error::Config(format!("{rust_name} registered twice")));
            }
            if let Some(other) = owners.insert(contract, rust_name) {
                return Err(Error::Config(format!(
                    "contract {contract} claimed by both {other} and {rust_name}"
                )));
            }
        }

        tracing::debug!("Known types registry frozen with {} types", contracts.len());
        Ok(KnownTypes { contracts })
    }
}

/// CBOR via `ciborium`, restricted to registered types
#[derive(Debug, Clone, Default)]
pub struct CborAdapter {
    known_types: Arc<KnownTypes>,
}

impl CborAdapter {
    /// Create an adapter over a frozen registry
    pub fn new(known_types: KnownTypes) -> Self {
        Self {
            known_types: Arc::new(known_types),
        }
    }

    /// Create an adapter sharing an existing registry
    pub fn with_shared(known_types: Arc<KnownTypes>) -> Self {
        Self { known_types }
    }

    /// The registry in use
    pub fn known_types(&self) -> &KnownTypes {
        &self.known_types
    }

    fn contract<T: ?Sized + 'static>(&self) -> Result<&'static str, Error> {
        self.known_types
            .contract_of::<T>()
            .ok_or(Error::UnsupportedType {
                adapter: "cbor",
                type_name: type_name::<T>(),
            })
    }
}

impl SerializationAdapter for CborAdapter {
    fn name(&self) -> &'static str {
        "cbor"
    }

    fn media_type(&self) -> Option<&'static str> {
        Some(CBOR_MEDIA_TYPE)
    }
}

impl<T> Serializes<T> for CborAdapter
where
    T: Serialize + ?Sized + 'static,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>, Error> {
        let contract = self.contract::<T>()?;
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(&(contract, value), &mut buffer)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(buffer)
    }
}

impl<T> Deserializes<T> for CborAdapter
where
    T: DeserializeOwned + 'static,
{
    fn deserialize(&self, bytes: &[u8], headers: &HeaderCollection) -> Result<T, Error> {
        if let Some(text) = text_passthrough::<T>(bytes) {
            return text;
        }
        let expected = self.contract::<T>()?;
        check_content_type(self.name(), headers, |essence| essence == CBOR_MEDIA_TYPE)?;

        let (contract, value): (String, T) = ciborium::de::from_reader(bytes)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        if contract != expected {
            return Err(Error::Serialization(format!(
                "expected contract {expected}, body carries {contract}"
            )));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
        name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Order {
        id: u32,
        name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Unregistered {
        id: u32,
    }

    fn adapter() -> CborAdapter {
        let known_types = KnownTypes::builder()
            .register::<Item>("shop.item")
            .register::<Order>("shop.order")
            .build()
            .expect("distinct registrations");
        CborAdapter::new(known_types)
    }

    #[test]
    fn test_round_trip() {
        let adapter = adapter();
        let item = Item {
            id: 7,
            name: "gear".to_string(),
        };
        let bytes = adapter.serialize(&item).expect("registered type");
        let decoded: Item = adapter
            .deserialize(&bytes, &HeaderCollection::new())
            .expect("registered type");
        assert_eq!(decoded, item);
    }

    #[test]
    fn test_unregistered_type_is_unsupported() {
        let adapter = adapter();
        let result = adapter.serialize(&Unregistered { id: 1 });
        assert!(matches!(
            result,
            Err(Error::UnsupportedType { adapter: "cbor", .. })
        ));

        let decoded: Result<Unregistered, _> = adapter.deserialize(&[], &HeaderCollection::new());
        assert!(matches!(decoded, Err(Error::UnsupportedType { .. })));
    }

    #[test]
    fn test_contract_mismatch_is_rejected() {
        let adapter = adapter();
        let bytes = adapter
            .serialize(&Item {
                id: 1,
                name: "same shape".to_string(),
            })
            .expect("registered type");
        let result: Result<Order, _> = adapter.deserialize(&bytes, &HeaderCollection::new());
        assert!(matches!(result, Err(Error::Serialization(msg)) if msg.contains("shop.order")));
    }

    #[test]
    fn test_string_is_passed_through() {
        let text: String = adapter()
            .deserialize(b"service unavailable", &HeaderCollection::new())
            .expect("text passes through");
        assert_eq!(text, "service unavailable");
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let twice = KnownTypes::builder()
            .register::<Item>("a")
            .register::<Item>("b")
            .build();
        assert!(matches!(twice, Err(Error::Config(_))));

        let shared_contract = KnownTypes::builder()
            .register::<Item>("shop.thing")
            .register::<Order>("shop.thing")
            .build();
        assert!(matches!(shared_contract, Err(Error::Config(_))));
    }

    #[test]
    fn test_registry_lookup() {
        let adapter = adapter();
        assert_eq!(adapter.known_types().len(), 2);
        assert_eq!(adapter.known_types().contract_of::<Order>(), Some("shop.order"));
        assert_eq!(adapter.known_types().contract_of::<Unregistered>(), None);
    }
}
