//! Typed REST client pipeline
//!
//! This crate separates the three concerns of calling a REST API: moving bytes
//! (a [`Transport`]), encoding bodies (a [`SerializationAdapter`]), and the
//! pipeline in between (URL composition, header merging, the [`Response`]
//! envelope and the [`Error`] taxonomy).
//!
//! # Example
//!
//! ```no_run
//! use restpipe::{Error, RestClient};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Item {
//!     id: u32,
//!     name: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct ApiError {
//!     error: String,
//! }
//!
//! async fn example() -> Result<(), Error> {
//!     let client = RestClient::builder()
//!         .base_url("https://api.example.com/")
//!         .build()?;
//!
//!     match client.get("items/5", None).await {
//!         Ok(response) => {
//!             let item: Item = response.to_model()?;
//!             println!("{} {}", item.id, item.name);
//!         }
//!         Err(Error::Status(failure)) => {
//!             let body: ApiError = client.to_model_from(failure.body(), failure.headers())?;
//!             println!("{} {}", failure.status(), body.error);
//!         }
//!         Err(err) => return Err(err),
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod backends;
mod client;
mod error;
mod factory;
mod headers;
mod options;
mod request;
mod response;
mod settings;
mod transport;
mod urls;

pub use adapter::{
    CborAdapter, Deserializes, JsonAdapter, KnownTypes, KnownTypesBuilder, ProtobufAdapter,
    SerializationAdapter, Serializes,
};
pub use client::{CallBuilder, RestClient};
pub use error::{BoxError, Error, HttpStatusError, TransportError, TransportErrorKind};
pub use factory::{create_client, ClientFactory};
pub use headers::{HeaderCollection, ACCEPT, CONTENT_TYPE, JSON_MEDIA_TYPE};
pub use options::{ClientBuilder, ClientOptions, StatusRange};
pub use request::{Method, Request};
pub use response::Response;
pub use settings::{ClientSettings, FactorySettings, ENV_PREFIX};
pub use tokio_util::sync::CancellationToken;
pub use transport::{Transport, TransportArtifact, TransportResponse};
pub use urls::{AbsoluteUrl, IntoRelativeUrl, RelativeUrl};
