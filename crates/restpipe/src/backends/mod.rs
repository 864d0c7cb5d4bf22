//! Transport backends

#[cfg(feature = "bitreq")]
pub mod bitreq_backend;
#[cfg(feature = "reqwest")]
pub mod reqwest_backend;

#[cfg(feature = "bitreq")]
pub use bitreq_backend::{BitreqArtifact, BitreqTransport};
#[cfg(feature = "reqwest")]
pub use reqwest_backend::{ReqwestArtifact, ReqwestTransport, ReqwestTransportBuilder};
