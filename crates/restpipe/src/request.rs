//! Outgoing request

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::headers::HeaderCollection;
use crate::urls::AbsoluteUrl;

/// HTTP verb supported by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request handed to a [`Transport`](crate::Transport)
///
/// Built fresh for each call and consumed by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Verb
    pub method: Method,
    /// Fully joined URL
    pub url: AbsoluteUrl,
    /// Merged headers
    pub headers: HeaderCollection,
    /// Serialized body
    pub body: Option<Vec<u8>>,
}
