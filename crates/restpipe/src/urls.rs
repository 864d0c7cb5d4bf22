//! Absolute and relative URL values
//!
//! Parsing is delegated to the [`url`] crate. The only composition rule added
//! here is [`AbsoluteUrl::join`], which concatenates paths with a single
//! separator instead of following RFC 3986 reference resolution (where
//! `items` resolved against `/v1` would drop the `v1` segment).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use crate::error::Error;

/// URL carrying at least a scheme and a host
///
/// Equality and hashing use the normalized string form produced by the
/// parser (lowercase scheme and host, default port elided).
#[derive(Clone)]
pub struct AbsoluteUrl(Url);

impl AbsoluteUrl {
    /// Parse an absolute URL
    pub fn parse(input: &str) -> Result<Self, Error> {
        Self::from_url(Url::parse(input)?)
    }

    /// Wrap an already parsed [`Url`], rejecting ones without a host
    pub fn from_url(url: Url) -> Result<Self, Error> {
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!(
                "{url} cannot be used as a base URL"
            )));
        }
        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(Self(url)),
            _ => Err(Error::InvalidUrl(format!("{url} has no host"))),
        }
    }

    /// Scheme, e.g. `https`
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Host name or address
    pub fn host(&self) -> &str {
        // checked at construction
        self.0.host_str().unwrap_or_default()
    }

    /// Explicit port, or the scheme's default
    pub fn port(&self) -> Option<u16> {
        self.0.port_or_known_default()
    }

    /// Path, always starting with `/`
    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Query string without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.0.query()
    }

    /// Normalized string form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Borrow the parsed [`Url`]
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Combine with a relative URL, producing a new absolute URL
    ///
    /// - an empty `relative` returns `self` unchanged
    /// - paths are concatenated with exactly one `/` at the junction
    /// - the query of `relative` replaces the base query
    /// - scheme, host and port always come from `self`
    pub fn join(&self, relative: &RelativeUrl) -> AbsoluteUrl {
        if relative.is_empty() {
            return self.clone();
        }

        let mut url = self.0.clone();
        if !relative.path().is_empty() {
            let base = url.path().trim_end_matches('/');
            let tail = relative.path().trim_start_matches('/');
            let path = format!("{base}/{tail}");
            url.set_path(&path);
        }
        url.set_query(relative.query());
        url.set_fragment(None);

        AbsoluteUrl(url)
    }
}

impl fmt::Debug for AbsoluteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AbsoluteUrl").field(&self.as_str()).finish()
    }
}

impl fmt::Display for AbsoluteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for AbsoluteUrl {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for AbsoluteUrl {}

impl Hash for AbsoluteUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}

impl FromStr for AbsoluteUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<Url> for AbsoluteUrl {
    type Error = Error;

    fn try_from(url: Url) -> Result<Self, Self::Error> {
        Self::from_url(url)
    }
}

impl Serialize for AbsoluteUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AbsoluteUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Path plus optional query, joined onto an [`AbsoluteUrl`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RelativeUrl {
    path: String,
    query: Option<String>,
}

impl RelativeUrl {
    /// Identity for [`AbsoluteUrl::join`]
    pub const EMPTY: RelativeUrl = RelativeUrl {
        path: String::new(),
        query: None,
    };

    /// Parse `path[?query]`
    ///
    /// Absolute URLs (`scheme://..`), scheme-relative URLs (`//host/..`) and
    /// fragments are rejected. A colon alone does not make a scheme, so
    /// `v1:batchGet` is a relative path. `.` and `..` segments, including
    /// their percent-encoded spellings, are rejected rather than resolved.
    pub fn parse(input: &str) -> Result<Self, Error> {
        if input.starts_with("//") || has_scheme(input) {
            return Err(Error::InvalidUrl(format!(
                "{input} is absolute, expected a relative URL"
            )));
        }
        if input.contains('#') {
            return Err(Error::InvalidUrl(format!(
                "{input} contains a fragment"
            )));
        }

        let (path, query) = match input.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (input, None),
        };
        // the url crate treats `\` as a separator for http(s)
        if path.split(['/', '\\']).any(is_dot_segment) {
            return Err(Error::InvalidUrl(format!(
                "{input} contains a dot segment"
            )));
        }

        Ok(Self {
            path: path.to_string(),
            query,
        })
    }

    /// Path component
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query without the leading `?`
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// True when both path and query are absent
    pub fn is_empty(&self) -> bool {
        self.path.is_empty() && self.query.is_none()
    }

    /// Replace the query with a raw, already encoded string
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Replace the query with form-encoded `pairs`
    pub fn with_query_pairs<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator,
        I::Item: std::borrow::Borrow<(K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.with_query(query)
    }
}

impl fmt::Display for RelativeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

impl FromStr for RelativeUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `scheme://` prefix per RFC 3986: a letter, then letters, digits, `+`, `-`, `.`
fn has_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

/// Conversion into a [`RelativeUrl`], used by the client's verb methods
pub trait IntoRelativeUrl {
    /// Perform the conversion
    fn into_relative_url(self) -> Result<RelativeUrl, Error>;
}

impl IntoRelativeUrl for RelativeUrl {
    fn into_relative_url(self) -> Result<RelativeUrl, Error> {
        Ok(self)
    }
}

impl IntoRelativeUrl for &RelativeUrl {
    fn into_relative_url(self) -> Result<RelativeUrl, Error> {
        Ok(self.clone())
    }
}

impl IntoRelativeUrl for &str {
    fn into_relative_url(self) -> Result<RelativeUrl, Error> {
        RelativeUrl::parse(self)
    }
}

impl IntoRelativeUrl for String {
    fn into_relative_url(self) -> Result<RelativeUrl, Error> {
        RelativeUrl::parse(&self)
    }
}

impl IntoRelativeUrl for &String {
    fn into_relative_url(self) -> Result<RelativeUrl, Error> {
        RelativeUrl::parse(self)
    }
}
