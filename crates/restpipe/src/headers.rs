//! Ordered, case-insensitive, multi-valued header collection
//!
//! Every transformation consumes the collection and returns a new one, so a
//! collection handed to a request can never be changed behind its back.

use crate::error::Error;

/// `Content-Type` header name
pub const CONTENT_TYPE: &str = "Content-Type";

/// `Accept` header name
pub const ACCEPT: &str = "Accept";

/// JSON media type
pub const JSON_MEDIA_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

/// Ordered mapping from header name to its values
///
/// Names compare ASCII case-insensitively and keep the spelling they were
/// first inserted with. Distinct names keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct HeaderCollection {
    entries: Vec<HeaderEntry>,
}

impl HeaderCollection {
    /// Empty collection
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Add `value` under `name`, creating the name if needed
    ///
    /// A value already present for the name is not stored twice.
    pub fn append(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => {
                let values = &mut self.entries[index].values;
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            None => self.entries.push(HeaderEntry {
                name,
                values: vec![value],
            }),
        }
        self
    }

    /// Replace every value of `name` with `value`
    pub fn replace(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index].values = vec![value],
            None => self.entries.push(HeaderEntry {
                name,
                values: vec![value],
            }),
        }
        self
    }

    /// Combine with `other`; for names present in both, `other` wins
    ///
    /// Names already in `self` keep their position. Names only in `other`
    /// follow in `other`'s order.
    pub fn merge(mut self, other: HeaderCollection) -> Self {
        for entry in other.entries {
            match self.position(&entry.name) {
                Some(index) => self.entries[index].values = entry.values,
                None => self.entries.push(entry),
            }
        }
        self
    }

    /// Drop `name` and all of its values
    pub fn remove(mut self, name: &str) -> Self {
        self.entries
            .retain(|entry| !entry.name.eq_ignore_ascii_case(name));
        self
    }

    /// Set `Content-Type`, failing if one is already present
    pub fn with_content_type(self, media_type: impl Into<String>) -> Result<Self, Error> {
        if let Some(index) = self.position(CONTENT_TYPE) {
            return Err(Error::HeaderConflict(self.entries[index].name.clone()));
        }
        Ok(self.append(CONTENT_TYPE, media_type))
    }

    /// Set `Content-Type: application/json`, failing if one is already present
    pub fn with_json_content_type(self) -> Result<Self, Error> {
        self.with_content_type(JSON_MEDIA_TYPE)
    }

    /// Check every name and value against the HTTP header grammar
    ///
    /// Names must be tokens; values must not contain control characters
    /// other than horizontal tab, which rules out CR/LF injection.
    pub fn validate(&self) -> Result<(), Error> {
        for entry in &self.entries {
            http::HeaderName::from_bytes(entry.name.as_bytes())
                .map_err(|_| Error::InvalidHeader(format!("`{}` is not a valid name", entry.name)))?;
            for value in &entry.values {
                http::HeaderValue::from_str(value).map_err(|_| {
                    Error::InvalidHeader(format!("value of {} is not valid", entry.name))
                })?;
            }
        }
        Ok(())
    }

    /// Whether `name` is present
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All values of `name`
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name)
            .map(|index| self.entries[index].values.as_slice())
    }

    /// First value of `name`
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// The `Content-Type` value, if any
    pub fn content_type(&self) -> Option<&str> {
        self.first(CONTENT_TYPE)
    }

    /// Iterate names and their values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no header is present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for HeaderCollection {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.name.eq_ignore_ascii_case(&b.name) && a.values == b.values)
    }
}

impl Eq for HeaderCollection {}

impl<K, V> FromIterator<(K, V)> for HeaderCollection
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |headers, (name, value)| headers.append(name, value))
    }
}

impl<K, V> Extend<(K, V)> for HeaderCollection
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let headers = std::mem::take(self);
        *self = iter
            .into_iter()
            .fold(headers, |headers, (name, value)| headers.append(name, value));
    }
}
