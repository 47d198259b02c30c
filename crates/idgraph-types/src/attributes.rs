//! Attribute values and the per-entity attribute bag.
//!
//! Both identities and relationships carry an [`AttributeMap`] by
//! composition. Values are restricted to portable primitive kinds so
//! serialization and indexing stay tractable; there is no implicit type
//! coercion anywhere.

use std::collections::btree_map;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A typed attribute value.
///
/// The set of kinds is closed: no nested structures, no floats. Values are
/// `Eq + Hash` so exact-match attribute indexing can key on them directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeValue {
    Text(String),
    TextList(Vec<String>),
    Integer(i64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Bytes(Vec<u8>),
}

impl AttributeValue {
    /// Human-readable name of the value's kind, used in error reporting.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AttributeValue::Text(_) => "text",
            AttributeValue::TextList(_) => "text list",
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Boolean(_) => "boolean",
            AttributeValue::Date(_) => "date",
            AttributeValue::Bytes(_) => "bytes",
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttributeValue::Date(value)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        AttributeValue::Bytes(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        AttributeValue::TextList(value)
    }
}

/// A named bag of typed attribute values.
///
/// Names are unique; re-setting a name overwrites the prior value without
/// error. Reads of absent names return `None`; reads through a typed
/// accessor fail with [`Error::TypeMismatch`] when the stored kind differs
/// from the requested one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMap {
    values: BTreeMap<String, AttributeValue>,
}

impl AttributeMap {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, overwriting any prior value under the same name.
    ///
    /// Returns `true` if the map changed (new name, or a different value
    /// under an existing name); re-setting an identical value is a no-op.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> bool {
        let name = name.into();
        let value = value.into();
        match self.values.get(&name) {
            Some(existing) if *existing == value => false,
            _ => {
                self.values.insert(name, value);
                true
            }
        }
    }

    /// Get an attribute value by name.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    /// Remove an attribute. Returns `false` if the name was absent.
    pub fn remove(&mut self, name: &str) -> bool {
        self.values.remove(name).is_some()
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> btree_map::Iter<'_, String, AttributeValue> {
        self.values.iter()
    }

    /// Names of all attributes currently set.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a text attribute, failing if the stored value is another kind.
    pub fn text(&self, name: &str) -> Result<Option<&str>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(AttributeValue::Text(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(Self::mismatch(name, "text", other)),
        }
    }

    /// Get a text-list attribute.
    pub fn text_list(&self, name: &str) -> Result<Option<&[String]>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(AttributeValue::TextList(v)) => Ok(Some(v.as_slice())),
            Some(other) => Err(Self::mismatch(name, "text list", other)),
        }
    }

    /// Get an integer attribute.
    pub fn integer(&self, name: &str) -> Result<Option<i64>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(AttributeValue::Integer(i)) => Ok(Some(*i)),
            Some(other) => Err(Self::mismatch(name, "integer", other)),
        }
    }

    /// Get a boolean attribute.
    pub fn boolean(&self, name: &str) -> Result<Option<bool>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(AttributeValue::Boolean(b)) => Ok(Some(*b)),
            Some(other) => Err(Self::mismatch(name, "boolean", other)),
        }
    }

    /// Get a date attribute.
    pub fn date(&self, name: &str) -> Result<Option<DateTime<Utc>>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(AttributeValue::Date(d)) => Ok(Some(*d)),
            Some(other) => Err(Self::mismatch(name, "date", other)),
        }
    }

    /// Get a byte-sequence attribute.
    pub fn bytes(&self, name: &str) -> Result<Option<&[u8]>> {
        match self.values.get(name) {
            None => Ok(None),
            Some(AttributeValue::Bytes(b)) => Ok(Some(b.as_slice())),
            Some(other) => Err(Self::mismatch(name, "bytes", other)),
        }
    }

    fn mismatch(name: &str, expected: &'static str, actual: &AttributeValue) -> Error {
        Error::TypeMismatch {
            name: name.to_string(),
            expected,
            actual: actual.kind_name(),
        }
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AttributeMap {
    type Item = (&'a String, &'a AttributeValue);
    type IntoIter = btree_map::Iter<'a, String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
