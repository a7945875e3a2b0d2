//! Output records and the builder that guards their field names.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Columns of the tabular output, in order.
pub const OUTPUT_FIELDS: [&str; 13] = [
    "Title",
    "Login URL",
    "Login Username",
    "Login Password",
    "Created",
    "Modified",
    "Author",
    "Notes",
    "credential-type",
    "note",
    "ssh-generated-key",
    "ssh-key-text",
    "token",
];

/// Fields every record starts with, set to the empty string.
pub const DEFAULTED_FIELDS: [&str; 3] = ["Login Username", "Login Password", "Login URL"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field '{field}' is not one of the output fields: {}", .allowed.join(", "))]
pub struct UnknownFieldError {
    pub field: String,
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Integer(_) => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Integer(n) => serializer.serialize_i64(*n),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

/// One credential, ready for the tabular writer. Fields keep the order in
/// which they were first written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssembledRecord {
    fields: Vec<(String, FieldValue)>,
}

impl AssembledRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn get_text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn insert(&mut self, field: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.to_string(), value)),
        }
    }
}

impl Serialize for AssembledRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// The closed set of field names a record may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    names: Vec<String>,
}

impl FieldSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn check(&self, name: &str) -> Result<(), UnknownFieldError> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(UnknownFieldError {
                field: name.to_string(),
                allowed: self.names.clone(),
            })
        }
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self::new(OUTPUT_FIELDS)
    }
}

/// Builds one record at a time, refusing any field outside its [`FieldSet`].
///
/// A rejected write leaves the record untouched.
#[derive(Debug)]
pub struct RecordBuilder {
    fields: FieldSet,
    current: AssembledRecord,
}

impl RecordBuilder {
    /// Fails if the field set cannot hold the defaulted fields.
    pub fn new(fields: FieldSet) -> Result<Self, UnknownFieldError> {
        for name in DEFAULTED_FIELDS {
            fields.check(name)?;
        }

        let mut builder = Self {
            fields,
            current: AssembledRecord::default(),
        };
        builder.start();
        Ok(builder)
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    /// Discard the record in progress and begin a fresh one.
    pub fn start(&mut self) {
        self.current = AssembledRecord::default();
        for name in DEFAULTED_FIELDS {
            self.current.insert(name, FieldValue::Text(String::new()));
        }
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> Result<(), UnknownFieldError> {
        self.fields.check(field)?;
        self.current.insert(field, value.into());
        Ok(())
    }

    pub fn current(&self) -> &AssembledRecord {
        &self.current
    }

    /// Hand out the finished record and begin a fresh one.
    pub fn finish(&mut self) -> AssembledRecord {
        let record = std::mem::take(&mut self.current);
        self.start();
        record
    }
}
