//! Attribute maps, field schemas, and records.
//!
//! # Design
//! The service is a legacy form-encoded endpoint that cares about parameter
//! order, so attributes live in an insertion-ordered `AttributeMap` rather
//! than a hash map. Record types are described by a static `ObjectSchema`
//! (field name → kind) instead of a per-type struct hierarchy: one `Record`
//! works for every object type, and typed access is checked against the
//! schema at the call site.

use chrono::{DateTime, FixedOffset};

use crate::error::Error;
use crate::translate::translate_key;

/// A scalar attribute value.
///
/// Values fetched from the service are always `Text`; `Int` and `Bool`
/// appear when the caller builds a record locally. Booleans are normalized
/// to `1`/`0` by the serializer, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// An insertion-ordered mapping from field name to scalar value.
///
/// Keys are case-sensitive. Inserting an existing key overwrites the value
/// in place, keeping the key's original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: Vec<(String, Value)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove `key` and return its value. The relative order of the
    /// remaining entries is unchanged.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AttributeMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// The declared kind of a schema field, used by `Record`'s typed getters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    Boolean,
    DateTime,
}

/// Static description of one remote object type: its wire name and the
/// fields it carries.
#[derive(Debug)]
pub struct ObjectSchema {
    pub object_name: &'static str,
    pub fields: &'static [(&'static str, FieldKind)],
}

impl ObjectSchema {
    /// Check that field names are unique and stay unique after wire-name
    /// translation. Constructors that accept a schema call this once; a
    /// collision is a configuration error.
    pub fn validate(&self) -> Result<(), Error> {
        let mut seen: Vec<(&str, String)> = Vec::with_capacity(self.fields.len());
        for (name, _) in self.fields {
            let translated = translate_key(name);
            if let Some((first, _)) = seen.iter().find(|(_, t)| *t == translated) {
                return Err(Error::KeyCollision {
                    first: first.to_string(),
                    second: name.to_string(),
                    translated,
                });
            }
            seen.push((name, translated));
        }
        Ok(())
    }

    pub fn kind(&self, field: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }

    /// The conventional key field for this object type, e.g.
    /// `supporter_key` for supporters.
    pub fn key_field(&self) -> String {
        format!("{}_key", self.object_name)
    }
}

/// Schema for the supporter object, the service's primary record type.
/// Kinds follow the service's documented standard supporter fields.
pub static SUPPORTER: ObjectSchema = ObjectSchema {
    object_name: "supporter",
    fields: &[
        ("supporter_key", FieldKind::Integer),
        ("organization_key", FieldKind::Integer),
        ("chapter_key", FieldKind::Integer),
        ("title", FieldKind::Text),
        ("first_name", FieldKind::Text),
        ("mi", FieldKind::Text),
        ("last_name", FieldKind::Text),
        ("suffix", FieldKind::Text),
        ("email", FieldKind::Text),
        ("receive_email", FieldKind::Boolean),
        ("phone", FieldKind::Text),
        ("street", FieldKind::Text),
        ("street_2", FieldKind::Text),
        ("city", FieldKind::Text),
        ("state", FieldKind::Text),
        ("zip", FieldKind::Text),
        ("country", FieldKind::Text),
        ("source", FieldKind::Text),
        ("source_details", FieldKind::Text),
        ("source_tracking_code", FieldKind::Text),
        ("tracking_code", FieldKind::Text),
        ("status", FieldKind::Text),
        ("timezone", FieldKind::Text),
        ("language_code", FieldKind::Text),
        ("date_created", FieldKind::DateTime),
        ("last_modified", FieldKind::DateTime),
    ],
};

/// One remote record: an attribute map plus the schema describing it.
///
/// Constructed either from caller-supplied attributes (a new record with no
/// remote key yet) or from a parsed fetch response (an existing record).
#[derive(Debug, Clone)]
pub struct Record {
    schema: &'static ObjectSchema,
    attributes: AttributeMap,
}

impl Record {
    pub fn new(schema: &'static ObjectSchema, attributes: AttributeMap) -> Self {
        Self { schema, attributes }
    }

    pub fn schema(&self) -> &'static ObjectSchema {
        self.schema
    }

    pub fn object_name(&self) -> &'static str {
        self.schema.object_name
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(field, value);
    }

    /// The remote-assigned key, if this record has been saved or fetched.
    pub fn key(&self) -> Option<i64> {
        match self.attributes.get("key")? {
            Value::Int(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Bool(_) => None,
        }
    }

    /// Integer field access. `None` when the schema does not declare
    /// `field` as an integer; a missing or unparseable value reads as 0,
    /// since the service omits zero-valued counters.
    pub fn integer(&self, field: &str) -> Option<i64> {
        self.schema.kind(field).filter(|k| *k == FieldKind::Integer)?;
        Some(match self.attributes.get(field) {
            Some(Value::Int(i)) => *i,
            Some(Value::Text(s)) => s.trim().parse().unwrap_or(0),
            Some(Value::Bool(b)) => *b as i64,
            None => 0,
        })
    }

    /// Text field access. `None` when the schema does not declare `field`
    /// as text, or the attribute is absent.
    pub fn text(&self, field: &str) -> Option<String> {
        self.schema.kind(field).filter(|k| *k == FieldKind::Text)?;
        self.attributes.get(field).map(|v| v.to_string())
    }

    /// Boolean field access. The service represents true as `"1"`; any
    /// other value, or absence, reads as false.
    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.schema.kind(field).filter(|k| *k == FieldKind::Boolean)?;
        Some(match self.attributes.get(field) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Int(i)) => *i == 1,
            Some(Value::Text(s)) => s == "1",
            None => false,
        })
    }

    /// Datetime field access, parsed from the service's timestamp format
    /// (`Fri Mar 14 2014 14:07:29 GMT-0400 (EDT)`). `None` when the field
    /// is undeclared, absent, or unparseable.
    pub fn datetime(&self, field: &str) -> Option<DateTime<FixedOffset>> {
        self.schema.kind(field).filter(|k| *k == FieldKind::DateTime)?;
        let raw = self.attributes.get(field)?.to_string();
        parse_service_datetime(&raw)
    }
}

fn parse_service_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    // Trailing "(EDT)"-style zone names are not machine-parseable; the
    // numeric offset before them is.
    let trimmed = match raw.find(" (") {
        Some(index) => &raw[..index],
        None => raw,
    };
    DateTime::parse_from_str(trimmed, "%a %b %d %Y %H:%M:%S GMT%z").ok()
}
