//! Attribute values
//!
//! Typed counterpart of the store's JSON dialect. Values tagged with a
//! `__type` (pointers, included objects, dates, files) are decoded into their
//! own variants so that callers never have to inspect raw JSON.

use crate::acl::Acl;
use crate::errors::{ClientError, ClientResult};
use crate::object::RemoteObject;
use chrono::{DateTime, Utc};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Reference to a file stored next to the objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    pub url: Option<String>,
}

impl FileRef {
    pub fn new(name: impl Into<String>, url: Option<String>) -> Self {
        Self {
            name: name.into(),
            url,
        }
    }

    pub fn encode(&self) -> Value {
        let mut map = Map::new();
        map.insert("__type".to_string(), Value::from("File"));
        map.insert("name".to_string(), Value::from(self.name.clone()));
        if let Some(url) = &self.url {
            map.insert("url".to_string(), Value::from(url.clone()));
        }
        Value::Object(map)
    }
}

#[derive(Debug, Clone)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<AttrValue>),
    Object(BTreeMap<String, AttrValue>),
    Pointer(Box<RemoteObject>),
    File(FileRef),
    Acl(Acl),
}

/// Formats a timestamp the way the server returns it: millisecond precision
/// with a literal `Z`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

pub fn parse_date(iso: &str) -> ClientResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(iso)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|e| ClientError::Decode(format!("invalid date '{}': {}", iso, e)))
}

fn required_str<'a>(map: &'a Map<String, Value>, key: &str, kind: &str) -> ClientResult<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::Decode(format!("{} is missing '{}'", kind, key)))
}

impl AttrValue {
    /// Decode a wire value
    pub fn from_json(value: &Value) -> ClientResult<Self> {
        Ok(match value {
            Value::Null => AttrValue::Null,
            Value::Bool(b) => AttrValue::Bool(*b),
            Value::Number(n) => AttrValue::Number(n.clone()),
            Value::String(s) => AttrValue::String(s.clone()),
            Value::Array(items) => AttrValue::Array(
                items
                    .iter()
                    .map(AttrValue::from_json)
                    .collect::<ClientResult<Vec<_>>>()?,
            ),
            Value::Object(map) => match map.get("__type").and_then(Value::as_str) {
                Some("Pointer") => {
                    let class_name = required_str(map, "className", "Pointer")?;
                    let object_id = required_str(map, "objectId", "Pointer")?;
                    AttrValue::Pointer(Box::new(RemoteObject::pointer(class_name, object_id)))
                }
                Some("Object") => {
                    let class_name = required_str(map, "className", "Object")?;
                    AttrValue::Pointer(Box::new(RemoteObject::from_json(class_name, map)?))
                }
                Some("Date") => AttrValue::Date(parse_date(required_str(map, "iso", "Date")?)?),
                Some("File") => AttrValue::File(FileRef::new(
                    required_str(map, "name", "File")?,
                    map.get("url").and_then(Value::as_str).map(str::to_string),
                )),
                _ => AttrValue::Object(
                    map.iter()
                        .map(|(k, v)| Ok((k.clone(), AttrValue::from_json(v)?)))
                        .collect::<ClientResult<BTreeMap<_, _>>>()?,
                ),
            },
        })
    }

    /// Wire encoding. Objects of any kind are sent as pointers.
    pub fn encode(&self) -> Value {
        match self {
            AttrValue::Null => Value::Null,
            AttrValue::Bool(b) => Value::Bool(*b),
            AttrValue::Number(n) => Value::Number(n.clone()),
            AttrValue::String(s) => Value::String(s.clone()),
            AttrValue::Date(date) => {
                let mut map = Map::new();
                map.insert("__type".to_string(), Value::from("Date"));
                map.insert("iso".to_string(), Value::from(format_date(date)));
                Value::Object(map)
            }
            AttrValue::Array(items) => Value::Array(items.iter().map(AttrValue::encode).collect()),
            AttrValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.encode()))
                    .collect(),
            ),
            AttrValue::Pointer(object) => object.pointer_json(),
            AttrValue::File(file) => file.encode(),
            AttrValue::Acl(acl) => acl.encode(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Null => "null",
            AttrValue::Bool(_) => "bool",
            AttrValue::Number(_) => "number",
            AttrValue::String(_) => "string",
            AttrValue::Date(_) => "date",
            AttrValue::Array(_) => "array",
            AttrValue::Object(_) => "object",
            AttrValue::Pointer(_) => "pointer",
            AttrValue::File(_) => "file",
            AttrValue::Acl(_) => "acl",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<AttrValue>> {
        match self {
            AttrValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, AttrValue>> {
        match self {
            AttrValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_pointer(&self) -> Option<&RemoteObject> {
        match self {
            AttrValue::Pointer(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            AttrValue::Date(date) => Some(date),
            _ => None,
        }
    }

    /// Number of elements for arrays, zero for everything else
    pub fn array_len(&self) -> usize {
        self.as_array().map(Vec::len).unwrap_or(0)
    }
}

/// Pointers compare by class and id, everything else structurally.
impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Null, AttrValue::Null) => true,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Number(a), AttrValue::Number(b)) => match (a.as_i64(), b.as_i64()) {
                (Some(x), Some(y)) => x == y,
                _ => a.as_f64() == b.as_f64(),
            },
            (AttrValue::String(a), AttrValue::String(b)) => a == b,
            (AttrValue::Date(a), AttrValue::Date(b)) => a == b,
            (AttrValue::Array(a), AttrValue::Array(b)) => a == b,
            (AttrValue::Object(a), AttrValue::Object(b)) => a == b,
            (AttrValue::Pointer(a), AttrValue::Pointer(b)) => {
                a.class_name() == b.class_name() && a.object_id() == b.object_id()
            }
            (AttrValue::File(a), AttrValue::File(b)) => a == b,
            (AttrValue::Acl(a), AttrValue::Acl(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        AttrValue::String(value.clone())
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttrValue {
                fn from(value: $ty) -> Self {
                    AttrValue::Number(Number::from(value))
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, usize);

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(AttrValue::Number)
            .unwrap_or(AttrValue::Null)
    }
}

impl From<DateTime<Utc>> for AttrValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttrValue::Date(value)
    }
}

impl From<FileRef> for AttrValue {
    fn from(value: FileRef) -> Self {
        AttrValue::File(value)
    }
}

impl From<Acl> for AttrValue {
    fn from(value: Acl) -> Self {
        AttrValue::Acl(value)
    }
}

impl From<RemoteObject> for AttrValue {
    fn from(value: RemoteObject) -> Self {
        AttrValue::Pointer(Box::new(value))
    }
}

impl From<&RemoteObject> for AttrValue {
    fn from(value: &RemoteObject) -> Self {
        AttrValue::Pointer(Box::new(value.clone()))
    }
}

impl From<BTreeMap<String, AttrValue>> for AttrValue {
    fn from(value: BTreeMap<String, AttrValue>) -> Self {
        AttrValue::Object(value)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(values: Vec<T>) -> Self {
        AttrValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttrValue::Null)
    }
}
