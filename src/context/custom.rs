//! Custom context values.
//!
//! A custom value is either encoded structurally through serde, or it
//! describes its own JSON encoding through [`AppendJson`]. Nested objects are
//! traversed so that self-describing values may appear at any depth.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Error as _, SerializeMap, Serializer};
use serde::Serialize;
use serde_json::value::RawValue;

/// A value that writes its own JSON encoding.
///
/// The bytes appended must form exactly one valid JSON value.
pub trait AppendJson: Send + Sync {
    fn append_json(&self, out: &mut Vec<u8>);
}

/// A value stored under a custom context key.
#[derive(Clone)]
pub enum CustomValue {
    /// Encoded structurally.
    Json(serde_json::Value),
    /// Ordered object whose values are encoded by the same rules.
    Object(Vec<(String, CustomValue)>),
    /// Encoded by the value itself.
    Encoded(Arc<dyn AppendJson>),
}

impl CustomValue {
    /// Wrap a self-describing value.
    pub fn encoded(value: impl AppendJson + 'static) -> Self {
        CustomValue::Encoded(Arc::new(value))
    }

    /// Build an ordered object from key/value pairs.
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<CustomValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        CustomValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Convert any serializable value into its structural form.
    pub fn from_serialize<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(CustomValue::Json)
    }

    fn encode_self(enc: &dyn AppendJson) -> Vec<u8> {
        let mut buf = Vec::new();
        enc.append_json(&mut buf);
        buf
    }
}

impl Serialize for CustomValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CustomValue::Json(value) => value.serialize(serializer),
            CustomValue::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            CustomValue::Encoded(enc) => {
                let json = String::from_utf8(Self::encode_self(enc.as_ref()))
                    .map_err(S::Error::custom)?;
                let raw = RawValue::from_string(json).map_err(S::Error::custom)?;
                raw.serialize(serializer)
            }
        }
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomValue::Json(value) => f.debug_tuple("Json").field(value).finish(),
            CustomValue::Object(entries) => f.debug_tuple("Object").field(entries).finish(),
            CustomValue::Encoded(enc) => {
                let bytes = Self::encode_self(enc.as_ref());
                f.debug_tuple("Encoded")
                    .field(&String::from_utf8_lossy(&bytes))
                    .finish()
            }
        }
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CustomValue::Json(a), CustomValue::Json(b)) => a == b,
            (CustomValue::Object(a), CustomValue::Object(b)) => a == b,
            (CustomValue::Encoded(a), CustomValue::Encoded(b)) => {
                Self::encode_self(a.as_ref()) == Self::encode_self(b.as_ref())
            }
            _ => false,
        }
    }
}

impl From<serde_json::Value> for CustomValue {
    fn from(value: serde_json::Value) -> Self {
        CustomValue::Json(value)
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for CustomValue {
                fn from(value: $ty) -> Self {
                    CustomValue::Json(serde_json::Value::from(value))
                }
            }
        )*
    };
}

impl_from_scalar!(&str, String, bool, i32, i64, u32, u64, f64);

/// Ordered custom key/value pairs.
///
/// Setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomContext(Vec<(String, CustomValue)>);

impl CustomContext {
    pub fn set(&mut self, key: &str, value: CustomValue) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CustomValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Remove all entries, keeping the allocation for reuse.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CustomValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for CustomContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
