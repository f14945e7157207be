//! Keys, scalars and the two shapes a configuration tree takes.
//!
//! [`Data`] is the plain nested structure exchanged with codecs. [`Value`] is
//! what a [`ConfigNode`] stores: the same shape, but with every map wrapped as
//! a child node that carries its parent's change flag.

use std::fmt;
use std::ops::Index;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

use super::node::ConfigNode;
use super::ConfigError;

/// A map key: either a non-negative integer index or a name.
///
/// Strings that spell a canonical non-negative integer (`"0"`, `"42"`, but
/// not `"042"` or `"-1"`) convert to [`Key::Index`], so keys read from text
/// formats compare equal to keys written in code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Index(u64),
    Name(String),
}

impl Key {
    pub fn as_index(&self) -> Option<u64> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Index(_) => None,
            Key::Name(name) => Some(name),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, Key::Index(_))
    }
}

/// Largest index key, PHP's `PHP_INT_MAX`. Bigger numbers stay names.
pub(crate) const MAX_INDEX: u64 = i64::MAX as u64;

fn canonical_index(s: &str) -> Option<u64> {
    let digits = !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if digits && (s == "0" || !s.starts_with('0')) {
        s.parse().ok().filter(|i| *i <= MAX_INDEX)
    } else {
        None
    }
}

/// The index an appended entry takes: one past the largest index key, or
/// `None` once that would pass [`MAX_INDEX`].
pub(crate) fn next_index(map: &DataMap) -> Option<u64> {
    match map.keys().filter_map(Key::as_index).max() {
        Some(max) => max.checked_add(1).filter(|next| *next <= MAX_INDEX),
        None => Some(0),
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        canonical_index(s).map_or_else(|| Key::Name(s.to_string()), Key::Index)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        match canonical_index(&s) {
            Some(i) => Key::Index(i),
            None => Key::Name(s),
        }
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::from(s.as_str())
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

impl From<u64> for Key {
    fn from(i: u64) -> Self {
        if i <= MAX_INDEX {
            Key::Index(i)
        } else {
            Key::Name(i.to_string())
        }
    }
}

impl From<u32> for Key {
    fn from(i: u32) -> Self {
        Key::Index(u64::from(i))
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::from(i as u64)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        u64::try_from(i).map_or_else(|_| Key::Name(i.to_string()), Key::from)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::from(i64::from(i))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{i}"),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(KeyVisitor)
    }
}

struct KeyVisitor;

impl<'de> Visitor<'de> for KeyVisitor {
    type Value = Key;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer map key")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
        Ok(Key::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Key, E> {
        Ok(Key::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Key, E> {
        Ok(Key::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Key, E> {
        Ok(Key::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Key, E> {
        Ok(Key::Name(Scalar::Float(v).to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Key, E> {
        Ok(Key::Name(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Key, E> {
        Ok(Key::Name(String::new()))
    }
}

/// A leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Whole floats keep a trailing `.0` so they read back as floats.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(x) => f.write_str(&format_float(*x)),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Null => serializer.serialize_unit(),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Integer(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::String(s) => serializer.serialize_str(s),
        }
    }
}

pub type DataMap = IndexMap<Key, Data>;

/// A plain nested structure: what codecs decode into and encode from.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Scalar(Scalar),
    Sequence(Vec<Data>),
    Map(DataMap),
}

impl Data {
    pub const NULL: Data = Data::Scalar(Scalar::Null);

    pub fn empty_map() -> Self {
        Data::Map(DataMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Data::Scalar(Scalar::Null))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Data::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Data]> {
        match self {
            Data::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&DataMap> {
        match self {
            Data::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: impl Into<Key>) -> Option<&Data> {
        let key = key.into();
        match self {
            Data::Map(map) => map.get(&key),
            Data::Sequence(items) => key
                .as_index()
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| items.get(i)),
            Data::Scalar(_) => None,
        }
    }

    /// Converts a root structure into a map. Sequences become index-keyed
    /// maps; scalars have no keys and are rejected.
    pub fn into_map(self) -> Result<DataMap, ConfigError> {
        match self {
            Data::Map(map) => Ok(map),
            Data::Sequence(items) => Ok(items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Key::from(i), item))
                .collect()),
            Data::Scalar(scalar) => Err(ConfigError::ScalarRoot(scalar)),
        }
    }
}

impl From<Scalar> for Data {
    fn from(scalar: Scalar) -> Self {
        Data::Scalar(scalar)
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Data::Scalar(Scalar::String(s.to_string()))
    }
}

impl From<String> for Data {
    fn from(s: String) -> Self {
        Data::Scalar(Scalar::String(s))
    }
}

impl From<bool> for Data {
    fn from(b: bool) -> Self {
        Data::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Data {
    fn from(i: i64) -> Self {
        Data::Scalar(Scalar::Integer(i))
    }
}

impl From<i32> for Data {
    fn from(i: i32) -> Self {
        Data::Scalar(Scalar::Integer(i64::from(i)))
    }
}

impl From<u32> for Data {
    fn from(i: u32) -> Self {
        Data::Scalar(Scalar::Integer(i64::from(i)))
    }
}

impl From<f64> for Data {
    fn from(f: f64) -> Self {
        Data::Scalar(Scalar::Float(f))
    }
}

impl From<()> for Data {
    fn from(_: ()) -> Self {
        Data::NULL
    }
}

impl<T: Into<Data>> From<Option<T>> for Data {
    fn from(value: Option<T>) -> Self {
        value.map_or(Data::NULL, Into::into)
    }
}

impl<T: Into<Data>> From<Vec<T>> for Data {
    fn from(items: Vec<T>) -> Self {
        Data::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<DataMap> for Data {
    fn from(map: DataMap) -> Self {
        Data::Map(map)
    }
}

impl From<serde_json::Value> for Data {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Json::Null => Data::NULL,
            Json::Bool(b) => b.into(),
            Json::Number(n) => match n.as_i64() {
                Some(i) => i.into(),
                None => n.as_f64().unwrap_or_default().into(),
            },
            Json::String(s) => s.into(),
            Json::Array(items) => Data::Sequence(items.into_iter().map(Data::from).collect()),
            Json::Object(map) => Data::Map(
                map.into_iter()
                    .map(|(k, v)| (Key::from(k), Data::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&Data> for serde_json::Value {
    fn from(data: &Data) -> Self {
        use serde_json::Value as Json;
        match data {
            Data::Scalar(Scalar::Null) => Json::Null,
            Data::Scalar(Scalar::Bool(b)) => Json::Bool(*b),
            Data::Scalar(Scalar::Integer(i)) => Json::from(*i),
            Data::Scalar(Scalar::Float(f)) => {
                serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number)
            }
            Data::Scalar(Scalar::String(s)) => Json::String(s.clone()),
            Data::Sequence(items) => Json::Array(items.iter().map(Json::from).collect()),
            Data::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), Json::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Data {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Data::Scalar(scalar) => scalar.serialize(serializer),
            Data::Sequence(items) => serializer.collect_seq(items),
            Data::Map(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Data {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DataVisitor)
    }
}

struct DataVisitor;

impl<'de> Visitor<'de> for DataVisitor {
    type Value = Data;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a config value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Data, E> {
        Ok(v.into())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Data, E> {
        Ok(v.into())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Data, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => i.into(),
            Err(_) => (v as f64).into(),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Data, E> {
        Ok(v.into())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Data, E> {
        Ok(v.into())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Data, E> {
        Ok(v.into())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Data, E> {
        Ok(Data::NULL)
    }

    fn visit_none<E: de::Error>(self) -> Result<Data, E> {
        Ok(Data::NULL)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Data, D::Error> {
        Data::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Data, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Data::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Data, A::Error> {
        let mut map = DataMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<Key, Data>()? {
            map.insert(key, value);
        }
        Ok(Data::Map(map))
    }
}

/// A value stored in a [`ConfigNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Node(ConfigNode),
}

pub(crate) static NULL: Value = Value::Scalar(Scalar::Null);

impl Value {
    /// Wraps plain data, turning every map into a child node that carries
    /// `allow_changes`.
    pub(crate) fn wrap(data: Data, allow_changes: bool) -> Self {
        match data {
            Data::Scalar(scalar) => Value::Scalar(scalar),
            Data::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(|item| Value::wrap(item, allow_changes))
                    .collect(),
            ),
            Data::Map(map) => Value::Node(ConfigNode::from_map(map, allow_changes)),
        }
    }

    /// Flattens this value back into plain data.
    pub fn to_data(&self) -> Data {
        match self {
            Value::Scalar(scalar) => Data::Scalar(scalar.clone()),
            Value::Sequence(items) => Data::Sequence(items.iter().map(Value::to_data).collect()),
            Value::Node(node) => node.to_array(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Null))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(Scalar::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_scalar().and_then(Scalar::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Scalar::as_bool)
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&ConfigNode> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut ConfigNode> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Looks up a child by key. Sequences answer to index keys.
    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        match self {
            Value::Node(node) => node.get(key),
            Value::Sequence(items) => key
                .into()
                .as_index()
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| items.get(i)),
            Value::Scalar(_) => None,
        }
    }
}

impl<K: Into<Key>> Index<K> for Value {
    type Output = Value;

    /// Missing children index to `Null` instead of panicking.
    fn index(&self, key: K) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_i64() == Some(*other)
    }
}

impl PartialEq<i32> for Value {
    fn eq(&self, other: &i32) -> bool {
        self.as_i64() == Some(i64::from(*other))
    }
}

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        matches!(self, Value::Scalar(Scalar::Float(f)) if f == other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_normalizes_canonical_integers() {
        assert_eq!(Key::from("0"), Key::Index(0));
        assert_eq!(Key::from("42"), Key::Index(42));
        assert_eq!(Key::from("042"), Key::Name("042".into()));
        assert_eq!(Key::from("-1"), Key::Name("-1".into()));
        assert_eq!(Key::from(-3i64), Key::Name("-3".into()));
        assert_eq!(Key::from(""), Key::Name(String::new()));
        assert_eq!(
            Key::from("99999999999999999999999"),
            Key::Name("99999999999999999999999".into())
        );
    }

    #[test]
    fn test_index_keys_stop_at_i64_max() {
        assert_eq!(Key::from("9223372036854775807"), Key::Index(MAX_INDEX));
        assert_eq!(
            Key::from("18446744073709551615"),
            Key::Name("18446744073709551615".into())
        );
        assert_eq!(Key::from(u64::MAX), Key::Name(u64::MAX.to_string()));

        let mut map = DataMap::new();
        assert_eq!(next_index(&map), Some(0));
        map.insert(Key::Index(4), Data::NULL);
        assert_eq!(next_index(&map), Some(5));
        map.insert(Key::Index(MAX_INDEX), Data::NULL);
        assert_eq!(next_index(&map), None);
    }

    #[test]
    fn test_float_formatting_keeps_fraction() {
        assert_eq!(Scalar::Float(5.0).to_string(), "5.0");
        assert_eq!(Scalar::Float(5.1).to_string(), "5.1");
        assert_eq!(Scalar::Float(-0.25).to_string(), "-0.25");
    }

    #[test]
    fn test_data_from_json_preserves_order() {
        let data = Data::from(json!({"zeta": 1, "alpha": [true, null], "0": "x"}));
        let map = data.as_map().unwrap();
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![Key::from("zeta"), Key::from("alpha"), Key::Index(0)]
        );
        assert_eq!(
            map[&Key::from("alpha")],
            Data::Sequence(vec![Data::from(true), Data::NULL])
        );
    }

    #[test]
    fn test_into_map_rejects_scalar() {
        let err = Data::from("lonely").into_map().unwrap_err();
        assert!(matches!(err, ConfigError::ScalarRoot(Scalar::String(ref s)) if s == "lonely"));

        let map = Data::from(vec!["a", "b"]).into_map().unwrap();
        assert_eq!(map.get(&Key::Index(1)), Some(&Data::from("b")));
    }

    #[test]
    fn test_value_index_missing_is_null() {
        let value = Value::wrap(Data::from(json!({"a": {"b": [1, 2]}})), false);
        assert_eq!(value["a"]["b"][1usize], 2);
        assert!(value["a"]["missing"]["deeper"].is_null());
        assert!(value["a"]["b"]["name"].is_null());
    }
}
