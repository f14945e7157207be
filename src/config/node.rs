//! The configuration tree.

use std::ops::Index;

use indexmap::IndexMap;
use tracing::debug;

use super::format::Format;
use super::merge::{merge_preserve, merge_replace};
use super::value::{Data, DataMap, Key, Value, NULL};
use super::ConfigError;

/// A map of configuration values with a construction-time change guard.
///
/// Nested maps are stored as child nodes that share the root's
/// `allow_changes` flag. Keys keep their insertion order.
///
/// ```
/// use cfgtree::{ConfigError, ConfigNode, Data};
/// use serde_json::json;
///
/// let mut config = ConfigNode::new(Data::from(json!({"db": {"host": "localhost"}})), false)?;
/// assert_eq!(config["db"]["host"], "localhost");
/// assert!(matches!(config.set("db", "other"), Err(ConfigError::ChangesNotAllowed)));
/// # Ok::<(), ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigNode {
    values: IndexMap<Key, Value>,
    allow_changes: bool,
}

/// An alternate, detached view of a node's contents.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayObject {
    /// A generic JSON document.
    Native(serde_json::Value),
    /// A fresh node that accepts changes.
    Node(ConfigNode),
}

impl ConfigNode {
    /// Builds a node from a map or a sequence.
    ///
    /// Sequence roots are stored under index keys. A bare scalar has no keys
    /// to store and fails with [`ConfigError::ScalarRoot`].
    pub fn new(data: impl Into<Data>, allow_changes: bool) -> Result<Self, ConfigError> {
        let map = data.into().into_map()?;
        Ok(Self::from_map(map, allow_changes))
    }

    pub fn empty(allow_changes: bool) -> Self {
        Self {
            values: IndexMap::new(),
            allow_changes,
        }
    }

    pub(crate) fn from_map(map: DataMap, allow_changes: bool) -> Self {
        let values = map
            .into_iter()
            .map(|(key, data)| (key, Value::wrap(data, allow_changes)))
            .collect();
        Self {
            values,
            allow_changes,
        }
    }

    /// Decodes `text` in the given format and builds a node from it.
    pub fn parse(text: &str, format: Format, allow_changes: bool) -> Result<Self, ConfigError> {
        match format.decode(text)? {
            Data::Scalar(scalar) if scalar.is_null() => Ok(Self::empty(allow_changes)),
            data => Self::new(data, allow_changes),
        }
    }

    pub fn changes_allowed(&self) -> bool {
        self.allow_changes
    }

    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.values.get(&key.into())
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        self.values.contains_key(&key.into())
    }

    /// Number of top-level keys.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    pub fn len(&self) -> usize {
        self.count()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.values.keys()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.values.iter()
    }

    /// Property-style access along a dotted path, e.g. `"db.replicas.0"`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// Stores `value` under `key`. Maps inside `value` become child nodes
    /// carrying this node's change flag, exactly as at construction.
    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Data>) -> Result<(), ConfigError> {
        self.ensure_changes_allowed()?;
        self.values
            .insert(key.into(), Value::wrap(value.into(), self.allow_changes));
        Ok(())
    }

    /// Mutable access to the value under `key`. A read-only tree refuses it,
    /// so every child reached this way accepts changes too.
    pub fn get_mut(&mut self, key: impl Into<Key>) -> Result<Option<&mut Value>, ConfigError> {
        self.ensure_changes_allowed()?;
        Ok(self.values.get_mut(&key.into()))
    }

    /// The child node under `key`, e.g. to change `db.host` in place.
    pub fn node_mut(
        &mut self,
        key: impl Into<Key>,
    ) -> Result<Option<&mut ConfigNode>, ConfigError> {
        Ok(self.get_mut(key)?.and_then(Value::as_node_mut))
    }

    /// Removes `key`, keeping the order of the remaining keys.
    pub fn unset(&mut self, key: impl Into<Key>) -> Result<Option<Value>, ConfigError> {
        self.ensure_changes_allowed()?;
        Ok(self.values.shift_remove(&key.into()))
    }

    /// Flattens the tree into plain data. Always returns [`Data::Map`].
    pub fn to_array(&self) -> Data {
        Data::Map(self.to_map())
    }

    pub fn to_map(&self) -> DataMap {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), value.to_data()))
            .collect()
    }

    pub fn to_array_object(&self, native: bool) -> ArrayObject {
        if native {
            ArrayObject::Native(serde_json::Value::from(&self.to_array()))
        } else {
            ArrayObject::Node(Self::from_map(self.to_map(), true))
        }
    }

    /// Merges `other` into this node and returns `self` for chaining.
    ///
    /// With `preserve == false` values from `other` replace colliding ones,
    /// maps merging recursively. With `preserve == true` no value is lost:
    /// colliding scalars are collected into a sequence, sequences are
    /// concatenated and integer keys are appended after the existing ones.
    pub fn merge(
        &mut self,
        other: impl Into<Data>,
        preserve: bool,
    ) -> Result<&mut Self, ConfigError> {
        self.ensure_changes_allowed()?;
        let overlay = other.into().into_map()?;
        debug!(keys = overlay.len(), preserve, "merging config data");

        let merged = if preserve {
            merge_preserve(self.to_map(), overlay)
        } else {
            let mut base = self.to_map();
            merge_replace(&mut base, overlay);
            base
        };

        *self = Self::from_map(merged, self.allow_changes);
        Ok(self)
    }

    /// Renders the tree in the format named by `format`, an extension such
    /// as `"json"` or `".yml"`.
    pub fn render(&self, format: &str) -> Result<String, ConfigError> {
        self.render_as(format.parse()?)
    }

    pub fn render_as(&self, format: Format) -> Result<String, ConfigError> {
        format.encode(&self.to_map())
    }

    pub fn to_php(&self) -> Result<String, ConfigError> {
        self.render_as(Format::Php)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        self.render_as(Format::Json)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        self.render_as(Format::Yaml)
    }

    pub fn to_ini(&self) -> Result<String, ConfigError> {
        self.render_as(Format::Ini)
    }

    pub fn to_xml(&self) -> Result<String, ConfigError> {
        self.render_as(Format::Xml)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        self.render_as(Format::Toml)
    }

    pub(crate) fn ensure_changes_allowed(&self) -> Result<(), ConfigError> {
        if self.allow_changes {
            Ok(())
        } else {
            Err(ConfigError::ChangesNotAllowed)
        }
    }
}

impl From<&ConfigNode> for Data {
    fn from(node: &ConfigNode) -> Self {
        node.to_array()
    }
}

impl From<ConfigNode> for Data {
    fn from(node: ConfigNode) -> Self {
        node.to_array()
    }
}

impl<K: Into<Key>> Index<K> for ConfigNode {
    type Output = Value;

    /// Missing keys index to `Null` instead of panicking.
    fn index(&self, key: K) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl<'a> IntoIterator for &'a ConfigNode {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl ArrayObject {
    pub fn to_data(&self) -> Data {
        match self {
            ArrayObject::Native(json) => Data::from(json.clone()),
            ArrayObject::Node(node) => node.to_array(),
        }
    }
}
