use std::path::{Path, PathBuf};

use tracing::debug;

use super::loader::load_config_file;
use super::merge::{merge_preserve, merge_replace};
use super::node::ConfigNode;
use super::value::{Data, DataMap};
use super::ConfigError;

/// A configuration source in the loading pipeline.
#[derive(Debug)]
enum ConfigSource {
    File { path: PathBuf, required: bool },
    Data(Data),
}

/// Builder for a [`ConfigNode`] layered from several sources.
///
/// Sources are merged in registration order, with later sources overriding
/// earlier ones. Nested maps are merged recursively; other values
/// (including sequences) are replaced entirely, unless [`preserve`] is set.
///
/// Merging happens on plain data before the node is built, so the result can
/// be read-only even though it was assembled from many pieces.
///
/// ## Example
///
/// ```no_run
/// use cfgtree::ConfigNode;
///
/// let config = ConfigNode::builder()
///     .with_file("config/default.yaml", true)
///     .with_file("config/local.json", false)
///     .build()?;
/// # Ok::<(), cfgtree::ConfigError>(())
/// ```
///
/// [`preserve`]: ConfigBuilder::preserve
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct ConfigBuilder {
    sources: Vec<ConfigSource>,
    allow_changes: bool,
    preserve: bool,
}

impl ConfigNode {
    /// Creates a new configuration builder.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl ConfigBuilder {
    /// Adds a config file, its format chosen by extension.
    ///
    /// If `required` is `true`, the build fails if the file doesn't exist or
    /// its extension is not recognized. Optional files that are missing are
    /// silently skipped.
    pub fn with_file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(ConfigSource::File {
            path: path.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Adds in-memory data, e.g. defaults or overrides computed at runtime.
    pub fn with_data(mut self, data: impl Into<Data>) -> Self {
        self.sources.push(ConfigSource::Data(data.into()));
        self
    }

    /// Whether the built node accepts changes. Defaults to `false`.
    pub fn allow_changes(mut self, allow_changes: bool) -> Self {
        self.allow_changes = allow_changes;
        self
    }

    /// Merge sources without losing values (see [`ConfigNode::merge`]).
    pub fn preserve(mut self, preserve: bool) -> Self {
        self.preserve = preserve;
        self
    }

    /// Loads and merges every source, then builds the node.
    pub fn build(self) -> Result<ConfigNode, ConfigError> {
        let mut merged = DataMap::new();

        for source in self.sources {
            let data = match source {
                ConfigSource::File { path, required } => {
                    match load_config_file(&path, required)? {
                        Some(data) => data,
                        None => continue,
                    }
                }
                ConfigSource::Data(data) => data,
            };

            let overlay = data.into_map()?;
            merged = if self.preserve {
                merge_preserve(merged, overlay)
            } else {
                merge_replace(&mut merged, overlay);
                merged
            };
        }

        debug!(keys = merged.len(), "built layered config");
        ConfigNode::new(merged, self.allow_changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        writeln!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_later_sources_override() {
        let defaults = file(".yaml", "db:\n  host: localhost\n  port: 5432\nname: app");
        let local = file(".json", r#"{"db": {"host": "db.internal"}}"#);

        let config = ConfigNode::builder()
            .with_file(defaults.path(), true)
            .with_file(local.path(), false)
            .with_data(Data::from(json!({"name": "override"})))
            .build()
            .unwrap();

        assert_eq!(
            config.to_array(),
            Data::from(json!({
                "db": {"host": "db.internal", "port": 5432},
                "name": "override"
            }))
        );
        assert!(!config.changes_allowed());
    }

    #[test]
    fn test_preserve_keeps_values() {
        let config = ConfigNode::builder()
            .with_data(Data::from(json!({"plugins": ["a"], "mode": "x"})))
            .with_data(Data::from(json!({"plugins": ["b"], "mode": "y"})))
            .preserve(true)
            .allow_changes(true)
            .build()
            .unwrap();

        assert_eq!(
            config.to_array(),
            Data::from(json!({"plugins": ["a", "b"], "mode": ["x", "y"]}))
        );
        assert!(config.changes_allowed());
    }

    #[test]
    fn test_required_file_missing() {
        let result = ConfigNode::builder()
            .with_file("/nonexistent/path/config.toml", true)
            .build();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_required_file_unknown_extension() {
        let notes = file(".txt", "hello");
        let result = ConfigNode::builder().with_file(notes.path(), true).build();
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ref t)) if t == "txt"));
    }

    #[test]
    fn test_optional_file_missing() {
        let config = ConfigNode::builder()
            .with_file("/nonexistent/path/config.toml", false)
            .build()
            .unwrap();
        assert!(config.is_empty());
    }

    #[test]
    fn test_scalar_source_rejected() {
        let result = ConfigNode::builder().with_data(42).build();
        assert!(matches!(result, Err(ConfigError::ScalarRoot(_))));
    }
}
