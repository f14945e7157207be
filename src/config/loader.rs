//! File-backed loading and writing.
//!
//! Reading is permissive: a file with an unrecognized extension, a missing
//! file and an unreadable file all load as an empty map. Writing is strict:
//! an unrecognized extension is [`ConfigError::UnsupportedFormat`].

use std::path::Path;

use tracing::{debug, warn};

use super::format::Format;
use super::node::ConfigNode;
use super::value::Data;
use super::ConfigError;

/// Reads and decodes a config file, choosing the codec by extension.
pub fn parse_data(path: impl AsRef<Path>) -> Result<Data, ConfigError> {
    Ok(load_config_file(path.as_ref(), false)?.unwrap_or_else(Data::empty_map))
}

/// Loads a config file.
///
/// Returns `Ok(None)` if the file can't be read or has an unrecognized
/// extension and `required` is false. A document that decodes to null loads
/// as an empty map.
pub(crate) fn load_config_file(
    path: &Path,
    required: bool,
) -> Result<Option<Data>, ConfigError> {
    let Some(format) = Format::from_path(path) else {
        if required {
            return Err(ConfigError::UnsupportedFormat(extension_token(path)));
        }
        debug!(path = %path.display(), "unrecognized config extension, loading empty config");
        return Ok(None);
    };

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            debug!(path = %path.display(), "config file not found, loading empty config");
            return Ok(None);
        }
        Err(e) => {
            if required {
                return Err(ConfigError::ReadError {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
            warn!(
                path = %path.display(),
                error = %e,
                "config file unreadable, loading empty config"
            );
            return Ok(None);
        }
    };

    let data = format
        .decode(&contents)
        .map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
    debug!(path = %path.display(), %format, "loaded config file");

    Ok(Some(if data.is_null() { Data::empty_map() } else { data }))
}

fn extension_token(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl ConfigNode {
    /// Loads a config file into a new node.
    ///
    /// ```no_run
    /// use cfgtree::ConfigNode;
    ///
    /// let config = ConfigNode::create_from_data("config/app.yaml", false)?;
    /// println!("{} keys", config.count());
    /// # Ok::<(), cfgtree::ConfigError>(())
    /// ```
    pub fn create_from_data(
        path: impl AsRef<Path>,
        allow_changes: bool,
    ) -> Result<Self, ConfigError> {
        Self::new(parse_data(path)?, allow_changes)
    }

    /// Loads a config file and merges it into this node. The change guard is
    /// checked before the file is touched.
    pub fn merge_from_data(
        &mut self,
        path: impl AsRef<Path>,
        preserve: bool,
    ) -> Result<&mut Self, ConfigError> {
        self.ensure_changes_allowed()?;
        let data = parse_data(path)?;
        self.merge(data, preserve)
    }

    /// Renders the tree in the format implied by the file extension and
    /// writes it to `path`.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let format = Format::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(extension_token(path)))?;
        let rendered = self.render_as(format)?;

        std::fs::write(path, rendered).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(path = %path.display(), %format, "wrote config file");
        Ok(())
    }
}
