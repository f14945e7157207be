//! Extension-driven dispatch to the format codecs.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::codec;
use super::value::{Data, DataMap};
use super::ConfigError;

/// A supported file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// A PHP file returning an array literal. Only literals are understood;
    /// nothing is executed.
    Php,
    Json,
    Yaml,
    Ini,
    Xml,
    Toml,
}

impl Format {
    pub const ALL: [Format; 6] = [
        Format::Php,
        Format::Json,
        Format::Yaml,
        Format::Ini,
        Format::Xml,
        Format::Toml,
    ];

    /// Maps a file extension (case-insensitive, leading dot optional) to a format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        match extension.to_ascii_lowercase().as_str() {
            "php" | "phtml" | "php3" => Some(Format::Php),
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "ini" => Some(Format::Ini),
            "xml" => Some(Format::Xml),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Php => "php",
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Ini => "ini",
            Format::Xml => "xml",
            Format::Toml => "toml",
        }
    }

    pub fn decode(self, text: &str) -> Result<Data, ConfigError> {
        match self {
            Format::Php => codec::php::decode(text),
            Format::Json => codec::json::decode(text),
            Format::Yaml => codec::yaml::decode(text),
            Format::Ini => codec::ini::decode(text),
            Format::Xml => codec::xml::decode(text),
            Format::Toml => codec::toml::decode(text),
        }
    }

    pub fn encode(self, map: &DataMap) -> Result<String, ConfigError> {
        match self {
            Format::Php => Ok(codec::php::encode(map)),
            Format::Json => codec::json::encode(map),
            Format::Yaml => codec::yaml::encode(map),
            Format::Ini => Ok(codec::ini::encode(map)),
            Format::Xml => codec::xml::encode(map),
            Format::Toml => codec::toml::encode(map),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| ConfigError::UnsupportedFormat(s.to_string()))
    }
}
