//! A hierarchical configuration container.
//!
//! A [`ConfigNode`] holds a tree of scalars, sequences and nested nodes,
//! loaded from PHP-literal, JSON, YAML, INI, XML or TOML files, merged from
//! several sources and written back out in any of those formats. Mutation is
//! gated by a flag fixed at construction and shared by the whole tree.
//!
//! ```
//! use cfgtree::{ConfigNode, Data};
//! use serde_json::json;
//!
//! let mut config = ConfigNode::new(Data::from(json!({"db": {"host": "localhost"}})), true)?;
//! config.merge(Data::from(json!({"db": {"port": 5432}})), false)?;
//!
//! assert_eq!(config["db"]["port"], 5432);
//! assert!(config.to_json()?.contains("\"host\": \"localhost\""));
//! # Ok::<(), cfgtree::ConfigError>(())
//! ```
//!
//! A tree is not internally synchronized; share it across threads behind a
//! lock of the caller's choosing.

pub mod config;

pub use config::{
    parse_data, ArrayObject, ConfigBuilder, ConfigError, ConfigNode, Data, DataMap, Format, Key,
    Scalar, Value,
};
