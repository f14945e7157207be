//! Configuration trees, their merge policies and their file formats.

mod builder;
pub mod codec;
mod coerce;
mod error;
mod format;
mod loader;
mod merge;
mod node;
mod value;

pub use builder::ConfigBuilder;
pub use error::ConfigError;
pub use format::Format;
pub use loader::parse_data;
pub use merge::{merge_preserve, merge_replace};
pub use node::{ArrayObject, ConfigNode};
pub use value::{Data, DataMap, Key, Scalar, Value};
