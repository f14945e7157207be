//! Per-format decoders and encoders.
//!
//! Each codec is a pair of free functions converting between text and
//! [`Data`](super::value::Data). Encoders take the root map because every
//! rendered document starts from a flattened [`ConfigNode`](super::ConfigNode).

pub mod ini;
pub mod json;
pub mod php;
pub mod toml;
pub mod xml;
pub mod yaml;
