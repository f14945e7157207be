use crate::config::format::Format;
use crate::config::value::{Data, DataMap};
use crate::config::ConfigError;

pub fn decode(text: &str) -> Result<Data, ConfigError> {
    serde_json::from_str(text).map_err(|e| ConfigError::decode(Format::Json, e))
}

/// Pretty-printed, keys in insertion order.
pub fn encode(map: &DataMap) -> Result<String, ConfigError> {
    serde_json::to_string_pretty(map).map_err(|e| ConfigError::encode(Format::Json, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_is_exact() {
        let data = Data::from(json!({
            "foo": "bar",
            "baz": {"hello": "world", "yo": {"whats": ["up", "dude"]}},
            "0": 1,
            "ratio": 5.0,
            "off": false,
            "nothing": null
        }));
        let text = encode(data.as_map().unwrap()).unwrap();
        assert_eq!(decode(&text).unwrap(), data);
    }

    #[test]
    fn test_pretty_output() {
        let data = Data::from(json!({"foo": "bar", "n": 1}));
        let text = encode(data.as_map().unwrap()).unwrap();
        assert!(text.contains("\"foo\": \"bar\","));
        assert!(text.starts_with("{\n  \"foo\""));
    }

    #[test]
    fn test_malformed_input() {
        let err = decode("{\"foo\": ").unwrap_err();
        assert!(matches!(err, ConfigError::Decode { format: Format::Json, .. }));
    }
}
