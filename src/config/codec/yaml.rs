use crate::config::format::Format;
use crate::config::value::{Data, DataMap};
use crate::config::ConfigError;

pub fn decode(text: &str) -> Result<Data, ConfigError> {
    serde_yaml::from_str(text).map_err(|e| ConfigError::decode(Format::Yaml, e))
}

pub fn encode(map: &DataMap) -> Result<String, ConfigError> {
    serde_yaml::to_string(map).map_err(|e| ConfigError::encode(Format::Yaml, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::value::Key;
    use serde_json::json;

    #[test]
    fn test_decode_nested() {
        let data = decode(
            r#"
foo: bar
db:
  host: localhost
  port: 5432
replicas:
  - r1
  - r2
"#,
        )
        .unwrap();
        assert_eq!(
            data,
            Data::from(json!({
                "foo": "bar",
                "db": {"host": "localhost", "port": 5432},
                "replicas": ["r1", "r2"]
            }))
        );
    }

    #[test]
    fn test_integer_keys_become_indexes() {
        let data = decode("0: zero\n1: one\nname: x\n").unwrap();
        let keys: Vec<_> = data.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![Key::Index(0), Key::Index(1), Key::from("name")]);
    }

    #[test]
    fn test_round_trip() {
        let data = Data::from(json!({
            "foo": "bar",
            "nested": {"list": [1, 2.5, true, null], "text": "a: b"}
        }));
        let text = encode(data.as_map().unwrap()).unwrap();
        assert!(text.contains("foo: bar"));
        assert_eq!(decode(&text).unwrap(), data);
    }

    #[test]
    fn test_empty_document_is_null() {
        assert!(decode("").unwrap().is_null());
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            decode("foo: [unclosed"),
            Err(ConfigError::Decode { format: Format::Yaml, .. })
        ));
    }
}
