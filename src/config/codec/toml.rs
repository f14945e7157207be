use toml::{Table, Value};

use crate::config::format::Format;
use crate::config::value::{Data, DataMap, Key, Scalar};
use crate::config::ConfigError;

pub fn decode(text: &str) -> Result<Data, ConfigError> {
    let table: Table = text
        .parse()
        .map_err(|e| ConfigError::decode(Format::Toml, e))?;
    Ok(table_to_data(table))
}

/// TOML has no null, so null entries and null sequence items are omitted.
pub fn encode(map: &DataMap) -> Result<String, ConfigError> {
    toml::to_string_pretty(&map_to_table(map)).map_err(|e| ConfigError::encode(Format::Toml, e))
}

fn table_to_data(table: Table) -> Data {
    Data::Map(
        table
            .into_iter()
            .map(|(key, value)| (Key::from(key), value_to_data(value)))
            .collect(),
    )
}

fn value_to_data(value: Value) -> Data {
    match value {
        Value::String(s) => s.into(),
        Value::Integer(i) => i.into(),
        Value::Float(f) => f.into(),
        Value::Boolean(b) => b.into(),
        Value::Datetime(dt) => dt.to_string().into(),
        Value::Array(items) => Data::Sequence(items.into_iter().map(value_to_data).collect()),
        Value::Table(table) => table_to_data(table),
    }
}

fn map_to_table(map: &DataMap) -> Table {
    map.iter()
        .filter_map(|(key, data)| data_to_value(data).map(|value| (key.to_string(), value)))
        .collect()
}

fn data_to_value(data: &Data) -> Option<Value> {
    match data {
        Data::Scalar(Scalar::Null) => None,
        Data::Scalar(Scalar::Bool(b)) => Some(Value::Boolean(*b)),
        Data::Scalar(Scalar::Integer(i)) => Some(Value::Integer(*i)),
        Data::Scalar(Scalar::Float(f)) => Some(Value::Float(*f)),
        Data::Scalar(Scalar::String(s)) => Some(Value::String(s.clone())),
        Data::Sequence(items) => Some(Value::Array(
            items.iter().filter_map(data_to_value).collect(),
        )),
        Data::Map(map) => Some(Value::Table(map_to_table(map))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_tables_in_order() {
        let data = decode(
            r#"
            name = "app"
            when = 1979-05-27T07:32:00Z

            [server]
            port = 8080
            hosts = ["a", "b"]
            "#,
        )
        .unwrap();

        let keys: Vec<_> = data.as_map().unwrap().keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["name", "when", "server"]);
        assert_eq!(data.get("when"), Some(&Data::from("1979-05-27T07:32:00Z")));
        assert_eq!(
            data.get("server"),
            Some(&Data::from(json!({"port": 8080, "hosts": ["a", "b"]})))
        );
    }

    #[test]
    fn test_encode_skips_nulls() {
        let data = Data::from(json!({"a": null, "b": [1, null, 2], "c": {"d": "e"}}));
        let text = encode(data.as_map().unwrap()).unwrap();
        assert_eq!(
            decode(&text).unwrap(),
            Data::from(json!({"b": [1, 2], "c": {"d": "e"}}))
        );
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            decode("key = "),
            Err(ConfigError::Decode { format: Format::Toml, .. })
        ));
    }
}
