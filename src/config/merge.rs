//! Recursive merge policies over plain config data.

use tracing::warn;

use super::value::{next_index, Data, DataMap, Key};

/// Later values win. Maps merge recursively; everything else, sequences
/// included, is replaced outright.
pub fn merge_replace(base: &mut DataMap, overlay: DataMap) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Data::Map(base_map)), Data::Map(overlay_map)) => {
                merge_replace(base_map, overlay_map);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Merges without dropping any value.
///
/// Index keys from both sides are renumbered from zero, `overlay`'s after
/// `base`'s. Colliding names are combined: maps recurse, sequences
/// concatenate and scalars are collected into a sequence.
pub fn merge_preserve(base: DataMap, overlay: DataMap) -> DataMap {
    let mut merged = DataMap::with_capacity(base.len() + overlay.len());
    let mut next_index = 0u64;

    for (key, value) in base.into_iter().chain(overlay) {
        match key {
            Key::Index(_) => {
                merged.insert(Key::Index(next_index), value);
                next_index += 1;
            }
            name => match merged.get_mut(&name) {
                Some(slot) => {
                    let current = std::mem::replace(slot, Data::NULL);
                    *slot = combine(current, value);
                }
                None => {
                    merged.insert(name, value);
                }
            },
        }
    }

    merged
}

fn combine(base: Data, overlay: Data) -> Data {
    match (base, overlay) {
        (Data::Map(base), Data::Map(overlay)) => Data::Map(merge_preserve(base, overlay)),
        (Data::Map(mut base), overlay) => {
            for item in into_items(overlay) {
                let Some(next) = next_index(&base) else {
                    warn!("no free index left, dropping merged value");
                    continue;
                };
                base.insert(Key::Index(next), item);
            }
            Data::Map(base)
        }
        (base, Data::Map(overlay)) => {
            let base = into_items(base)
                .into_iter()
                .enumerate()
                .map(|(i, item)| (Key::from(i), item))
                .collect();
            Data::Map(merge_preserve(base, overlay))
        }
        (base, overlay) => {
            let mut items = into_items(base);
            items.extend(into_items(overlay));
            Data::Sequence(items)
        }
    }
}

fn into_items(data: Data) -> Vec<Data> {
    match data {
        Data::Sequence(items) => items,
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> DataMap {
        match Data::from(value) {
            Data::Map(map) => map,
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn test_replace_recurses_into_maps() {
        let mut base = map(json!({"db": {"host": "a", "port": 1}, "tags": ["x", "y"]}));
        merge_replace(
            &mut base,
            map(json!({"db": {"host": "b"}, "tags": ["z"], "new": true})),
        );
        assert_eq!(
            Data::Map(base),
            Data::from(json!({"db": {"host": "b", "port": 1}, "tags": ["z"], "new": true}))
        );
    }

    #[test]
    fn test_replace_keeps_key_position() {
        let mut base = map(json!({"a": 1, "b": 2}));
        merge_replace(&mut base, map(json!({"c": 3, "a": 9})));
        let keys: Vec<_> = base.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_replace_map_with_scalar() {
        let mut base = map(json!({"a": {"b": 1}}));
        merge_replace(&mut base, map(json!({"a": "flat"})));
        assert_eq!(Data::Map(base), Data::from(json!({"a": "flat"})));
    }

    #[test]
    fn test_preserve_collects_scalars() {
        let merged = merge_preserve(map(json!({"a": 1, "b": "x"})), map(json!({"a": 2})));
        assert_eq!(Data::Map(merged), Data::from(json!({"a": [1, 2], "b": "x"})));
    }

    #[test]
    fn test_preserve_concatenates_sequences() {
        let merged = merge_preserve(
            map(json!({"list": ["a", "b"], "deep": {"list": [1]}})),
            map(json!({"list": ["c"], "deep": {"list": [2, 3]}})),
        );
        assert_eq!(
            Data::Map(merged),
            Data::from(json!({"list": ["a", "b", "c"], "deep": {"list": [1, 2, 3]}}))
        );
    }

    #[test]
    fn test_preserve_renumbers_index_keys() {
        let mut base = DataMap::new();
        base.insert(Key::Index(5), Data::from("a"));
        base.insert(Key::from("name"), Data::from("n"));
        let mut overlay = DataMap::new();
        overlay.insert(Key::Index(5), Data::from("b"));

        let merged = merge_preserve(base, overlay);
        let keys: Vec<_> = merged.keys().cloned().collect();
        assert_eq!(keys, vec![Key::Index(0), Key::from("name"), Key::Index(1)]);
        assert_eq!(merged[&Key::Index(1)], Data::from("b"));
    }

    #[test]
    fn test_preserve_scalar_into_map() {
        let merged = merge_preserve(
            map(json!({"a": {"k": "v"}})),
            map(json!({"a": "extra"})),
        );
        assert_eq!(
            Data::Map(merged),
            Data::from(json!({"a": {"k": "v", "0": "extra"}}))
        );

        let merged = merge_preserve(map(json!({"a": "first"})), map(json!({"a": {"k": "v"}})));
        assert_eq!(
            Data::Map(merged),
            Data::from(json!({"a": {"0": "first", "k": "v"}}))
        );
    }

    #[test]
    fn test_preserve_append_near_index_limit() {
        let merged = merge_preserve(
            map(json!({"a": {"18446744073709551615": 1}})),
            map(json!({"a": 2})),
        );
        assert_eq!(
            Data::Map(merged),
            Data::from(json!({"a": {"18446744073709551615": 1, "0": 2}}))
        );

        let merged = merge_preserve(
            map(json!({"a": {"9223372036854775807": 1}})),
            map(json!({"a": 2})),
        );
        assert_eq!(
            Data::Map(merged),
            Data::from(json!({"a": {"9223372036854775807": 1}}))
        );
    }
}
