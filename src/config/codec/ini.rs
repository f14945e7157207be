//! INI in the flavour of PHP's `parse_ini_file` with sections and typed values.
//!
//! ```ini
//! ; comment
//! one = 1
//! animal = "BIRD"
//!
//! [urls]
//! urls[svn] = "http://svn.php.net"
//! ```
//!
//! Quoted values understand `\"`, `\\`, `\n` and `\r` escapes.
//!
//! Inside section `[urls]`, keys written as `urls[...]` address the section
//! itself, which is how the encoder writes nested values. Only two levels of
//! nesting survive: deeper values are dropped on encode.

use tracing::warn;

use crate::config::coerce::coerce_value;
use crate::config::format::Format;
use crate::config::value::{format_float, next_index, Data, DataMap, Key, Scalar};
use crate::config::ConfigError;

pub fn decode(text: &str) -> Result<Data, ConfigError> {
    let mut root = DataMap::new();
    let mut section: Option<Key> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        let line_no = index + 1;
        if let Some(rest) = line.strip_prefix('[') {
            let name = rest
                .strip_suffix(']')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| syntax_error(line_no, "malformed section header"))?;
            let key = Key::from(name);
            root.entry(key.clone()).or_insert_with(Data::empty_map);
            section = Some(key);
            continue;
        }

        let (raw_key, raw_value) = line
            .split_once('=')
            .ok_or_else(|| syntax_error(line_no, "expected 'key = value'"))?;
        let (name, subkey) =
            split_key(raw_key.trim()).ok_or_else(|| syntax_error(line_no, "malformed key"))?;
        let value = parse_value(raw_value.trim())
            .ok_or_else(|| syntax_error(line_no, "unterminated string"))?;

        let folds_into_section = subkey.is_some()
            && section.as_ref().is_some_and(|section| section.to_string() == name);

        let scope = match &section {
            Some(section) => root.entry(section.clone()).or_insert_with(Data::empty_map),
            None => {
                insert_entry(&mut root, name, subkey, value);
                continue;
            }
        };

        if folds_into_section {
            assign(scope, subkey.flatten(), value);
        } else {
            insert_entry(ensure_map(scope), name, subkey, value);
        }
    }

    Ok(Data::Map(root))
}

pub fn encode(map: &DataMap) -> String {
    let mut out = String::new();

    for (key, data) in map {
        if let Data::Scalar(scalar) = data {
            out.push_str(&format!("{key} = {}\n", render_scalar(scalar)));
        }
    }

    for (key, data) in map {
        let entries: Vec<(Option<&Key>, &Data)> = match data {
            Data::Scalar(_) => continue,
            Data::Sequence(items) => items.iter().map(|item| (None, item)).collect(),
            Data::Map(children) => children.iter().map(|(k, v)| (Some(k), v)).collect(),
        };

        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{key}]\n"));

        for (subkey, child) in entries {
            let Data::Scalar(scalar) = child else {
                warn!(section = %key, "dropping INI value nested deeper than two levels");
                continue;
            };
            let bracket = match subkey {
                Some(Key::Name(name)) => name.as_str(),
                _ => "",
            };
            out.push_str(&format!("{key}[{bracket}] = {}\n", render_scalar(scalar)));
        }
    }

    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out
}

fn render_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Integer(i) => i.to_string(),
        Scalar::Float(f) => format_float(*f),
        Scalar::String(s) => format!("\"{}\"", escape(s)),
    }
}

/// Splits `name`, `name[]` or `name[sub]`. The outer `Option` of the subkey
/// tells whether brackets were present, the inner one whether they held a key.
fn split_key(raw: &str) -> Option<(&str, Option<Option<Key>>)> {
    let Some(open) = raw.find('[') else {
        return (!raw.is_empty()).then_some((raw, None));
    };
    let name = raw[..open].trim_end();
    let inner = raw[open + 1..].strip_suffix(']')?.trim();
    if name.is_empty() {
        return None;
    }
    let subkey = (!inner.is_empty()).then(|| Key::from(inner.trim_matches('"')));
    Some((name, Some(subkey)))
}

fn parse_value(raw: &str) -> Option<Data> {
    if let Some(rest) = raw.strip_prefix('"') {
        return parse_quoted(rest).map(Data::from);
    }
    let unquoted = match raw.find(';') {
        Some(pos) => raw[..pos].trim_end(),
        None => raw,
    };
    if let Some(inner) = unquoted
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return Some(Data::from(inner));
    }
    Some(Data::Scalar(coerce_value(unquoted)))
}

fn parse_quoted(rest: &str) -> Option<String> {
    let mut value = String::new();
    let mut chars = rest.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(escaped @ ('"' | '\\')) => value.push(escaped),
                Some('n') => value.push('\n'),
                Some('r') => value.push('\r'),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => return None,
            },
            '"' => return Some(value),
            _ => value.push(ch),
        }
    }
    None
}

fn insert_entry(scope: &mut DataMap, name: &str, subkey: Option<Option<Key>>, value: Data) {
    match subkey {
        None => {
            scope.insert(Key::from(name), value);
        }
        Some(subkey) => {
            let target = scope.entry(Key::from(name)).or_insert_with(Data::empty_map);
            assign(target, subkey, value);
        }
    }
}

/// Stores `value` under `subkey` in `target`, appending when there is no
/// subkey. An empty map turns into a sequence on its first append.
fn assign(target: &mut Data, subkey: Option<Key>, value: Data) {
    match subkey {
        Some(key) => {
            ensure_map(target).insert(key, value);
        }
        None => match target {
            Data::Sequence(items) => items.push(value),
            Data::Map(map) if !map.is_empty() => match next_index(map) {
                Some(next) => {
                    map.insert(Key::Index(next), value);
                }
                None => warn!("no free index left, dropping appended INI value"),
            },
            _ => *target = Data::Sequence(vec![value]),
        },
    }
}

/// Turns `data` into a map in place, sequences keeping their items under
/// index keys.
fn ensure_map(data: &mut Data) -> &mut DataMap {
    let map = match std::mem::replace(data, Data::NULL) {
        Data::Map(map) => map,
        Data::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (Key::from(i), item))
            .collect(),
        Data::Scalar(_) => DataMap::new(),
    };
    *data = Data::Map(map);
    let Data::Map(map) = data else {
        unreachable!("replaced with a map above");
    };
    map
}

fn syntax_error(line: usize, message: &str) -> ConfigError {
    ConfigError::decode(Format::Ini, format!("line {line}: {message}"))
}
