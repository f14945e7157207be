//! PHP files that `return` an array literal.
//!
//! Only literals are understood: arrays (`[...]` and `array(...)`), strings,
//! numbers, `true`, `false` and `null`. Anything else is a decode error, so a
//! config file can never run code.

use crate::config::format::Format;
use crate::config::value::{format_float, Data, DataMap, Key, Scalar, MAX_INDEX};
use crate::config::ConfigError;

const INDENT: &str = "    ";

pub fn decode(text: &str) -> Result<Data, ConfigError> {
    let mut parser = Parser::new(text);
    parser.skip_trivia();
    parser.eat_keyword("<?php");
    parser.skip_trivia();
    parser.eat_keyword("return");
    let value = parser.parse_value()?;
    parser.skip_trivia();
    parser.eat(';');
    parser.skip_trivia();
    parser.eat_keyword("?>");
    parser.skip_trivia();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

/// Renders `<?php return [...];` with short array syntax.
pub fn encode(map: &DataMap) -> String {
    let mut out = String::from("<?php\n\nreturn ");
    write_map(&mut out, map, 0);
    out.push_str(";\n");
    out
}

fn write_map(out: &mut String, map: &DataMap, depth: usize) {
    if map.is_empty() {
        out.push_str("[]");
        return;
    }
    out.push_str("[\n");
    for (key, data) in map {
        out.push_str(&INDENT.repeat(depth + 1));
        match key {
            Key::Index(i) => out.push_str(&i.to_string()),
            Key::Name(name) => out.push_str(&quote(name)),
        }
        out.push_str(" => ");
        write_data(out, data, depth + 1);
        out.push_str(",\n");
    }
    out.push_str(&INDENT.repeat(depth));
    out.push(']');
}

fn write_data(out: &mut String, data: &Data, depth: usize) {
    match data {
        Data::Scalar(scalar) => out.push_str(&literal(scalar)),
        Data::Map(map) => write_map(out, map, depth),
        Data::Sequence(items) if items.is_empty() => out.push_str("[]"),
        Data::Sequence(items) => {
            out.push_str("[\n");
            for item in items {
                out.push_str(&INDENT.repeat(depth + 1));
                write_data(out, item, depth + 1);
                out.push_str(",\n");
            }
            out.push_str(&INDENT.repeat(depth));
            out.push(']');
        }
    }
}

fn literal(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Integer(i) => i.to_string(),
        Scalar::Float(f) if f.is_nan() => "NAN".to_string(),
        Scalar::Float(f) if f.is_infinite() => {
            let literal = if *f > 0.0 { "INF" } else { "-INF" };
            literal.to_string()
        }
        Scalar::Float(f) => format_float(*f),
        Scalar::String(s) => quote(s),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consumes `keyword` case-insensitively when it is not followed by an
    /// identifier character.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = self.rest();
        let Some(head) = rest.get(..keyword.len()) else {
            return false;
        };
        let boundary =
            !rest[keyword.len()..].starts_with(|c: char| c.is_alphanumeric() || c == '_');
        if head.eq_ignore_ascii_case(keyword) && boundary {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") || trimmed.starts_with('#') {
                let end = trimmed.find('\n').unwrap_or(trimmed.len());
                self.pos += end;
            } else if let Some(body) = trimmed.strip_prefix("/*") {
                let end = body.find("*/").map_or(trimmed.len(), |i| i + 4);
                self.pos += end;
            } else {
                break;
            }
        }
    }

    fn error(&self, message: &str) -> ConfigError {
        ConfigError::decode(Format::Php, format!("{message} at byte {}", self.pos))
    }

    fn parse_value(&mut self) -> Result<Data, ConfigError> {
        self.skip_trivia();
        match self.peek() {
            Some('[') => {
                self.bump();
                self.parse_array(']')
            }
            Some('\'') => {
                self.bump();
                self.parse_single_quoted().map(Data::from)
            }
            Some('"') => {
                self.bump();
                self.parse_double_quoted().map(Data::from)
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.parse_number(),
            Some(_) => self.parse_word(),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_word(&mut self) -> Result<Data, ConfigError> {
        if self.eat_keyword("array") {
            self.skip_trivia();
            if !self.eat('(') {
                return Err(self.error("expected '(' after array"));
            }
            return self.parse_array(')');
        }
        for (keyword, data) in [
            ("true", Data::from(true)),
            ("false", Data::from(false)),
            ("null", Data::NULL),
            ("NAN", Data::from(f64::NAN)),
            ("INF", Data::from(f64::INFINITY)),
        ] {
            if self.eat_keyword(keyword) {
                return Ok(data);
            }
        }
        Err(self.error("only literal values are allowed"))
    }

    fn parse_array(&mut self, close: char) -> Result<Data, ConfigError> {
        let mut entries: Vec<(Option<Key>, Data)> = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(close) {
                break;
            }

            let first = self.parse_value()?;
            self.skip_trivia();
            let entry = if self.rest().starts_with("=>") {
                self.pos += 2;
                let key = array_key(first).ok_or_else(|| self.error("invalid array key"))?;
                (Some(key), self.parse_value()?)
            } else {
                (None, first)
            };
            entries.push(entry);

            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            if self.eat(close) {
                break;
            }
            return Err(self.error(&format!("expected ',' or '{close}'")));
        }

        if entries.iter().all(|(key, _)| key.is_none()) {
            return Ok(Data::Sequence(entries.into_iter().map(|(_, v)| v).collect()));
        }

        let mut map = DataMap::with_capacity(entries.len());
        let mut next = Some(0u64);
        for (key, value) in entries {
            let key = match key {
                Some(key) => key,
                None => Key::Index(next.ok_or_else(|| {
                    self.error("cannot add element, the next array index is already occupied")
                })?),
            };
            if let Key::Index(i) = key {
                if next.is_some_and(|next| i >= next) {
                    next = i.checked_add(1).filter(|next| *next <= MAX_INDEX);
                }
            }
            map.insert(key, value);
        }
        Ok(Data::Map(map))
    }

    fn parse_single_quoted(&mut self) -> Result<String, ConfigError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.peek() {
                    Some(c @ ('\'' | '\\')) => {
                        self.bump();
                        value.push(c);
                    }
                    _ => value.push('\\'),
                },
                Some('\'') => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn parse_double_quoted(&mut self) -> Result<String, ConfigError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some(c @ ('"' | '\\' | '$')) => c,
                        Some(other) => {
                            value.push('\\');
                            other
                        }
                        None => return Err(self.error("unterminated string")),
                    };
                    value.push(escaped);
                }
                Some('$') if self.peek().is_some_and(starts_interpolation) => {
                    return Err(self.error("string interpolation is not allowed"));
                }
                Some('"') => return Ok(value),
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Data, ConfigError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        self.skip_trivia();
        if self.eat_keyword("INF") {
            let infinity = if self.src[start..].starts_with('-') {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            };
            return Ok(Data::from(infinity));
        }

        let digits_start = self.pos;
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '-' | '+')
                && self.src[digits_start..self.pos].ends_with(['e', 'E']);
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_') || exponent_sign {
                self.bump();
            } else {
                break;
            }
        }

        let sign = if self.src[start..].starts_with('-') { "-" } else { "" };
        let literal = format!("{sign}{}", self.src[digits_start..self.pos].replace('_', ""));
        if let Ok(i) = literal.parse::<i64>() {
            return Ok(Data::from(i));
        }
        literal
            .parse::<f64>()
            .map(Data::from)
            .map_err(|_| self.error(&format!("invalid number '{literal}'")))
    }
}

fn starts_interpolation(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '{'
}

fn array_key(data: Data) -> Option<Key> {
    match data {
        Data::Scalar(Scalar::String(s)) => Some(Key::from(s)),
        Data::Scalar(Scalar::Integer(i)) => Some(Key::from(i)),
        Data::Scalar(Scalar::Bool(b)) => Some(Key::Index(u64::from(b))),
        Data::Scalar(Scalar::Null) => Some(Key::Name(String::new())),
        _ => None,
    }
}
