//! XML rooted at `<config>`.
//!
//! Map keys become element names; index keys, names that are not valid XML
//! names and sequence elements are written as `<item>`. When reading,
//! attributes are ignored, an element whose children are all `<item>`s reads
//! as a sequence, repeated sibling names collect into a sequence, text is
//! coerced to numbers, booleans or null where it spells one and an empty
//! element reads as null.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::config::coerce::coerce_literal;
use crate::config::format::Format;
use crate::config::value::{Data, DataMap, Key, Scalar};
use crate::config::ConfigError;

const ROOT: &str = "config";
const ITEM: &str = "item";

/// An element being assembled while reading.
struct Frame {
    name: String,
    children: Vec<(String, Data)>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
            text: String::new(),
        }
    }

    fn finish(self) -> (String, Data) {
        let data = if self.children.is_empty() {
            let text = self.text.trim();
            if text.is_empty() {
                Data::NULL
            } else {
                Data::Scalar(coerce_literal(text))
            }
        } else if self.children.iter().all(|(name, _)| name == ITEM) {
            Data::Sequence(self.children.into_iter().map(|(_, data)| data).collect())
        } else {
            group_children(self.children)
        };
        (self.name, data)
    }
}

fn group_children(children: Vec<(String, Data)>) -> Data {
    let mut map = DataMap::new();
    for (name, data) in children {
        let key = Key::from(name);
        match map.get_mut(&key) {
            Some(Data::Sequence(items)) => items.push(data),
            Some(existing) => {
                let first = std::mem::replace(existing, Data::NULL);
                *existing = Data::Sequence(vec![first, data]);
            }
            None => {
                map.insert(key, data);
            }
        }
    }
    Data::Map(map)
}

pub fn decode(text: &str) -> Result<Data, ConfigError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text_start = true;
    reader.config_mut().trim_text_end = true;

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Data> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(Frame::new(element_name(&e))),
            Ok(Event::Empty(e)) => {
                let frame = Frame::new(element_name(&e));
                close(&mut stack, &mut root, frame)?;
            }
            Ok(Event::End(_)) => {
                let frame = stack.pop().ok_or_else(|| {
                    ConfigError::decode(Format::Xml, "unexpected closing tag")
                })?;
                close(&mut stack, &mut root, frame)?;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| ConfigError::decode(Format::Xml, err))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ConfigError::decode(
                    Format::Xml,
                    format!("{e} at position {}", reader.error_position()),
                ));
            }
        }
    }

    if let Some(frame) = stack.last() {
        return Err(ConfigError::decode(
            Format::Xml,
            format!("unclosed element <{}>", frame.name),
        ));
    }

    Ok(root.unwrap_or_else(Data::empty_map))
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn close(stack: &mut [Frame], root: &mut Option<Data>, frame: Frame) -> Result<(), ConfigError> {
    let (name, data) = frame.finish();
    match stack.last_mut() {
        Some(parent) => parent.children.push((name, data)),
        None if root.is_some() => {
            return Err(ConfigError::decode(Format::Xml, "multiple root elements"));
        }
        None => *root = Some(data),
    }
    Ok(())
}

/// Pretty-printed with four-space indentation under an XML declaration.
pub fn encode(map: &DataMap) -> Result<String, ConfigError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
    let io_error = |e: std::io::Error| ConfigError::encode(Format::Xml, e);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
        .map_err(io_error)?;
    writer
        .write_event(Event::Start(BytesStart::new(ROOT)))
        .map_err(io_error)?;
    write_map(&mut writer, map).map_err(io_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(ROOT)))
        .map_err(io_error)?;

    let mut xml = String::from_utf8(writer.into_inner())
        .map_err(|e| ConfigError::encode(Format::Xml, e))?;
    xml.push('\n');
    Ok(xml)
}

fn write_map(writer: &mut Writer<Vec<u8>>, map: &DataMap) -> std::io::Result<()> {
    for (key, data) in map {
        let name = match key {
            Key::Name(name) if is_xml_name(name) => name.as_str(),
            _ => ITEM,
        };
        write_element(writer, name, data)?;
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, data: &Data) -> std::io::Result<()> {
    match data {
        Data::Scalar(Scalar::Null) => writer.write_event(Event::Empty(BytesStart::new(name))),
        Data::Scalar(scalar) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(&scalar.to_string())))?;
            writer.write_event(Event::End(BytesEnd::new(name)))
        }
        Data::Sequence(items) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            for item in items {
                write_element(writer, ITEM, item)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))
        }
        Data::Map(map) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            write_map(writer, map)?;
            writer.write_event(Event::End(BytesEnd::new(name)))
        }
    }
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !name.to_ascii_lowercase().starts_with("xml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Data {
        Data::from(json!({
            "foo": "bar",
            "baz": {"hello": "world", "yo": {"whats": ["up", "dude"]}}
        }))
    }

    #[test]
    fn test_encode_layout() {
        let xml = encode(sample().as_map().unwrap()).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\"?>\n\
             <config>\n    \
                 <foo>bar</foo>\n    \
                 <baz>\n        \
                     <hello>world</hello>\n        \
                     <yo>\n            \
                         <whats>\n                \
                             <item>up</item>\n                \
                             <item>dude</item>\n            \
                         </whats>\n        \
                     </yo>\n    \
                 </baz>\n\
             </config>\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let data = Data::from(json!({
            "foo": "bar",
            "count": 3,
            "ratio": 0.5,
            "enabled": true,
            "missing": null,
            "escaped": "a < b & c",
            "baz": {"hello": "world", "yo": {"whats": ["up", "dude"]}},
            "single": ["only"],
            "7": "numeric key"
        }));
        let xml = encode(data.as_map().unwrap()).unwrap();
        assert!(xml.contains("<escaped>a &lt; b &amp; c</escaped>"));

        let mut expected = data.as_map().unwrap().clone();
        // Index keys come back as `item` elements.
        expected.shift_remove(&Key::Index(7));
        expected.insert(Key::from("item"), Data::from("numeric key"));
        assert_eq!(decode(&xml).unwrap(), Data::Map(expected));
    }

    #[test]
    fn test_decode_repeated_siblings_and_attributes() {
        let data = decode(
            r#"<?xml version="1.0"?>
            <!-- servers -->
            <config>
                <server name="a">one</server>
                <server>two</server>
                <port>8080</port>
                <note><![CDATA[<raw>]]></note>
            </config>"#,
        )
        .unwrap();
        assert_eq!(
            data,
            Data::from(json!({
                "server": ["one", "two"],
                "port": 8080,
                "note": "<raw>"
            }))
        );
    }

    #[test]
    fn test_text_keeps_words_and_padding() {
        let data = decode(
            "<config><mode>none</mode><answer>no</answer><zip>007</zip>\
             <port>8080</port><on>true</on><gone>null</gone></config>",
        )
        .unwrap();
        assert_eq!(
            data,
            Data::from(json!({
                "mode": "none",
                "answer": "no",
                "zip": "007",
                "port": 8080,
                "on": true,
                "gone": null
            }))
        );
    }

    #[test]
    fn test_decode_empty_document() {
        assert_eq!(decode("").unwrap(), Data::empty_map());
        assert_eq!(decode("<config/>").unwrap(), Data::NULL);
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            decode("<config><a></config>"),
            Err(ConfigError::Decode { format: Format::Xml, .. })
        ));
        assert!(decode("<config><a>").is_err());
    }

    #[test]
    fn test_xml_names() {
        assert!(is_xml_name("hello"));
        assert!(is_xml_name("_x.y-z"));
        assert!(!is_xml_name("1abc"));
        assert!(!is_xml_name("has space"));
        assert!(!is_xml_name("xmlns"));
        assert!(!is_xml_name(""));
    }
}
