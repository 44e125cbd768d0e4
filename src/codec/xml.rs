use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Value};

use super::{CodecError, FormatCodec, utf8};
use crate::scalar::{parse_scalar, scalar_text};
use crate::tree::ConfigTree;

const ROOT: &str = "config";

/// XML via `quick-xml` events.
///
/// The root element's children form the top-level map. Elements with children
/// become maps, text-only elements become scalars (typed with
/// [`parse_scalar`]), empty elements become null, and repeated sibling names
/// collect into a list. Attributes are ignored. Encoding wraps the tree in a
/// `<config>` root and writes lists as repeated elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn finish(self) -> (String, Value) {
        let value = if !self.children.is_empty() {
            Value::Object(self.children)
        } else if self.text.is_empty() {
            Value::Null
        } else {
            parse_scalar(&self.text)
        };
        (self.name, value)
    }
}

fn element_name(start: &BytesStart<'_>) -> Result<String, CodecError> {
    std::str::from_utf8(start.name().as_ref())
        .map(str::to_string)
        .map_err(CodecError::wrap)
}

fn attach(stack: &mut [Frame], root: &mut Option<Value>, name: String, value: Value) {
    let Some(parent) = stack.last_mut() else {
        *root = Some(value);
        return;
    };
    match parent.children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.children.insert(name, value);
        }
    }
}

impl FormatCodec for XmlCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ConfigTree, CodecError> {
        let mut reader = Reader::from_str(utf8(bytes)?);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<Value> = None;

        loop {
            match reader.read_event().map_err(CodecError::wrap)? {
                Event::Start(start) => stack.push(Frame::new(element_name(&start)?)),
                Event::Empty(start) => {
                    let name = element_name(&start)?;
                    attach(&mut stack, &mut root, name, Value::Null);
                }
                Event::Text(text) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&text.unescape().map_err(CodecError::wrap)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::End(_) => {
                    let frame = stack
                        .pop()
                        .ok_or_else(|| CodecError::new("unbalanced closing tag"))?;
                    let (name, value) = frame.finish();
                    attach(&mut stack, &mut root, name, value);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(CodecError::new("unexpected end of document"));
        }
        match root {
            Some(Value::Null) => Ok(Value::Object(Map::new())),
            Some(value) => Ok(value),
            None => Err(CodecError::new("document has no root element")),
        }
    }

    fn encode(&self, tree: &ConfigTree) -> Result<Vec<u8>, CodecError> {
        if !tree.is_object() {
            return Err(CodecError::new("XML documents must be a map at the top level"));
        }
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(CodecError::wrap)?;
        write_element(&mut writer, ROOT, tree)?;
        let mut out = writer.into_inner();
        out.push(b'\n');
        Ok(out)
    }

    fn extensions(&self) -> &[&str] {
        &["xml"]
    }
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<(), CodecError> {
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
        }
        Value::Object(map) => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(CodecError::wrap)?;
            for (key, child) in map {
                write_element(writer, key, child)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(CodecError::wrap)?;
        }
        Value::Null => {
            writer
                .write_event(Event::Empty(BytesStart::new(name)))
                .map_err(CodecError::wrap)?;
        }
        scalar => {
            let text = scalar_text(scalar);
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(CodecError::wrap)?;
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(CodecError::wrap)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(CodecError::wrap)?;
        }
    }
    Ok(())
}
