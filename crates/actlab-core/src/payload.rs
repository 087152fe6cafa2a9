//! Response bodies as returned by the service.
//!
//! Decoding tries JSON first, then XML, and finally hands back the body as
//! text. Raw-mode callers must be prepared for any of the three.

use crate::error::{ActLabError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Json(Value),
    Xml(Value),
    Text(String),
}

impl Payload {
    pub fn decode(body: &[u8]) -> Payload {
        if let Ok(value) = serde_json::from_slice::<Value>(body) {
            return Payload::Json(value);
        }
        let text = String::from_utf8_lossy(body).into_owned();
        match xml_to_value(&text) {
            Some(value) => {
                tracing::debug!("response was not json, decoded as xml");
                Payload::Xml(value)
            }
            None => {
                tracing::debug!("response was neither json nor xml, returning text");
                Payload::Text(text)
            }
        }
    }

    /// Structured value of the payload; text bodies become a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            Payload::Json(v) | Payload::Xml(v) => v,
            Payload::Text(s) => Value::String(s),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) | Payload::Xml(v) => Some(v),
            Payload::Text(_) => None,
        }
    }

    pub fn into_object(self) -> Result<Map<String, Value>> {
        match self.into_value() {
            Value::Object(map) => Ok(map),
            other => Err(ActLabError::UnexpectedPayload(format!(
                "expected an object, got {}",
                short(&other)
            ))),
        }
    }

    /// Items of a listing. Null and empty bodies are an empty listing; a
    /// single object is a listing of one.
    pub fn into_items(self) -> Result<Vec<Value>> {
        match self.into_value() {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
            obj @ Value::Object(_) => Ok(vec![obj]),
            other => Err(ActLabError::UnexpectedPayload(format!(
                "expected a list, got {}",
                short(&other)
            ))),
        }
    }
}

fn short(value: &Value) -> String {
    let mut s = value.to_string();
    if s.len() > 80 {
        let mut cut = 80;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

struct Element {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Option<Element> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut children = Map::new();
        for attr in start.attributes() {
            let attr = attr.ok()?;
            let key = format!("@{}", String::from_utf8_lossy(attr.key.as_ref()));
            let value = attr.unescape_value().ok()?.into_owned();
            children.insert(key, Value::String(value));
        }
        Some(Element {
            name,
            children,
            text: String::new(),
        })
    }

    fn close(self) -> Value {
        let text = self.text.trim();
        if self.children.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else {
            let mut children = self.children;
            if !text.is_empty() {
                children.insert("#text".to_string(), Value::String(text.to_string()));
            }
            Value::Object(children)
        }
    }
}

/// Repeated child elements collect into an array.
fn push_child(parent: &mut Map<String, Value>, name: String, value: Value) {
    match parent.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.insert(name, value);
        }
    }
}

/// Convert an XML document into a JSON structure: elements become objects
/// keyed by child name, attributes are `@name`, mixed text is `#text`, and
/// leaf elements collapse to their text.
pub fn xml_to_value(text: &str) -> Option<Value> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        match reader.read_event().ok()? {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                let name = element.name.clone();
                let value = element.close();
                match stack.last_mut() {
                    Some(parent) => push_child(&mut parent.children, name, value),
                    None => root = Some(wrap(name, value)),
                }
            }
            Event::End(_) => {
                let element = stack.pop()?;
                let name = element.name.clone();
                let value = element.close();
                match stack.last_mut() {
                    Some(parent) => push_child(&mut parent.children, name, value),
                    None => root = Some(wrap(name, value)),
                }
            }
            Event::Text(t) => {
                let content = t.unescape().ok()?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&content),
                    // text outside any element: not a document
                    None if !content.trim().is_empty() => return None,
                    None => {}
                }
            }
            Event::CData(c) => {
                let content = String::from_utf8_lossy(&c.into_inner()).into_owned();
                stack.last_mut()?.text.push_str(&content);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return None;
    }
    root
}

fn wrap(name: String, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(name, value);
    Value::Object(map)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_first() {
        let p = Payload::decode(br#"{"id": 3, "name": "x"}"#);
        assert_eq!(p, Payload::Json(json!({"id": 3, "name": "x"})));
    }

    #[test]
    fn xml_fallback() {
        let body = br#"<?xml version="1.0"?>
            <projects>
              <project kind="internal"><id>1</id><name>One</name></project>
              <project><id>2</id><name>Two &amp; more</name></project>
            </projects>"#;
        let p = Payload::decode(body);
        assert_eq!(
            p,
            Payload::Xml(json!({
                "projects": {
                    "project": [
                        {"@kind": "internal", "id": "1", "name": "One"},
                        {"id": "2", "name": "Two & more"}
                    ]
                }
            }))
        );
    }

    #[test]
    fn text_when_nothing_parses() {
        let p = Payload::decode(b"API key: 1-abcdef");
        assert_eq!(p, Payload::Text("API key: 1-abcdef".to_string()));
    }

    #[test]
    fn malformed_xml_is_text() {
        let p = Payload::decode(b"<a><b></a>");
        assert!(matches!(p, Payload::Text(_)));
    }

    #[test]
    fn empty_elements_are_null() {
        let value = xml_to_value("<page><name/><body></body></page>").unwrap();
        assert_eq!(value, json!({"page": {"name": null, "body": null}}));
    }

    #[test]
    fn items_of_listing() {
        assert!(Payload::Json(Value::Null).into_items().unwrap().is_empty());
        assert!(Payload::Text(String::new()).into_items().unwrap().is_empty());
        assert_eq!(Payload::Json(json!([1, 2])).into_items().unwrap().len(), 2);
        assert!(Payload::Json(json!(5)).into_items().is_err());
    }

    #[test]
    fn non_object_is_unexpected() {
        let err = Payload::Json(json!([1])).into_object().unwrap_err();
        assert!(matches!(err, ActLabError::UnexpectedPayload(_)));
    }
}
