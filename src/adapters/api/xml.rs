//! Generic XML attribute tree.
//!
//! Vendor responses are parsed into an ordered mapping of tag name to
//! either text or a nested tree. When a tag repeats among siblings its
//! values are collected into an ordered sequence, so the same field can
//! be a single value in one response and a sequence in the next.
//! [`XmlValue::items`] normalizes both shapes.
//!
//! Attributes, comments and processing instructions are dropped; text
//! of elements that also have child elements is ignored.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::domain::error::IngestError;

/// Value of one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlValue {
    Text(String),
    Tree(XmlTree),
    /// Repeated sibling tags, in document order.
    Seq(Vec<XmlValue>),
}

/// Ordered mapping of tag name to value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlTree {
    entries: Vec<(String, XmlValue)>,
}

impl XmlTree {
    /// Add a child, folding repeats of the same tag into a sequence.
    pub fn insert(&mut self, name: String, value: XmlValue) {
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, XmlValue::Seq(items))) => items.push(value),
            Some((_, existing)) => {
                let first = std::mem::replace(existing, XmlValue::Seq(Vec::new()));
                *existing = XmlValue::Seq(vec![first, value]);
            }
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&XmlValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &XmlValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Follow a path of tag names, taking the first item of any sequence
    /// met along the way.
    pub fn path(&self, names: &[&str]) -> Option<&XmlValue> {
        let (first, rest) = names.split_first()?;
        let mut value = self.get(first)?;
        for name in rest {
            value = value.first().as_tree()?.get(name)?;
        }
        Some(value)
    }

    /// Text at a path, trimmed; empty text counts as absent.
    pub fn text(&self, names: &[&str]) -> Option<String> {
        self.path(names)
            .and_then(|v| v.first().as_text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

impl XmlValue {
    /// The value as a sequence: a single value becomes a one-item sequence.
    pub fn items(&self) -> Vec<&Self> {
        match self {
            Self::Seq(items) => items.iter().collect(),
            single => vec![single],
        }
    }

    /// First item of a sequence, or the value itself.
    pub fn first(&self) -> &Self {
        match self {
            Self::Seq(items) => items.first().unwrap_or(self),
            single => single,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub const fn as_tree(&self) -> Option<&XmlTree> {
        match self {
            Self::Tree(tree) => Some(tree),
            _ => None,
        }
    }
}

/// Open element while the document is being read.
struct Frame {
    name: String,
    children: XmlTree,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            children: XmlTree::default(),
            text: String::new(),
        }
    }

    fn into_value(self) -> (String, XmlValue) {
        let value = if self.children.is_empty() {
            XmlValue::Text(self.text.trim().to_string())
        } else {
            XmlValue::Tree(self.children)
        };
        (self.name, value)
    }
}

/// Parse a document into a tree holding its root element.
///
/// # Errors
/// [`IngestError::Parse`] when the document is not well-formed or has no
/// root element.
pub fn parse_document(body: &str) -> Result<XmlTree, IngestError> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root = XmlTree::default();

    let parse_err = |reader: &Reader<&[u8]>, err: &dyn std::fmt::Display| {
        IngestError::Parse(format!("at byte {}: {err}", reader.buffer_position()))
    };

    loop {
        let event = reader.read_event().map_err(|e| parse_err(&reader, &e))?;
        match event {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                stack.push(Frame::new(name));
            }
            Event::Empty(empty) => {
                let name = String::from_utf8_lossy(empty.local_name().as_ref()).into_owned();
                let (name, value) = Frame::new(name).into_value();
                attach(&mut stack, &mut root, name, value);
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| IngestError::Parse("unbalanced closing tag".to_string()))?;
                let (name, value) = frame.into_value();
                attach(&mut stack, &mut root, name, value);
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    let text = text.unescape().map_err(|e| parse_err(&reader, &e))?;
                    frame.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(IngestError::Parse(format!(
            "document ended inside <{}>",
            open.name
        )));
    }
    if root.is_empty() {
        return Err(IngestError::Parse("document has no root element".to_string()));
    }
    Ok(root)
}

fn attach(stack: &mut [Frame], root: &mut XmlTree, name: String, value: XmlValue) {
    match stack.last_mut() {
        Some(parent) => parent.children.insert(name, value),
        None => root.insert(name, value),
    }
}
