//! XML to tree conversion
//!
//! Every element becomes a [`Node`]. Attributes are merged onto the element's
//! own node as text values, the element's text goes under [`TEXT_KEY`], and
//! children are attached under their tag name. A tag seen once is stored as a
//! bare node; a second occurrence turns the entry into a list. Tags named in
//! [`ConvertOptions::force_array`] are always lists.

use indexmap::map::Entry;
use indexmap::IndexSet;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::tree::{Node, Value, TEXT_KEY};
use crate::xml::model::{Content, Document, Element};
use crate::xml::parser::{Config as XmlConfig, Parser as XmlParser};

/// Conversion options
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Parser limits
    pub parser: XmlConfig,
    /// Tag names that always produce a list, even for a single occurrence
    pub force_array: IndexSet<String>,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a force-array tag name
    pub fn force_array(mut self, tag: impl Into<String>) -> Self {
        self.force_array.insert(tag.into());
        self
    }

    pub fn with_parser_config(mut self, parser: XmlConfig) -> Self {
        self.parser = parser;
        self
    }

    fn is_forced(&self, tag: &str) -> bool {
        self.force_array.contains(tag)
    }
}

/// Convert XML text to a tree, forcing the given tags to lists
pub fn convert(xml: &str, force_array: &[&str]) -> Result<Node> {
    let options = force_array
        .iter()
        .fold(ConvertOptions::new(), |options, tag| options.force_array(*tag));
    convert_with_options(xml, &options)
}

/// Convert XML text to a tree with options
pub fn convert_with_options(xml: &str, options: &ConvertOptions) -> Result<Node> {
    convert_bytes(xml.as_bytes(), options)
}

/// Convert raw XML bytes to a tree. The input must be UTF-8; a leading
/// byte-order mark is ignored.
#[instrument(level = "debug", skip_all, fields(bytes = input.len()))]
pub fn convert_bytes(input: &[u8], options: &ConvertOptions) -> Result<Node> {
    let mut parser = XmlParser::with_config(input, options.parser);
    let doc = parser.parse()?;
    let tree = document_to_tree(&doc, options);
    debug!(root = %doc.root.name, "converted document");
    Ok(tree)
}

/// Fold an already parsed document into a tree
pub fn document_to_tree(doc: &Document, options: &ConvertOptions) -> Node {
    let mut top = Node::new();
    let mut stack = vec![Frame::new(&doc.root)];

    while let Some(frame) = stack.last_mut() {
        let element: &Element = frame.element;
        match element.children.get(frame.next) {
            Some(Content::Text(text)) => {
                frame.next += 1;
                if !text.trim().is_empty() {
                    frame.node.insert(TEXT_KEY, text.as_str());
                }
            }
            Some(Content::Element(child)) => {
                frame.next += 1;
                stack.push(Frame::new(child));
            }
            None => {
                let Some(done) = stack.pop() else { break };
                let forced = options.is_forced(&done.element.name);
                let parent = match stack.last_mut() {
                    Some(parent) => &mut parent.node,
                    None => &mut top,
                };
                attach(parent, &done.element.name, done.node, forced);
            }
        }
    }

    top
}

/// An element whose children are still being folded into its node
struct Frame<'a> {
    element: &'a Element,
    node: Node,
    next: usize,
}

impl<'a> Frame<'a> {
    fn new(element: &'a Element) -> Self {
        let mut node = Node::new();
        for (name, value) in &element.attributes {
            node.insert(name.as_str(), value.as_str());
        }
        Self {
            element,
            node,
            next: 0,
        }
    }
}

/// Entry state for one tag name under a parent while children are attached
#[derive(Debug, PartialEq)]
enum Slot {
    Absent,
    Single(Value),
    Many(Vec<Value>),
}

impl Slot {
    fn from_entry(existing: Value) -> Self {
        match existing {
            // an empty attribute value does not count as an existing entry
            Value::Text(text) if text.is_empty() => Self::Absent,
            Value::List(items) => Self::Many(items),
            other => Self::Single(other),
        }
    }

    /// The entry that results from attaching one more element
    fn attach(self, node: Node, forced: bool) -> Value {
        match self {
            Self::Absent if forced => Value::List(vec![Value::Node(node)]),
            Self::Absent => Value::Node(node),
            Self::Single(existing) => Value::List(vec![existing, Value::Node(node)]),
            Self::Many(mut items) => {
                items.push(Value::Node(node));
                Value::List(items)
            }
        }
    }
}

fn attach(parent: &mut Node, name: &str, node: Node, forced: bool) {
    match parent.0.entry(name.to_string()) {
        Entry::Occupied(mut entry) => {
            let slot = Slot::from_entry(std::mem::take(entry.get_mut()));
            *entry.get_mut() = slot.attach(node, forced);
        }
        Entry::Vacant(entry) => {
            entry.insert(Slot::Absent.attach(node, forced));
        }
    }
}
