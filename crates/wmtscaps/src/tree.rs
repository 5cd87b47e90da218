//! Tree types produced by XML conversion
//!
//! A [`Node`] is an order-preserving map from tag or attribute name to a
//! [`Value`]. Element text lives under the reserved [`TEXT_KEY`].

use indexmap::map::{IntoIter, Iter, Keys, Values};
use indexmap::IndexMap;
use std::ops::Index;

/// Reserved key holding an element's text content
pub const TEXT_KEY: &str = "#text";

/// An entry of a [`Node`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Attribute value or element text
    Text(String),
    /// A child element occurring once
    Node(Node),
    /// Repeated or array-forced child elements, in document order
    List(Vec<Value>),
}

impl Default for Value {
    fn default() -> Self {
        Self::Node(Node::new())
    }
}

impl Value {
    /// Returns true if this value is a text value
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns true if this value is a single node
    pub fn is_node(&self) -> bool {
        matches!(self, Self::Node(_))
    }

    /// Returns true if this value is a sequence
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Returns the text if this is a text value, None otherwise
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the node if this is a single node, None otherwise
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Node(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the items if this is a sequence, None otherwise
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Iterate over the nodes this entry holds, whether it is a single node or a
    /// sequence. Text values yield nothing.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        let items: &[Self] = match self {
            Self::List(items) => items,
            other => std::slice::from_ref(other),
        };
        items.iter().filter_map(Self::as_node)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Node> for Value {
    fn from(value: Node) -> Self {
        Self::Node(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

/// An order-preserving mapping of names to values
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Node(pub(crate) IndexMap<String, Value>);

impl Node {
    /// Creates a new empty node
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the node has no attributes, text or children
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a reference to the value stored under the key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the value stored under the key
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Inserts an entry, replacing any previous value in place.
    /// Returns the previous value if the key already existed
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns true if the node contains the specified key
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The element's text content, if any
    pub fn text(&self) -> Option<&str> {
        self.get(TEXT_KEY).and_then(Value::as_text)
    }

    /// Returns an iterator over the keys
    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values
    pub fn values(&self) -> Values<'_, String, Value> {
        self.0.values()
    }

    /// Returns an iterator over key-value pairs in insertion order
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.0.iter()
    }
}

impl Index<&str> for Node {
    type Output = Value;

    #[allow(clippy::indexing_slicing)]
    fn index(&self, key: &str) -> &Self::Output {
        &self.0[key]
    }
}

impl<'a> IntoIterator for &'a Node {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Node {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(mut self) -> Self::IntoIter {
        std::mem::take(&mut self.0).into_iter()
    }
}

impl Drop for Node {
    // iterative, so dropping a deeply nested tree cannot overflow the stack
    fn drop(&mut self) {
        if self.0.values().all(Value::is_text) {
            return;
        }
        let mut pending: Vec<Value> = self.0.drain(..).map(|(_, value)| value).collect();
        while let Some(value) = pending.pop() {
            match value {
                Value::Node(mut node) => pending.extend(node.0.drain(..).map(|(_, value)| value)),
                Value::List(items) => pending.extend(items),
                Value::Text(_) => {}
            }
        }
    }
}

impl FromIterator<(String, Value)> for Node {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}
