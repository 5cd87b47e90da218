//! XML data model

use indexmap::IndexMap;

/// XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub root: Element,
}

/// XML element
///
/// Attribute names are kept verbatim, so `xlink:href` stays `xlink:href`.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Content>,
}

impl Element {
    /// Iterate over child elements, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            Content::Text(_) => None,
        })
    }
}

impl Drop for Element {
    // iterative, so dropping a deeply nested document cannot overflow the stack
    fn drop(&mut self) {
        if !self.children.iter().any(|c| matches!(c, Content::Element(_))) {
            return;
        }
        let mut pending = std::mem::take(&mut self.children);
        while let Some(content) = pending.pop() {
            if let Content::Element(mut element) = content {
                pending.append(&mut element.children);
            }
        }
    }
}

/// XML content node
///
/// Text runs that are whitespace only never make it into the model.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    Text(String),
}
