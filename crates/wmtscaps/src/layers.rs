//! Layer descriptor extraction from a converted WMTS capabilities tree
//!
//! The tree is walked along `Capabilities.Contents.Layer`. Every layer needs a
//! `Dimension.Default` time value, a `ResourceURL` with a `template`
//! attribute, an `ows:Title` and an `ows:Abstract`. A `Style.LegendURL` with an
//! `xlink:href` is optional. Any missing required entry fails the whole
//! extraction.

use std::cmp::Ordering;

use tracing::{debug, instrument, trace, warn};

use crate::convert::{convert_with_options, ConvertOptions};
use crate::error::{Result, StructureError, StructureErrorKind};
use crate::tree::{Node, Value, TEXT_KEY};

/// Attribution shown for swisstopo layers, as ready-to-render HTML
pub const DEFAULT_ATTRIBUTION: &str =
    r#"<a title="Swiss Federal Office of Topography" href="https://www.swisstopo.admin.ch/">swisstopo</a>"#;

/// Layers whose URL contains this marker are listed first
pub const DEFAULT_PRIORITY_MARKER: &str = "pixel";

pub const CAPABILITIES: &str = "Capabilities";
pub const CONTENTS: &str = "Contents";
pub const LAYER: &str = "Layer";
const DIMENSION: &str = "Dimension";
const DEFAULT: &str = "Default";
const RESOURCE_URL: &str = "ResourceURL";
const TEMPLATE: &str = "template";
const TITLE: &str = "ows:Title";
const ABSTRACT: &str = "ows:Abstract";
const STYLE: &str = "Style";
const LEGEND_URL: &str = "LegendURL";
const HREF: &str = "xlink:href";

/// Placeholder substitutions applied to a resource template, in order
const TILE_PLACEHOLDERS: [(&str, &str); 3] =
    [("TileMatrix", "z"), ("TileCol", "x"), ("TileRow", "y")];

/// Extraction settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Attribution attached to every descriptor
    pub attribution: String,
    /// Substring of a layer URL that moves the layer to the front
    pub priority_marker: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            priority_marker: DEFAULT_PRIORITY_MARKER.to_string(),
        }
    }
}

impl ExtractConfig {
    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = attribution.into();
        self
    }

    pub fn with_priority_marker(mut self, marker: impl Into<String>) -> Self {
        self.priority_marker = marker.into();
        self
    }
}

/// Legend image of a layer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Legend {
    /// Link to the legend image, taken verbatim from the document
    Link(String),
    /// The layer has no legend. Serializes as `false`.
    Unavailable,
}

impl Legend {
    pub fn as_link(&self) -> Option<&str> {
        match self {
            Self::Link(href) => Some(href),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Link(_))
    }
}

impl From<Option<String>> for Legend {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Unavailable, Self::Link)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Legend {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Link(href) => serializer.serialize_str(href),
            Self::Unavailable => serializer.serialize_bool(false),
        }
    }
}

/// A tile layer ready for a slippy-map renderer
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LayerDescriptor {
    /// Tile URL template with `{z}`, `{x}` and `{y}` placeholders
    pub url: String,
    pub attribution: String,
    pub title: String,
    pub description: String,
    pub legend: Legend,
}

/// Convert and extract in one go. `Layer` is forced to a list.
pub fn layers_from_str(xml: &str, config: &ExtractConfig) -> Result<Vec<LayerDescriptor>> {
    let options = ConvertOptions::new().force_array(LAYER);
    let tree = convert_with_options(xml, &options)?;
    extract_layers_with_config(&tree, config)
}

/// Extract descriptors with the default attribution and priority marker
pub fn extract_layers(tree: &Node) -> Result<Vec<LayerDescriptor>> {
    extract_layers_with_config(tree, &ExtractConfig::default())
}

/// Extract descriptors from a converted capabilities tree, ordered so that
/// layers matching the priority marker come first
#[instrument(level = "debug", skip_all)]
pub fn extract_layers_with_config(
    tree: &Node,
    config: &ExtractConfig,
) -> Result<Vec<LayerDescriptor>> {
    let capabilities = child_node(tree, CAPABILITIES, "")?;
    let contents = child_node(capabilities, CONTENTS, CAPABILITIES)?;
    let layers_path = format!("{CAPABILITIES}.{CONTENTS}.{LAYER}");
    let entry = contents
        .get(LAYER)
        .ok_or_else(|| StructureError::missing(&layers_path))?;

    let items: &[Value] = match entry {
        Value::List(items) => items,
        single => std::slice::from_ref(single),
    };

    let mut layers = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let path = format!("{layers_path}[{index}]");
        let layer = item
            .as_node()
            .ok_or_else(|| StructureError::new(&path, StructureErrorKind::NotElement))?;
        let descriptor = layer_descriptor(layer, &path, config)?;
        trace!(index, title = %descriptor.title, url = %descriptor.url, "layer");
        layers.push(descriptor);
    }

    prioritize(&mut layers, &config.priority_marker);
    let promoted = layers
        .iter()
        .take_while(|layer| layer.url.contains(config.priority_marker.as_str()))
        .count();
    debug!(layers = layers.len(), promoted, "extracted layer descriptors");

    Ok(layers)
}

fn layer_descriptor(
    layer: &Node,
    path: &str,
    config: &ExtractConfig,
) -> std::result::Result<LayerDescriptor, StructureError> {
    let dimension_path = format!("{path}.{DIMENSION}");
    let dimension = child_node(layer, DIMENSION, path)?;
    let time = element_text(dimension, DEFAULT, &dimension_path)?;
    if time.is_empty() {
        warn!(path, "layer has an empty time dimension");
    }

    let resource_path = format!("{path}.{RESOURCE_URL}");
    let resource = child_node(layer, RESOURCE_URL, path)?;
    let template = attribute(resource, TEMPLATE, &resource_path)?;

    Ok(LayerDescriptor {
        url: tile_url(template, time),
        attribution: config.attribution.clone(),
        title: element_text(layer, TITLE, path)?.to_string(),
        description: element_text(layer, ABSTRACT, path)?.to_string(),
        legend: legend(layer),
    })
}

/// Turn a WMTS resource template into a `{z}/{x}/{y}` tile URL.
///
/// Each substitution replaces the first occurrence only: `{Time}` becomes
/// `time`, then `TileMatrix`, `TileCol` and `TileRow` become `z`, `x` and `y`.
pub fn tile_url(template: &str, time: &str) -> String {
    let url = template.replacen("{Time}", time, 1);
    TILE_PLACEHOLDERS
        .iter()
        .fold(url, |url, (from, to)| url.replacen(from, to, 1))
}

/// Orders `a` before `b` when only `a` contains the marker, after `b` when only
/// `b` does, and treats every other pair as equal
pub fn priority_cmp(a: &LayerDescriptor, b: &LayerDescriptor, marker: &str) -> Ordering {
    match (a.url.contains(marker), b.url.contains(marker)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Stable sort moving marker layers to the front. Relative order within the
/// marker and non-marker groups is preserved.
pub fn prioritize(layers: &mut [LayerDescriptor], marker: &str) {
    layers.sort_by(|a, b| priority_cmp(a, b, marker));
}

fn legend(layer: &Node) -> Legend {
    layer
        .get(STYLE)
        .and_then(|style| style.nodes().next())
        .and_then(|style| style.get(LEGEND_URL))
        .and_then(|legend| legend.nodes().next())
        .and_then(|legend| legend.get(HREF))
        .and_then(Value::as_text)
        .map(str::to_string)
        .into()
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// The single element stored under `key`
fn child_node<'a>(
    node: &'a Node,
    key: &str,
    parent: &str,
) -> std::result::Result<&'a Node, StructureError> {
    match node.get(key) {
        Some(Value::Node(child)) => Ok(child),
        // a forced single occurrence
        Some(Value::List(items)) => match items.as_slice() {
            [Value::Node(child)] => Ok(child),
            [] => Err(StructureError::missing(join(parent, key))),
            [_] => Err(StructureError::new(
                join(parent, key),
                StructureErrorKind::NotElement,
            )),
            _ => Err(StructureError::new(
                join(parent, key),
                StructureErrorKind::Ambiguous { count: items.len() },
            )),
        },
        Some(Value::Text(_)) => Err(StructureError::new(
            join(parent, key),
            StructureErrorKind::NotElement,
        )),
        None => Err(StructureError::missing(join(parent, key))),
    }
}

/// Text content of the single element under `key`. An element without text
/// yields an empty string.
fn element_text<'a>(
    node: &'a Node,
    key: &str,
    parent: &str,
) -> std::result::Result<&'a str, StructureError> {
    let child = child_node(node, key, parent)?;
    match child.get(TEXT_KEY) {
        Some(Value::Text(text)) => Ok(text),
        Some(_) => Err(StructureError::new(
            join(parent, key),
            StructureErrorKind::NotText,
        )),
        None => Ok(""),
    }
}

fn attribute<'a>(
    node: &'a Node,
    key: &str,
    parent: &str,
) -> std::result::Result<&'a str, StructureError> {
    match node.get(key) {
        Some(Value::Text(text)) => Ok(text),
        Some(_) => Err(StructureError::new(
            join(parent, key),
            StructureErrorKind::NotText,
        )),
        None => Err(StructureError::missing(join(parent, key))),
    }
}
