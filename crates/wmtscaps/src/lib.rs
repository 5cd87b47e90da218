//! wmtscaps - WMTS capabilities to tile-layer descriptors
//!
//! Two stages: an order-preserving XML to tree converter, and an extractor
//! that walks a capabilities tree into an ordered list of layer descriptors.
//!
//! # Quick Start
//!
//! ```
//! use wmtscaps::{convert, extract_layers, Legend};
//! # fn main() -> Result<(), wmtscaps::Error> {
//! let xml = r#"<Capabilities><Contents><Layer>
//!     <ows:Title>Map</ows:Title>
//!     <ows:Abstract>National map</ows:Abstract>
//!     <Dimension><Default>current</Default></Dimension>
//!     <ResourceURL template="https://t/{Time}/{TileMatrix}/{TileCol}/{TileRow}.png"/>
//! </Layer></Contents></Capabilities>"#;
//!
//! let tree = convert(xml, &["Layer"])?;
//! let layers = extract_layers(&tree)?;
//! assert_eq!(layers[0].url, "https://t/current/{z}/{x}/{y}.png");
//! assert_eq!(layers[0].legend, Legend::Unavailable);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{
    Error, ParseError, ParseErrorKind, Pos, Result, Span, StructureError, StructureErrorKind,
};

pub mod cursor;

pub mod tree;
pub use tree::{Node, Value, TEXT_KEY};

pub mod xml;
pub use xml::{Config as XmlConfig, Document as XmlDocument, Parser as XmlParser};

pub mod convert;
pub use convert::{convert, convert_bytes, convert_with_options, document_to_tree, ConvertOptions};

pub mod layers;
pub use layers::{
    extract_layers, extract_layers_with_config, layers_from_str, prioritize, priority_cmp,
    tile_url, ExtractConfig, LayerDescriptor, Legend,
};

pub mod render;
pub use render::{present, Basemaps, MapView, Recorder, Renderer, TileLayer};

/// Parse XML from string into the document model
pub fn from_xml_str(s: &str) -> std::result::Result<XmlDocument, ParseError> {
    XmlParser::new(s.as_bytes()).parse()
}
