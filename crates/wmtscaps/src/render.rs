//! Presentation of extracted layers through an injected renderer
//!
//! The map library, the layer switcher and the page title all live behind the
//! [`Renderer`] trait. [`present`] drives it in a fixed order: page title, map
//! view, grey background layer, the selected layer, then the layer switcher.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, StructureError, StructureErrorKind};
use crate::layers::{LayerDescriptor, Legend, DEFAULT_ATTRIBUTION};

/// Page title set when the map is presented
pub const DOCUMENT_TITLE: &str = "SwissTopo Basemaps";

/// Grey national map drawn underneath the selectable layers
pub const BACKGROUND_URL: &str =
    "https://wmts20.geo.admin.ch/1.0.0/ch.swisstopo.pixelkarte-grau/default/current/3857/{z}/{x}/{y}.jpeg";

/// Initial map view and zoom bounds
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MapView {
    /// `[lat, lng]`
    pub center: [f64; 2],
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub max_bounds_viscosity: f64,
    pub prefer_canvas: bool,
    pub zoom_control: bool,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: [46.501, 7.992],
            zoom: 10,
            min_zoom: 5,
            max_zoom: 15,
            max_bounds_viscosity: 0.5,
            prefer_canvas: true,
            zoom_control: false,
        }
    }
}

impl MapView {
    pub fn with_center(mut self, lat: f64, lng: f64) -> Self {
        self.center = [lat, lng];
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }
}

/// A selectable tile layer as handed to the renderer
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TileLayer {
    /// Position of the source descriptor in the ordered layer list
    pub id: usize,
    pub name: String,
    pub url: String,
    pub attribution: String,
    pub description: String,
    pub legend: Legend,
}

impl TileLayer {
    pub fn from_descriptor(id: usize, descriptor: &LayerDescriptor) -> Self {
        Self {
            id,
            name: descriptor.title.clone(),
            url: descriptor.url.clone(),
            attribution: descriptor.attribution.clone(),
            description: descriptor.description.clone(),
            legend: descriptor.legend.clone(),
        }
    }
}

/// Map side effects
pub trait Renderer {
    fn set_document_title(&mut self, title: &str);
    fn set_view(&mut self, view: &MapView);
    fn add_background(&mut self, url: &str, attribution: &str);
    /// Show `layer` on the map
    fn add_layer(&mut self, layer: &TileLayer);
    /// Offer `layers` for selection. Selection is reported back through
    /// [`Basemaps::select`].
    fn add_layer_switcher(&mut self, layers: &[TileLayer]);
}

/// Text shown next to the map for the selected layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfoPanel<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub url: &'a str,
}

/// Ordered layers plus the currently selected one
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Basemaps {
    layers: Vec<LayerDescriptor>,
    selected: usize,
}

impl Basemaps {
    pub fn new(layers: Vec<LayerDescriptor>) -> Self {
        Self {
            layers,
            selected: 0,
        }
    }

    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Select the layer with the given id. Out of range ids are ignored.
    pub fn select(&mut self, id: usize) -> bool {
        if id < self.layers.len() {
            self.selected = id;
            true
        } else {
            false
        }
    }

    pub fn selected_layer(&self) -> Option<&LayerDescriptor> {
        self.layers.get(self.selected)
    }

    pub fn panel(&self) -> Option<InfoPanel<'_>> {
        self.selected_layer().map(|layer| InfoPanel {
            title: &layer.title,
            description: &layer.description,
            url: &layer.url,
        })
    }

    /// Layers keyed by title for the switcher. A repeated title keeps the
    /// position of its first occurrence and the contents of its last.
    pub fn switcher_layers(&self) -> IndexMap<&str, TileLayer> {
        let mut by_title = IndexMap::with_capacity(self.layers.len());
        for (id, layer) in self.layers.iter().enumerate() {
            by_title.insert(layer.title.as_str(), TileLayer::from_descriptor(id, layer));
        }
        by_title
    }
}

/// Drive `renderer` to show the basemaps with the given initial view
pub fn present<R: Renderer>(basemaps: &Basemaps, view: &MapView, renderer: &mut R) -> Result<()> {
    let selected = basemaps.selected_layer().ok_or_else(|| {
        StructureError::new("Capabilities.Contents.Layer", StructureErrorKind::EmptyLayers)
    })?;
    let switcher = basemaps.switcher_layers();
    let active = switcher
        .get(selected.title.as_str())
        .ok_or_else(|| StructureError::missing(format!("switcher.{}", selected.title)))?;

    renderer.set_document_title(DOCUMENT_TITLE);
    renderer.set_view(view);
    renderer.add_background(BACKGROUND_URL, DEFAULT_ATTRIBUTION);
    renderer.add_layer(active);

    let layers: Vec<TileLayer> = switcher.values().cloned().collect();
    renderer.add_layer_switcher(&layers);
    debug!(layers = layers.len(), active = %active.name, "presented basemaps");

    Ok(())
}

/// A renderer call, as captured by [`Recorder`]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "command", rename_all = "snake_case"))]
pub enum Command {
    SetDocumentTitle { title: String },
    SetView(MapView),
    AddBackground { url: String, attribution: String },
    AddLayer(TileLayer),
    AddLayerSwitcher { layers: Vec<TileLayer> },
}

/// Renderer that records every call in order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recorder {
    commands: Vec<Command>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<Command> {
        self.commands
    }
}

impl Renderer for Recorder {
    fn set_document_title(&mut self, title: &str) {
        self.commands.push(Command::SetDocumentTitle {
            title: title.to_string(),
        });
    }

    fn set_view(&mut self, view: &MapView) {
        self.commands.push(Command::SetView(view.clone()));
    }

    fn add_background(&mut self, url: &str, attribution: &str) {
        self.commands.push(Command::AddBackground {
            url: url.to_string(),
            attribution: attribution.to_string(),
        });
    }

    fn add_layer(&mut self, layer: &TileLayer) {
        self.commands.push(Command::AddLayer(layer.clone()));
    }

    fn add_layer_switcher(&mut self, layers: &[TileLayer]) {
        self.commands.push(Command::AddLayerSwitcher {
            layers: layers.to_vec(),
        });
    }
}
