// ********* Input data structures ***********

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use geojson::{Feature, FeatureCollection, JsonValue};
use snafu::Snafu;

/// The results of one district.
///
/// In most cases, it is easier to assemble the rows with the
/// [`crate::builder::Builder`], which checks that all the rows agree on the candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Row {
    /// The district identifier. It must match the identifier property of a feature in the
    /// geometry collection for the district to be colored.
    pub district: String,
    /// The vote count of each candidate, in column order.
    pub votes: Vec<(String, u64)>,
    /// The winner, as recorded by the source of the data. If missing, the winner is
    /// the candidate with the most votes.
    pub winner: Option<String>,
}

impl Row {
    pub fn new(district: &str, votes: &[(&str, u64)]) -> Row {
        Row {
            district: district.to_string(),
            votes: votes
                .iter()
                .map(|(name, count)| (name.to_string(), *count))
                .collect(),
            winner: None,
        }
    }

    pub fn count(&self, candidate: &str) -> Option<u64> {
        self.votes
            .iter()
            .find(|(name, _)| name == candidate)
            .map(|(_, count)| *count)
    }

    /// The winner of the district.
    ///
    /// Ties go to the candidate that comes first in column order.
    pub fn winner(&self) -> Option<&str> {
        if let Some(w) = self.winner.as_deref() {
            return Some(w);
        }
        let mut best: Option<&(String, u64)> = None;
        for v in self.votes.iter() {
            match best {
                Some(b) if b.1 >= v.1 => {}
                _ => best = Some(v),
            }
        }
        best.map(|(name, _)| name.as_str())
    }
}

/// The boundaries of the districts, shared by all the layers of a map.
#[derive(Debug, Clone)]
pub struct GeometryCollection {
    features: FeatureCollection,
    id_property: String,
    districts: HashSet<String>,
}

impl GeometryCollection {
    pub const DEFAULT_ID_PROPERTY: &'static str = "district";

    /// Wraps a feature collection. `id_property` is the name of the feature property that
    /// holds the district identifier. Features without this property are kept but cannot be
    /// matched to a district.
    pub fn new(features: FeatureCollection, id_property: &str) -> GeometryCollection {
        let districts: HashSet<String> = features
            .features
            .iter()
            .filter_map(|f| district_of(f, id_property))
            .collect();
        GeometryCollection {
            features,
            id_property: id_property.to_string(),
            districts,
        }
    }

    pub fn contains(&self, district: &str) -> bool {
        self.districts.contains(district)
    }

    /// The path to the district identifier inside a feature, as the map expects it.
    pub fn feature_id_key(&self) -> String {
        format!("properties.{}", self.id_property)
    }

    /// The district identifier carried by a feature, if any.
    pub fn district_of(&self, feature: &Feature) -> Option<String> {
        district_of(feature, &self.id_property)
    }

    pub fn id_property(&self) -> &str {
        &self.id_property
    }

    pub fn features(&self) -> &FeatureCollection {
        &self.features
    }

    /// The number of features.
    pub fn len(&self) -> usize {
        self.features.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.features.is_empty()
    }

    /// The number of distinct district identifiers found in the features.
    pub fn num_districts(&self) -> usize {
        self.districts.len()
    }
}

// Numeric identifiers are matched through their string representation.
fn district_of(feature: &Feature, id_property: &str) -> Option<String> {
    match feature.properties.as_ref()?.get(id_property)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ******** Output data structures *********

/// One overlay of the map: the districts colored by the votes of one candidate.
#[derive(Debug, Clone)]
pub struct Layer {
    pub candidate: String,
    pub locations: Vec<String>,
    /// The vote count for each location, aligned with `locations`.
    pub values: Vec<u64>,
    pub visible: bool,
    pub geometry: Arc<GeometryCollection>,
}

/// One entry of the dropdown.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SelectorButton {
    pub label: String,
    /// The index of the layer shown by this button.
    pub layer_index: usize,
    /// The visibility of every layer once this button is pressed.
    pub visible: Vec<bool>,
}

/// The dropdown that switches between layers.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Selector {
    pub buttons: Vec<SelectorButton>,
    /// The index of the button selected when the page opens.
    pub active: usize,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub layers: Vec<Layer>,
    pub selector: Selector,
    pub settings: MapSettings,
    pub geometry: Arc<GeometryCollection>,
}

impl Document {
    pub fn visible_layers(&self) -> Vec<&Layer> {
        self.layers.iter().filter(|l| l.visible).collect()
    }
}

/// Errors that prevent a map from being built or written.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MapError {
    #[snafu(display("Malformed dataset: {reason}"))]
    MalformedDataset { reason: String },
    #[snafu(display("Invalid map settings: {reason}"))]
    InvalidSettings { reason: String },
    #[snafu(display("Error writing the map to {}", path.display()))]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("Error serializing the figure"))]
    Json { source: serde_json::Error },
}

// ********* Configuration **********

/// The bounds of the color scale.
///
/// They are fixed rather than derived from the data, so that maps of different
/// datasets stay comparable. Values outside of the range saturate the palette.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const DEFAULT: ValueRange = ValueRange {
        min: 0.0,
        max: 6500.0,
    };
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

impl MapCenter {
    // Montreal
    pub const DEFAULT: MapCenter = MapCenter {
        lat: 45.5517,
        lon: -73.7073,
    };
}

/// The order of the entries in the dropdown.
///
/// The visibility of each entry is always derived from the layer it points to,
/// so the order of the entries is only a matter of presentation.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ButtonOrder {
    /// Sorted by candidate name.
    Alphabetical,
    /// Same order as the layers.
    LayerOrder,
}

/// What to do with districts that have no boundary in the geometry collection.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MissingGeometry {
    /// Keep the district. It is not drawn on the map.
    Ignore,
    /// Fail with a malformed dataset error.
    Reject,
}

#[derive(PartialEq, Debug, Clone)]
pub struct MapSettings {
    /// The base map style.
    pub style: String,
    pub center: MapCenter,
    pub zoom: f64,
    pub value_range: ValueRange,
    pub marker_opacity: f64,
    pub marker_line_width: f64,
    /// The text displayed next to the dropdown.
    pub annotation: String,
    pub button_order: ButtonOrder,
    pub missing_geometry: MissingGeometry,
}

impl Default for MapSettings {
    fn default() -> Self {
        MapSettings {
            style: "carto-positron".to_string(),
            center: MapCenter::DEFAULT,
            zoom: 9.0,
            value_range: ValueRange::DEFAULT,
            marker_opacity: 1.0,
            marker_line_width: 0.2,
            annotation: "Candidate:".to_string(),
            button_order: ButtonOrder::Alphabetical,
            missing_geometry: MissingGeometry::Ignore,
        }
    }
}
