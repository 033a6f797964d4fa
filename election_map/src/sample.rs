//! A small built-in dataset, used when no data is provided.
//!
//! Three candidates over six rectangular districts laid out around the default map
//! center. The figures are illustrative and are not official results.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::config::*;

/// The candidate columns, in column order.
pub const CANDIDATES: [&str; 3] = ["Coderre", "Bergeron", "Joly"];

const DISTRICTS: [(&str, [u64; 3]); 6] = [
    ("1-Nord-Ouest", [1812, 1204, 2917]),
    ("2-Nord", [4203, 1530, 2118]),
    ("3-Nord-Est", [2021, 3712, 1904]),
    ("4-Sud-Ouest", [3105, 911, 2620]),
    ("5-Sud", [2248, 2803, 3316]),
    ("6-Sud-Est", [7102, 1325, 1498]),
];

// Size of a district, in degrees.
const CELL_LON: f64 = 0.12;
const CELL_LAT: f64 = 0.08;

pub fn election() -> Vec<Row> {
    DISTRICTS
        .iter()
        .map(|(district, counts)| Row {
            district: district.to_string(),
            votes: CANDIDATES
                .iter()
                .zip(counts.iter())
                .map(|(name, count)| (name.to_string(), *count))
                .collect(),
            winner: None,
        })
        .collect()
}

/// The boundaries of the sample districts: two rows of three cells, north first.
pub fn election_geometry() -> GeometryCollection {
    let west = MapCenter::DEFAULT.lon - 1.5 * CELL_LON;
    let north = MapCenter::DEFAULT.lat + CELL_LAT;
    let features: Vec<Feature> = DISTRICTS
        .iter()
        .enumerate()
        .map(|(idx, (district, _))| {
            let lon0 = west + (idx % 3) as f64 * CELL_LON;
            let lat0 = north - (idx / 3 + 1) as f64 * CELL_LAT;
            let mut props = JsonObject::new();
            props.insert(
                GeometryCollection::DEFAULT_ID_PROPERTY.to_string(),
                JsonValue::String(district.to_string()),
            );
            Feature {
                bbox: None,
                geometry: Some(cell(lon0, lat0)),
                id: None,
                properties: Some(props),
                foreign_members: None,
            }
        })
        .collect();
    GeometryCollection::new(
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        GeometryCollection::DEFAULT_ID_PROPERTY,
    )
}

fn cell(lon0: f64, lat0: f64) -> Geometry {
    let (lon1, lat1) = (lon0 + CELL_LON, lat0 + CELL_LAT);
    Geometry::new(Value::Polygon(vec![vec![
        vec![lon0, lat0],
        vec![lon1, lat0],
        vec![lon1, lat1],
        vec![lon0, lat1],
        vec![lon0, lat0],
    ]]))
}
