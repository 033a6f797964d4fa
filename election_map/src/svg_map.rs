//! Drawing of a [`Document`] as SVG, with one group per layer.
//!
//! The districts are projected with Web Mercator around the center of the map, at the zoom
//! level of the settings, so that the framing is the same as with the plotly renderer. No
//! base map is drawn: displaying the result fetches nothing.

use std::collections::HashMap;
use std::f64::consts::PI;

use geojson::Value as GeoValue;
use log::debug;
use svg::node::element::path::Data;
use svg::node::element::{Group, Path, Rectangle, Text, Title};
use svg::Document as SvgDocument;

use crate::config::*;

/// Size of the drawing, in user units.
pub const WIDTH: f64 = 960.0;
pub const HEIGHT: f64 = 640.0;

// Width of the world at zoom 0, in the same units as mapbox.
const WORLD_SIZE: f64 = 512.0;
// Web Mercator is undefined at the poles.
const MAX_LATITUDE: f64 = 85.051_128_78;

const BACKGROUND: &str = "#e5ecf6";
const LINE_COLOR: &str = "#444444";

// The Plasma color scale, from the lowest to the highest value.
const PLASMA: [(u8, u8, u8); 10] = [
    (0x0d, 0x08, 0x87),
    (0x46, 0x03, 0x9f),
    (0x72, 0x01, 0xa8),
    (0x9c, 0x17, 0x9e),
    (0xbd, 0x37, 0x86),
    (0xd8, 0x57, 0x6b),
    (0xed, 0x79, 0x53),
    (0xfb, 0x9f, 0x3a),
    (0xfd, 0xca, 0x26),
    (0xf0, 0xf9, 0x21),
];

// Color bar, on the right side of the drawing.
const BAR_X: f64 = WIDTH - 70.0;
const BAR_Y: f64 = 60.0;
const BAR_WIDTH: f64 = 16.0;
const BAR_HEIGHT: f64 = HEIGHT - 120.0;
const BAR_STEPS: usize = 40;

/// The id of the group that holds a layer, in a page where the map is in `div_id`.
pub fn layer_id(div_id: &str, layer_index: usize) -> String {
    format!("{}{}", layer_id_prefix(div_id), layer_index)
}

pub fn layer_id_prefix(div_id: &str) -> String {
    format!("{}-layer-", div_id)
}

/// The fill color of a value. Values outside of the range get the color of the closest bound.
pub fn color(value: f64, range: ValueRange) -> String {
    let t = (value - range.min) / (range.max - range.min);
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (PLASMA.len() - 1) as f64;
    let idx = (scaled.floor() as usize).min(PLASMA.len() - 2);
    let frac = scaled - idx as f64;
    let (lo, hi) = (PLASMA[idx], PLASMA[idx + 1]);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(lo.0, hi.0),
        mix(lo.1, hi.1),
        mix(lo.2, hi.2)
    )
}

/// Maps coordinates to the drawing, the center of the map being in the middle.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Viewport {
    scale: f64,
    origin: (f64, f64),
}

impl Viewport {
    pub fn new(center: MapCenter, zoom: f64) -> Viewport {
        let scale = WORLD_SIZE * 2.0_f64.powf(zoom);
        let (cx, cy) = mercator(center.lon, center.lat, scale);
        Viewport {
            scale,
            origin: (cx - WIDTH / 2.0, cy - HEIGHT / 2.0),
        }
    }

    /// The position of a GeoJSON position (longitude, latitude) on the drawing.
    pub fn point(&self, position: &[f64]) -> Option<(f64, f64)> {
        match position {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => {
                let (x, y) = mercator(*lon, *lat, self.scale);
                Some((round(x - self.origin.0), round(y - self.origin.1)))
            }
            _ => None,
        }
    }
}

fn mercator(lon: f64, lat: f64, scale: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0 * scale;
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * scale;
    (x, y)
}

fn round(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn ring_data(mut data: Data, ring: &[Vec<f64>], view: &Viewport) -> Data {
    let mut points = ring.iter().filter_map(|p| view.point(p));
    if let Some(first) = points.next() {
        data = data.move_to(first);
        for p in points {
            data = data.line_to(p);
        }
        data = data.close();
    }
    data
}

/// The outline of a geometry. Only polygons are drawn.
fn outline(value: &GeoValue, view: &Viewport) -> Option<Data> {
    let polygons: Vec<&Vec<Vec<Vec<f64>>>> = match value {
        GeoValue::Polygon(rings) => vec![rings],
        GeoValue::MultiPolygon(polygons) => polygons.iter().collect(),
        _ => return None,
    };
    let mut data = Data::new();
    for rings in polygons {
        for ring in rings.iter() {
            data = ring_data(data, ring, view);
        }
    }
    if data.is_empty() {
        None
    } else {
        Some(data)
    }
}

/// Draws the layers of the document.
///
/// Each layer is a group with the id given by [`layer_id`]. Hidden layers carry
/// `display="none"`. Districts without results are not drawn.
pub fn render_svg(doc: &Document, div_id: &str) -> SvgDocument {
    let settings = &doc.settings;
    let view = Viewport::new(settings.center, settings.zoom);

    // The outlines are computed once for all the layers.
    let shapes: Vec<(String, Data)> = doc
        .geometry
        .features()
        .features
        .iter()
        .filter_map(|f| {
            let district = doc.geometry.district_of(f)?;
            let data = outline(&f.geometry.as_ref()?.value, &view)?;
            Some((district, data))
        })
        .collect();
    debug!(
        "render_svg: {} outlines out of {} features",
        shapes.len(),
        doc.geometry.len()
    );

    let mut drawing = SvgDocument::new()
        .set("viewBox", (0, 0, WIDTH, HEIGHT))
        .set("preserveAspectRatio", "xMidYMid meet")
        .add(
            Rectangle::new()
                .set("width", WIDTH)
                .set("height", HEIGHT)
                .set("fill", BACKGROUND),
        );
    for (idx, layer) in doc.layers.iter().enumerate() {
        drawing = drawing.add(layer_group(layer, &layer_id(div_id, idx), &shapes, settings));
    }
    drawing.add(color_bar(settings.value_range))
}

fn layer_group(
    layer: &Layer,
    id: &str,
    shapes: &[(String, Data)],
    settings: &MapSettings,
) -> Group {
    let values: HashMap<&str, u64> = layer
        .locations
        .iter()
        .map(|l| l.as_str())
        .zip(layer.values.iter().copied())
        .collect();
    let mut group = Group::new()
        .set("id", id)
        .set("display", if layer.visible { "inline" } else { "none" })
        .set("fill-opacity", settings.marker_opacity)
        .set("fill-rule", "evenodd")
        .set("stroke", LINE_COLOR)
        .set("stroke-width", settings.marker_line_width);
    for (district, data) in shapes.iter() {
        let value = match values.get(district.as_str()) {
            Some(v) => *v,
            None => continue,
        };
        group = group.add(
            Path::new()
                .set("d", data.clone())
                .set("fill", color(value as f64, settings.value_range))
                .set("vector-effect", "non-scaling-stroke")
                .add(Title::new(format!(
                    "{}\n{}: {}",
                    district, layer.candidate, value
                ))),
        );
    }
    group
}

fn color_bar(range: ValueRange) -> Group {
    let step = BAR_HEIGHT / BAR_STEPS as f64;
    let mut bar = Group::new().set("id", "color-bar");
    for k in 0..BAR_STEPS {
        // Top of the bar is the maximum.
        let t = 1.0 - (k as f64 + 0.5) / BAR_STEPS as f64;
        let value = range.min + t * (range.max - range.min);
        bar = bar.add(
            Rectangle::new()
                .set("x", BAR_X)
                .set("y", round(BAR_Y + k as f64 * step))
                .set("width", BAR_WIDTH)
                // Overlap the next step to avoid gaps.
                .set("height", round(step + 0.5))
                .set("fill", color(value, range)),
        );
    }
    let label = |y: f64, v: f64| {
        Text::new(format!("{}", v))
            .set("x", BAR_X + BAR_WIDTH + 4.0)
            .set("y", y)
            .set("font-size", 12)
            .set("dominant-baseline", "middle")
    };
    bar.add(label(BAR_Y, range.max))
        .add(label(BAR_Y + BAR_HEIGHT, range.min))
}
