/*!
Choropleth maps of election results.

A map is made of one layer per candidate, all sharing the same district boundaries, and a
dropdown that shows one layer at a time. See the [`manual`] for the command line interface.

```
use election_map::*;
use std::sync::Arc;

let rows = sample::election();
let geometry = Arc::new(sample::election_geometry());
let document = build_document(&rows, geometry, &MapSettings::default())?;
assert_eq!(document.layers.len(), 3);
let page = html::render_html(&document, &html::HtmlOptions::default())?;
assert!(page.starts_with("<!DOCTYPE html>"));
# Ok::<(), MapError>(())
```
*/

mod config;
pub mod builder;
pub mod html;
pub mod manual;
pub mod sample;
pub mod svg_map;

use log::{debug, info, warn};
use snafu::{ensure, OptionExt};

use std::collections::HashSet;
use std::sync::Arc;

pub use crate::config::*;

/// Builds the map for the given rows.
///
/// Arguments:
/// * `rows` the results, one row per district. All the rows must have the same candidates.
/// * `geometry` the boundaries of the districts
/// * `settings` the layout of the map and the bounds of the color scale
///
/// The layers follow the order returned by [`candidate_order`]. Only the first layer is
/// visible initially.
pub fn build_document(
    rows: &[Row],
    geometry: Arc<GeometryCollection>,
    settings: &MapSettings,
) -> Result<Document, MapError> {
    info!(
        "build_document: {} rows, {} features, settings: {:?}",
        rows.len(),
        geometry.len(),
        settings
    );
    check_settings(settings)?;
    let columns = candidate_columns(rows)?;
    check_geometry(rows, &geometry, settings.missing_geometry)?;

    let names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();
    let order = layer_order(rows, &names)?;
    for (idx, name) in order.iter().enumerate() {
        info!("Layer {}: {}", idx, name);
    }

    let locations: Vec<String> = rows.iter().map(|r| r.district.clone()).collect();
    let mut layers: Vec<Layer> = Vec::new();
    for (idx, name) in order.iter().enumerate() {
        let values = columns
            .iter()
            .find(|(cname, _)| cname == name)
            .map(|(_, values)| values.clone())
            .context(MalformedDatasetSnafu {
                reason: format!("no column for candidate {}", name),
            })?;
        layers.push(Layer {
            candidate: name.clone(),
            locations: locations.clone(),
            values,
            visible: idx == 0,
            geometry: geometry.clone(),
        });
    }

    let selector = build_selector(&order, settings.button_order);
    debug!("build_document: selector: {:?}", selector);

    Ok(Document {
        layers,
        selector,
        settings: settings.clone(),
        geometry,
    })
}

/// The order of the candidates, which is also the order of the layers.
///
/// Candidates come in the order in which they first win a district, reading the rows from
/// top to bottom. Candidates that win no district follow, in column order.
pub fn candidate_order(rows: &[Row]) -> Result<Vec<String>, MapError> {
    let columns = candidate_columns(rows)?;
    let names: Vec<String> = columns.into_iter().map(|(name, _)| name).collect();
    layer_order(rows, &names)
}

/// The visibility of all the layers when only `layer_index` is shown.
pub fn visibility_mask(num_layers: usize, layer_index: usize) -> Vec<bool> {
    (0..num_layers).map(|j| j == layer_index).collect()
}

/// Builds the dropdown for layers named after `order`.
///
/// Each button is derived from the index of its layer, whatever the display order.
pub fn build_selector(order: &[String], button_order: ButtonOrder) -> Selector {
    let mut buttons: Vec<SelectorButton> = order
        .iter()
        .enumerate()
        .map(|(idx, name)| SelectorButton {
            label: name.clone(),
            layer_index: idx,
            visible: visibility_mask(order.len(), idx),
        })
        .collect();
    if button_order == ButtonOrder::Alphabetical {
        buttons.sort_by(|a, b| a.label.cmp(&b.label));
    }
    let active = buttons
        .iter()
        .position(|b| b.layer_index == 0)
        .unwrap_or(0);
    Selector { buttons, active }
}

// The candidates in column order of the first row, with their values for every row.
// Fails if the rows do not agree on the candidates.
fn candidate_columns(rows: &[Row]) -> Result<Vec<(String, Vec<u64>)>, MapError> {
    let first = rows.first().context(MalformedDatasetSnafu {
        reason: "the dataset has no rows",
    })?;
    ensure!(
        !first.votes.is_empty(),
        MalformedDatasetSnafu {
            reason: format!("district {} has no candidates", first.district),
        }
    );
    let unique: HashSet<&String> = first.votes.iter().map(|(name, _)| name).collect();
    ensure!(
        unique.len() == first.votes.len(),
        MalformedDatasetSnafu {
            reason: format!("district {} lists a candidate twice", first.district),
        }
    );

    let mut columns: Vec<(String, Vec<u64>)> = first
        .votes
        .iter()
        .map(|(name, _)| (name.clone(), Vec::with_capacity(rows.len())))
        .collect();
    let mut districts: HashSet<&str> = HashSet::new();
    for row in rows.iter() {
        ensure!(
            districts.insert(row.district.as_str()),
            MalformedDatasetSnafu {
                reason: format!("district {} appears more than once", row.district),
            }
        );
        ensure!(
            row.votes.len() == columns.len(),
            MalformedDatasetSnafu {
                reason: format!(
                    "district {} has {} candidates, expected {}",
                    row.district,
                    row.votes.len(),
                    columns.len()
                ),
            }
        );
        for (name, values) in columns.iter_mut() {
            let count = row.count(name).context(MalformedDatasetSnafu {
                reason: format!("district {} has no count for {}", row.district, name),
            })?;
            values.push(count);
        }
    }
    Ok(columns)
}

fn layer_order(rows: &[Row], candidates: &[String]) -> Result<Vec<String>, MapError> {
    let mut order: Vec<String> = Vec::new();
    for row in rows.iter() {
        let winner = row.winner().context(MalformedDatasetSnafu {
            reason: format!("district {} has no candidates", row.district),
        })?;
        ensure!(
            candidates.iter().any(|c| c == winner),
            MalformedDatasetSnafu {
                reason: format!(
                    "district {} is won by {}, who is not a candidate",
                    row.district, winner
                ),
            }
        );
        if !order.iter().any(|c| c == winner) {
            order.push(winner.to_string());
        }
    }
    for c in candidates.iter() {
        if !order.contains(c) {
            order.push(c.clone());
        }
    }
    Ok(order)
}

fn check_geometry(
    rows: &[Row],
    geometry: &GeometryCollection,
    policy: MissingGeometry,
) -> Result<(), MapError> {
    let missing: Vec<&str> = rows
        .iter()
        .map(|r| r.district.as_str())
        .filter(|d| !geometry.contains(d))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    match policy {
        MissingGeometry::Reject => MalformedDatasetSnafu {
            reason: format!("no geometry for districts {:?}", missing),
        }
        .fail(),
        MissingGeometry::Ignore => {
            warn!(
                "No geometry for {} districts, they will not be drawn: {:?}",
                missing.len(),
                missing
            );
            Ok(())
        }
    }
}

fn check_settings(settings: &MapSettings) -> Result<(), MapError> {
    let range = settings.value_range;
    ensure!(
        range.min.is_finite() && range.max.is_finite() && range.min < range.max,
        InvalidSettingsSnafu {
            reason: format!("empty value range {:?}", range),
        }
    );
    ensure!(
        (0.0..=1.0).contains(&settings.marker_opacity),
        InvalidSettingsSnafu {
            reason: format!("marker opacity {} is not in [0, 1]", settings.marker_opacity),
        }
    );
    ensure!(
        settings.zoom.is_finite() && settings.zoom >= 0.0,
        InvalidSettingsSnafu {
            reason: format!("invalid zoom level {}", settings.zoom),
        }
    );
    ensure!(
        settings.marker_line_width.is_finite() && settings.marker_line_width >= 0.0,
        InvalidSettingsSnafu {
            reason: format!("invalid marker line width {}", settings.marker_line_width),
        }
    );
    ensure!(
        settings.center.lat.is_finite() && settings.center.lon.is_finite(),
        InvalidSettingsSnafu {
            reason: format!("invalid map center {:?}", settings.center),
        }
    );
    Ok(())
}
