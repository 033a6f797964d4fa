use crate::app::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub provider: Option<String>,
    #[serde(rename = "districtColumn")]
    pub district_column: Option<String>,
    #[serde(rename = "winnerColumn")]
    pub winner_column: Option<String>,
    pub candidates: Option<Vec<String>>,
    #[serde(rename = "ignoredColumns")]
    pub ignored_columns: Option<Vec<String>>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl DatasetSource {
    pub fn district_column(&self) -> &str {
        self.district_column.as_deref().unwrap_or("district")
    }

    /// The provider, guessed from the file extension if not set.
    pub fn provider(&self) -> String {
        match &self.provider {
            Some(p) => p.to_lowercase(),
            None => {
                let extension = Path::new(&self.file_path)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|s| s.to_lowercase());
                match extension.as_deref() {
                    Some("xlsx") => "xlsx".to_string(),
                    _ => "csv".to_string(),
                }
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometrySource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "featureIdProperty")]
    pub feature_id_property: Option<String>,
}

impl GeometrySource {
    pub fn feature_id_property(&self) -> &str {
        self.feature_id_property
            .as_deref()
            .unwrap_or(GeometryCollection::DEFAULT_ID_PROPERTY)
    }
}

#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CenterConfig {
    pub lat: f64,
    pub lon: f64,
}

#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RangeConfig {
    pub min: f64,
    pub max: f64,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapOptions {
    pub style: Option<String>,
    pub center: Option<CenterConfig>,
    pub zoom: Option<f64>,
    #[serde(rename = "valueRange")]
    pub value_range: Option<RangeConfig>,
    #[serde(rename = "markerOpacity")]
    pub marker_opacity: Option<f64>,
    #[serde(rename = "markerLineWidth")]
    pub marker_line_width: Option<f64>,
    pub annotation: Option<String>,
    #[serde(rename = "buttonOrder")]
    pub button_order: Option<String>,
    #[serde(rename = "missingGeometry")]
    pub missing_geometry: Option<String>,
}

impl MapOptions {
    /// The settings of the map: the defaults, overridden by the entries that are set.
    pub fn map_settings(&self) -> AppResult<MapSettings> {
        let mut settings = MapSettings::default();
        if let Some(style) = &self.style {
            settings.style = style.clone();
        }
        if let Some(c) = self.center {
            settings.center = MapCenter {
                lat: c.lat,
                lon: c.lon,
            };
        }
        if let Some(zoom) = self.zoom {
            settings.zoom = zoom;
        }
        if let Some(r) = self.value_range {
            settings.value_range = ValueRange {
                min: r.min,
                max: r.max,
            };
        }
        if let Some(opacity) = self.marker_opacity {
            settings.marker_opacity = opacity;
        }
        if let Some(width) = self.marker_line_width {
            settings.marker_line_width = width;
        }
        if let Some(annotation) = &self.annotation {
            settings.annotation = annotation.clone();
        }
        if let Some(order) = &self.button_order {
            settings.button_order = match order.as_str() {
                "alphabetical" => ButtonOrder::Alphabetical,
                "layerOrder" => ButtonOrder::LayerOrder,
                x => {
                    return UnknownOptionSnafu {
                        name: "buttonOrder",
                        value: x,
                    }
                    .fail()
                }
            };
        }
        if let Some(policy) = &self.missing_geometry {
            settings.missing_geometry = match policy.as_str() {
                "ignore" => MissingGeometry::Ignore,
                "reject" => MissingGeometry::Reject,
                x => {
                    return UnknownOptionSnafu {
                        name: "missingGeometry",
                        value: x,
                    }
                    .fail()
                }
            };
        }
        Ok(settings)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    pub title: Option<String>,
    pub renderer: Option<String>,
    #[serde(rename = "plotlyJs")]
    pub plotly_js: Option<String>,
    pub open: Option<bool>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapConfig {
    pub dataset: Option<DatasetSource>,
    pub geometry: Option<GeometrySource>,
    pub map: Option<MapOptions>,
    pub output: Option<OutputSettings>,
}

/// Reads a configuration file. Relative paths in the file are resolved from its directory.
pub fn read_config(path: &str) -> AppResult<MapConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut config: MapConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    let root = Path::new(path).parent().context(MissingParentDirSnafu { path })?;
    debug!("read_config: root directory {:?}", root);

    if let Some(ds) = config.dataset.as_mut() {
        ds.file_path = resolve(root, &ds.file_path);
    }
    if let Some(gs) = config.geometry.as_mut() {
        gs.file_path = resolve(root, &gs.file_path);
    }
    if let Some(out) = config.output.as_mut() {
        out.file_path = out.file_path.as_ref().map(|p| resolve(root, p));
        out.plotly_js = out.plotly_js.as_ref().map(|p| resolve(root, p));
    }
    Ok(config)
}

fn resolve(root: &Path, path: &str) -> String {
    let p: PathBuf = root.join(path);
    p.as_path().display().to_string()
}
