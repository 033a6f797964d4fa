use log::{debug, info, warn};

use election_map::builder::Builder;
use election_map::html::{serialize, HtmlOptions, PlotlyJs, Renderer, PLOTLY_CDN_URL};
use election_map::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;
use std::sync::Arc;

use text_diff::print_diff;

use crate::app::config_reader::*;
use crate::args::Args;

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_geojson;

pub const DEFAULT_OUTPUT_PATH: &str = "election-map.html";

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Could not find the directory of {path}"))]
    MissingParentDir { path: String },
    #[snafu(display("Unknown value for {name}: {value:?}"))]
    UnknownOption { name: String, value: String },
    #[snafu(display("Unknown input type {input_type:?} (expected csv or xlsx)"))]
    UnknownInputType { input_type: String },

    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet or no header row in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Column {column:?} not found in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display(
        "Line {lineno} of {path}: the {column} cell is not a vote count: {content:?}"
    ))]
    WrongCellType {
        path: String,
        lineno: usize,
        column: String,
        content: String,
    },

    #[snafu(display("Error opening GeoJSON file {path}"))]
    OpeningGeoJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing GeoJSON file {path}"))]
    ParsingGeoJson {
        source: geojson::Error,
        path: String,
    },
    #[snafu(display("{path} is not a GeoJSON FeatureCollection"))]
    NotFeatureCollection { path: String },
    #[snafu(display("A dataset was provided without the geometry of its districts"))]
    MissingGeometryFile {},

    #[snafu(display("Error reading the plotly.js library at {path}"))]
    OpeningPlotlyJs {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading file {path}"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the generated map {out} and the reference {path}"))]
    ReferenceMismatch { out: String, path: String },

    #[snafu(display("Error building the map"))]
    Map { source: MapError },
}

pub type AppResult<T> = Result<T, AppError>;

fn read_dataset(ds: &DatasetSource) -> AppResult<Vec<Row>> {
    info!("Attempting to read dataset {:?}", ds.file_path);
    let table = match ds.provider().as_str() {
        "csv" => io_csv::read_csv_table(&ds.file_path)?,
        "xlsx" | "excel" => {
            io_excel::read_excel_table(&ds.file_path, ds.excel_worksheet_name.as_deref())?
        }
        x => return UnknownInputTypeSnafu { input_type: x }.fail(),
    };
    let rows = io_common::rows_from_table(&table, ds)?;
    info!("Read {} districts from {:?}", rows.len(), ds.file_path);
    Ok(rows)
}

// The command line flags take precedence over the configuration file.
fn dataset_source(config: &MapConfig, args: &Args) -> Option<DatasetSource> {
    let mut ds = match (&args.data, &config.dataset) {
        // The provider of the configuration file was meant for its own file.
        (Some(path), Some(ds)) => DatasetSource {
            file_path: path.clone(),
            provider: None,
            ..ds.clone()
        },
        (Some(path), None) => DatasetSource {
            file_path: path.clone(),
            ..DatasetSource::default()
        },
        (None, Some(ds)) => ds.clone(),
        (None, None) => return None,
    };
    if let Some(input_type) = &args.input_type {
        ds.provider = Some(input_type.clone());
    }
    if let Some(name) = &args.excel_worksheet_name {
        ds.excel_worksheet_name = Some(name.clone());
    }
    Some(ds)
}

fn geometry_source(config: &MapConfig, args: &Args) -> Option<GeometrySource> {
    match (&args.geometry, &config.geometry) {
        (Some(path), Some(gs)) => Some(GeometrySource {
            file_path: path.clone(),
            ..gs.clone()
        }),
        (Some(path), None) => Some(GeometrySource {
            file_path: path.clone(),
            feature_id_property: None,
        }),
        (None, gs) => gs.clone(),
    }
}

fn html_options(config: &MapConfig, args: &Args) -> AppResult<HtmlOptions> {
    let output = config.output.clone().unwrap_or_default();
    let mut options = HtmlOptions::default();
    if let Some(title) = output.title {
        options.title = title;
    }
    let renderer = args.renderer.clone().or(output.renderer);
    let plotly_js = args.plotly_js.clone().or(output.plotly_js);
    options.renderer = match (renderer.as_deref(), plotly_js) {
        (None | Some("plotly"), Some(path)) => {
            info!("Inlining plotly.js from {:?}", path);
            let source =
                fs::read_to_string(&path).context(OpeningPlotlyJsSnafu { path: &path })?;
            Renderer::Plotly(PlotlyJs::Inline(source))
        }
        (Some("plotly"), None) => {
            info!("plotly.js will be loaded from {}", PLOTLY_CDN_URL);
            Renderer::Plotly(PlotlyJs::Cdn(PLOTLY_CDN_URL.to_string()))
        }
        (None | Some("svg"), None) => Renderer::Svg,
        (Some("svg"), Some(path)) => {
            warn!("The svg renderer does not use plotly.js, ignoring {:?}", path);
            Renderer::Svg
        }
        (Some(x), _) => {
            return UnknownOptionSnafu {
                name: "renderer",
                value: x,
            }
            .fail()
        }
    };
    Ok(options)
}

fn open_requested(config: &MapConfig, args: &Args) -> bool {
    args.open
        || config
            .output
            .as_ref()
            .and_then(|o| o.open)
            .unwrap_or(false)
}

// The map is already written: failing to show it is not an error.
fn open_in_browser(out: &str) {
    info!("Opening {} in the default browser", out);
    if let Err(e) = webbrowser::open(out) {
        warn!("Could not open {} in a browser: {}", out, e);
    }
}

fn check_reference(out: &str, reference: &str) -> AppResult<()> {
    let produced = fs::read_to_string(out).context(OpeningReferenceSnafu { path: out })?;
    let expected =
        fs::read_to_string(reference).context(OpeningReferenceSnafu { path: reference })?;
    if produced != expected {
        warn!("Found differences with the reference file {:?}", reference);
        print_diff(expected.as_str(), produced.as_str(), "\n");
        return ReferenceMismatchSnafu {
            out,
            path: reference,
        }
        .fail();
    }
    info!("The generated map matches the reference {:?}", reference);
    Ok(())
}

/// Builds the map described by the arguments and writes it.
pub fn run(args: &Args) -> AppResult<()> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => MapConfig::default(),
    };
    info!("config: {:?}", config);

    let settings = config.map.clone().unwrap_or_default().map_settings()?;

    let (rows, geometry) = match dataset_source(&config, args) {
        Some(ds) => {
            let gs = geometry_source(&config, args).context(MissingGeometryFileSnafu {})?;
            let rows = read_dataset(&ds)?;
            let geometry = io_geojson::read_geometry(&gs.file_path, gs.feature_id_property())?;
            (rows, geometry)
        }
        None => {
            if geometry_source(&config, args).is_some() {
                warn!("A geometry file was provided without a dataset, it will not be used");
            }
            info!("No dataset provided, using the built-in sample");
            (sample::election(), sample::election_geometry())
        }
    };

    let document = build_document(&rows, Arc::new(geometry), &settings).context(MapSnafu {})?;
    let options = html_options(&config, args)?;

    let out: String = args
        .out
        .clone()
        .or_else(|| config.output.as_ref().and_then(|o| o.file_path.clone()))
        .unwrap_or_else(|| DEFAULT_OUTPUT_PATH.to_string());
    serialize(&document, Path::new(&out), &options).context(MapSnafu {})?;
    println!(
        "Wrote a map of {} districts and {} candidates to {}",
        rows.len(),
        document.layers.len(),
        out
    );

    // The reference map, if provided for comparison
    if let Some(reference) = &args.reference {
        check_reference(&out, reference)?;
    }

    if open_requested(&config, args) {
        open_in_browser(&out);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_data(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn temp_out(name: &str) -> String {
        let dir = std::env::temp_dir().join("electionmap_tests");
        fs::create_dir_all(&dir).unwrap();
        dir.join(name).display().to_string()
    }

    #[test]
    fn sample_map() {
        let out = temp_out("sample_map.html");
        let args = Args {
            out: Some(out.clone()),
            ..Args::default()
        };
        run(&args).unwrap();
        let page = fs::read_to_string(&out).unwrap();
        assert!(page.contains(">Bergeron</option>"));
        assert!(!page.contains("<script src="));
        assert!(!page.contains(PLOTLY_CDN_URL));

        // A second run gives the same page.
        let args = Args {
            out: Some(temp_out("sample_map_2.html")),
            reference: Some(out),
            ..Args::default()
        };
        run(&args).unwrap();
    }

    #[test]
    fn map_from_config() {
        let out = temp_out("map_from_config.html");
        let args = Args {
            config: Some(test_data("config.json")),
            out: Some(out.clone()),
            ..Args::default()
        };
        // 104-Mont has no boundary: it is not drawn.
        run(&args).unwrap();
        let page = fs::read_to_string(&out).unwrap();
        assert!(page.contains("<title>Test election</title>"));
        assert!(page.contains("104-Mont"));
        assert!(page.contains("\"zoom\":10.0"));
        assert!(page.contains(PLOTLY_CDN_URL));
    }

    #[test]
    fn map_from_workbook() {
        let out = temp_out("map_from_workbook.html");
        let args = Args {
            data: Some(test_data("election.xlsx")),
            excel_worksheet_name: Some("Second round".to_string()),
            geometry: Some(test_data("districts.geojson")),
            out: Some(out.clone()),
            ..Args::default()
        };
        run(&args).unwrap();
        let page = fs::read_to_string(&out).unwrap();
        // Coderre wins the first district of the second round.
        assert!(page.contains("101-Lac\nCoderre: 3012"));
        // and is the first layer, selected when the page opens.
        assert!(page.contains(r#"<option value="1" selected>Coderre</option>"#));
    }

    #[test]
    fn reference_mismatch() {
        let first = temp_out("reference_mismatch.html");
        run(&Args {
            out: Some(first.clone()),
            ..Args::default()
        })
        .unwrap();

        let args = Args {
            config: Some(test_data("config.json")),
            out: Some(temp_out("reference_mismatch_2.html")),
            reference: Some(first),
            ..Args::default()
        };
        assert!(matches!(
            run(&args),
            Err(AppError::ReferenceMismatch { .. })
        ));
    }

    #[test]
    fn data_without_geometry() {
        let args = Args {
            data: Some(test_data("election.csv")),
            out: Some(temp_out("data_without_geometry.html")),
            ..Args::default()
        };
        assert!(matches!(
            run(&args),
            Err(AppError::MissingGeometryFile {})
        ));
    }

    #[test]
    fn flags_override_config() {
        let config = read_config(&test_data("config.json")).unwrap();
        let args = Args {
            data: Some("other.xlsx".to_string()),
            excel_worksheet_name: Some("Results".to_string()),
            ..Args::default()
        };
        let ds = dataset_source(&config, &args).unwrap();
        assert_eq!(ds.file_path, "other.xlsx");
        assert_eq!(ds.provider(), "xlsx");
        assert_eq!(ds.winner_column.as_deref(), Some("winner"));
        assert_eq!(ds.excel_worksheet_name.as_deref(), Some("Results"));
    }

    #[test]
    fn data_flag_drops_the_configured_provider() {
        let mut config = read_config(&test_data("config.json")).unwrap();
        if let Some(ds) = config.dataset.as_mut() {
            ds.provider = Some("csv".to_string());
        }
        let args = Args {
            data: Some("other.xlsx".to_string()),
            ..Args::default()
        };
        assert_eq!(dataset_source(&config, &args).unwrap().provider(), "xlsx");

        let args = Args {
            data: Some("other.xlsx".to_string()),
            input_type: Some("csv".to_string()),
            ..Args::default()
        };
        assert_eq!(dataset_source(&config, &args).unwrap().provider(), "csv");

        // Without --data, the configured provider stays.
        let ds = dataset_source(&config, &Args::default()).unwrap();
        assert_eq!(ds.provider(), "csv");
    }

    #[test]
    fn renderer_selection() {
        let config = MapConfig::default();
        let options = html_options(&config, &Args::default()).unwrap();
        assert_eq!(options.renderer, Renderer::Svg);

        let args = Args {
            renderer: Some("plotly".to_string()),
            ..Args::default()
        };
        let options = html_options(&config, &args).unwrap();
        assert_eq!(
            options.renderer,
            Renderer::Plotly(PlotlyJs::Cdn(PLOTLY_CDN_URL.to_string()))
        );

        // A local plotly.js is copied into the page.
        let args = Args {
            plotly_js: Some(test_data("election.csv")),
            ..Args::default()
        };
        let options = html_options(&config, &args).unwrap();
        assert!(matches!(
            options.renderer,
            Renderer::Plotly(PlotlyJs::Inline(ref s)) if s.starts_with("district,")
        ));

        let args = Args {
            renderer: Some("canvas".to_string()),
            ..Args::default()
        };
        assert!(matches!(
            html_options(&config, &args),
            Err(AppError::UnknownOption { .. })
        ));
    }

    #[test]
    fn open_from_flag_or_config() {
        let mut config = MapConfig::default();
        assert!(!open_requested(&config, &Args::default()));
        let args = Args {
            open: true,
            ..Args::default()
        };
        assert!(open_requested(&config, &args));
        config.output = Some(OutputSettings {
            open: Some(true),
            ..OutputSettings::default()
        });
        assert!(open_requested(&config, &Args::default()));
    }

    #[test]
    fn unknown_input_type() {
        let args = Args {
            data: Some(test_data("election.csv")),
            input_type: Some("parquet".to_string()),
            geometry: Some(test_data("districts.geojson")),
            out: Some(temp_out("unknown_input_type.html")),
            ..Args::default()
        };
        assert!(matches!(
            run(&args),
            Err(AppError::UnknownInputType { .. })
        ));
    }
}
