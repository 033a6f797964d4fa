use clap::Parser;

/// Renders election results as a choropleth map in a standalone HTML page.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the dataset, the geometry and the layout of the map.
    /// For more information about the file format, read the manual of the election_map crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path or empty) The dataset, one row per district. If not provided, the built-in sample is used.
    /// Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub data: Option<String>,

    /// (csv or xlsx) The type of the dataset. By default, it is guessed from the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path) A GeoJSON FeatureCollection with the boundaries of the districts. Required with --data.
    #[clap(short, long, value_parser)]
    pub geometry: Option<String>,

    /// (file path, default election-map.html) Where to write the map.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A map generated earlier. If provided, electionmap checks that the new map is identical.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (svg or plotly) How the map is drawn. svg (the default) gives a page that works offline.
    /// plotly draws the map with plotly.js on top of online base map tiles.
    #[clap(long, value_parser)]
    pub renderer: Option<String>,

    /// (file path) A local copy of plotly.js, copied into the page. Implies the plotly renderer.
    /// Without it, the plotly renderer loads the library from its CDN.
    #[clap(long, value_parser)]
    pub plotly_js: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// If passed as an argument, opens the map in the default browser once written.
    #[clap(long, takes_value = false)]
    pub open: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
