//! Rendering of a [`Document`] as a standalone HTML page.
//!
//! Two renderers are available. By default the map is drawn as SVG while rendering, and the
//! page carries the drawing, the data and the dropdown script: it opens offline and without a
//! server. The plotly renderer holds the figure in the JSON format of plotly.js instead, drawn
//! on top of online base map tiles. With plotly, the geometry is embedded once and attached to
//! every layer by the page script.

use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;
use serde_json::json;
use serde_json::Value as JSValue;
use snafu::{ensure, ResultExt};

use crate::config::*;
use crate::svg_map::{layer_id_prefix, render_svg};

pub const PLOTLY_CDN_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

// Position of the dropdown and of its annotation, in paper coordinates.
const SELECTOR_X: f64 = 0.085;
const SELECTOR_Y: f64 = 1.11;
const ANNOTATION_X: f64 = 0.0;
const ANNOTATION_Y: f64 = 1.065;

/// Where the page gets the plotly.js library from.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PlotlyJs {
    /// Loaded from the given URL when the page opens.
    Cdn(String),
    /// The source of the library, copied into the page.
    Inline(String),
}

/// How the map is drawn.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Renderer {
    /// Drawn as SVG when rendering. The page is self-contained.
    Svg,
    /// Drawn in the browser by plotly.js.
    Plotly(PlotlyJs),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HtmlOptions {
    pub title: String,
    pub renderer: Renderer,
    /// The id of the element that holds the map. Letters, digits, `-` and `_` only.
    pub div_id: String,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        HtmlOptions {
            title: "Election map".to_string(),
            renderer: Renderer::Svg,
            div_id: "election-map".to_string(),
        }
    }
}

/// The figure, as expected by `Plotly.newPlot`. The layers do not include the geometry.
pub fn figure_json(doc: &Document) -> JSValue {
    let data: Vec<JSValue> = doc
        .layers
        .iter()
        .map(|l| layer_to_json(l, &doc.settings))
        .collect();
    json!({
        "data": data,
        "layout": layout_to_json(&doc.selector, &doc.settings),
    })
}

fn layer_to_json(layer: &Layer, settings: &MapSettings) -> JSValue {
    json!({
        "type": "choroplethmapbox",
        "name": layer.candidate,
        "locations": layer.locations,
        "z": layer.values,
        "featureidkey": layer.geometry.feature_id_key(),
        "zmin": settings.value_range.min,
        "zmax": settings.value_range.max,
        "marker": {
            "opacity": settings.marker_opacity,
            "line": { "width": settings.marker_line_width },
        },
        "visible": layer.visible,
    })
}

fn layout_to_json(selector: &Selector, settings: &MapSettings) -> JSValue {
    let buttons: Vec<JSValue> = selector
        .buttons
        .iter()
        .map(|b| {
            json!({
                "label": b.label,
                "method": "update",
                "args": [{ "visible": b.visible }],
            })
        })
        .collect();
    json!({
        "updatemenus": [{
            "active": selector.active,
            "buttons": buttons,
            "direction": "down",
            "pad": { "r": 10, "t": 10 },
            "showactive": true,
            "x": SELECTOR_X,
            "xanchor": "left",
            "y": SELECTOR_Y,
            "yanchor": "top",
        }],
        "mapbox": {
            "style": settings.style,
            "zoom": settings.zoom,
            "center": { "lat": settings.center.lat, "lon": settings.center.lon },
        },
        "margin": { "r": 0, "t": 0, "l": 0, "b": 0 },
        "annotations": [{
            "text": settings.annotation,
            "showarrow": false,
            "x": ANNOTATION_X,
            "y": ANNOTATION_Y,
            "yref": "paper",
            "align": "left",
        }],
    })
}

/// Renders the full page.
///
/// The output only depends on the document and the options: rendering the same
/// document twice gives the same bytes.
pub fn render_html(doc: &Document, options: &HtmlOptions) -> Result<String, MapError> {
    let div_id = options.div_id.as_str();
    ensure!(
        !div_id.is_empty()
            && div_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
        InvalidSettingsSnafu {
            reason: format!("invalid element id {:?}", div_id),
        }
    );
    match &options.renderer {
        Renderer::Svg => svg_page(doc, &options.title, div_id),
        Renderer::Plotly(plotly_js) => plotly_page(doc, &options.title, div_id, plotly_js),
    }
}

fn svg_page(doc: &Document, title: &str, div_id: &str) -> Result<String, MapError> {
    let drawing = render_svg(doc, div_id).to_string();
    let visible: Vec<&Vec<bool>> = doc.selector.buttons.iter().map(|b| &b.visible).collect();
    let buttons = script_json(&visible)?;
    debug!(
        "svg_page: drawing: {} bytes, {} buttons",
        drawing.len(),
        visible.len()
    );

    let mut entries = String::new();
    for (idx, b) in doc.selector.buttons.iter().enumerate() {
        let selected = if idx == doc.selector.active {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            entries,
            r#"<option value="{}"{}>{}</option>"#,
            idx,
            selected,
            escape_html(&b.label)
        );
    }

    let mut page = String::with_capacity(drawing.len() + 2048);
    // Writing into a String cannot fail.
    let _ = write!(
        page,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
html, body {{ margin: 0; height: 100%; font-family: sans-serif; }}
#{div_id} {{ position: relative; width: 100%; height: 100%; }}
#{div_id} > svg {{ display: block; width: 100%; height: 100%; }}
#{div_id} .selector {{ position: absolute; left: 10px; top: 10px; }}
</style>
</head>
<body>
<div id="{div_id}">
<div class="selector">
<label for="{div_id}-selector">{annotation}</label>
<select id="{div_id}-selector">
{entries}</select>
</div>
{drawing}
</div>
<script type="text/javascript">
var buttons = {buttons};
var selector = document.getElementById("{div_id}-selector");
selector.addEventListener("change", function () {{
  buttons[selector.selectedIndex].forEach(function (shown, j) {{
    document.getElementById("{layer_prefix}" + j).setAttribute("display", shown ? "inline" : "none");
  }});
}});
</script>
</body>
</html>
"#,
        title = escape_html(title),
        div_id = div_id,
        annotation = escape_html(&doc.settings.annotation),
        entries = entries,
        drawing = drawing,
        buttons = buttons,
        layer_prefix = layer_id_prefix(div_id),
    );
    Ok(page)
}

fn plotly_page(
    doc: &Document,
    title: &str,
    div_id: &str,
    plotly_js: &PlotlyJs,
) -> Result<String, MapError> {
    let figure = script_json(&figure_json(doc))?;
    let geometry = script_json(doc.geometry.features())?;
    debug!(
        "plotly_page: figure: {} bytes, geometry: {} bytes",
        figure.len(),
        geometry.len()
    );

    let plotly = match plotly_js {
        PlotlyJs::Cdn(url) => format!(
            r#"<script src="{}" charset="utf-8"></script>"#,
            escape_html(url)
        ),
        PlotlyJs::Inline(source) => format!(
            "<script type=\"text/javascript\">{}</script>",
            source
        ),
    };

    let mut page = String::with_capacity(figure.len() + geometry.len() + plotly.len() + 1024);
    // Writing into a String cannot fail.
    let _ = write!(
        page,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
{plotly}
<style>
html, body {{ margin: 0; height: 100%; }}
#{div_id} {{ width: 100%; height: 100%; }}
</style>
</head>
<body>
<div id="{div_id}"></div>
<script type="text/javascript">
var geometry = {geometry};
var figure = {figure};
figure.data.forEach(function (layer) {{ layer.geojson = geometry; }});
Plotly.newPlot("{div_id}", figure.data, figure.layout, {{"responsive": true}});
</script>
</body>
</html>
"#,
        title = escape_html(title),
        plotly = plotly,
        div_id = div_id,
        geometry = geometry,
        figure = figure,
    );
    Ok(page)
}

/// Writes the page to `path`.
///
/// The page is fully rendered before anything touches the disk, and the file only appears
/// at `path` once completely written. On failure, `path` is left as it was.
pub fn serialize(doc: &Document, path: &Path, options: &HtmlOptions) -> Result<(), MapError> {
    let page = render_html(doc, options)?;
    info!("serialize: writing {} bytes to {:?}", page.len(), path);
    write_atomically(path, page.as_bytes())
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), MapError> {
    let tmp = temporary_path(path);
    debug!("write_atomically: temporary file {:?}", tmp);
    let res = fs::File::create(&tmp)
        .and_then(|mut f| {
            f.write_all(contents)?;
            f.sync_all()
        })
        .and_then(|_| fs::rename(&tmp, path));
    if res.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    res.context(IoSnafu { path })
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

// JSON that can sit inside a script element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, MapError> {
    let s = serde_json::to_string(value).context(JsonSnafu {})?;
    Ok(s.replace("</", "<\\/"))
}

fn escape_html(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => res.push_str("&amp;"),
            '<' => res.push_str("&lt;"),
            '>' => res.push_str("&gt;"),
            '"' => res.push_str("&quot;"),
            '\'' => res.push_str("&#39;"),
            _ => res.push(c),
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_document, sample};
    use std::sync::Arc;

    fn sample_document() -> Document {
        build_document(
            &sample::election(),
            Arc::new(sample::election_geometry()),
            &MapSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn figure_has_one_trace_per_layer() {
        let doc = sample_document();
        let fig = figure_json(&doc);
        let data = fig["data"].as_array().unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0]["type"], "choroplethmapbox");
        assert_eq!(data[0]["featureidkey"], "properties.district");
        assert_eq!(data[0]["zmax"], 6500.0);
        assert_eq!(data[0]["visible"], true);
        assert_eq!(data[1]["visible"], false);
        assert!(data[0].get("geojson").is_none());
    }

    #[test]
    fn layout_matches_settings() {
        let doc = sample_document();
        let layout = &figure_json(&doc)["layout"];
        assert_eq!(layout["mapbox"]["style"], "carto-positron");
        assert_eq!(layout["mapbox"]["zoom"], 9.0);
        assert_eq!(layout["mapbox"]["center"]["lat"], 45.5517);
        assert_eq!(layout["margin"]["t"], 0);
        assert_eq!(layout["annotations"][0]["text"], "Candidate:");
        let menu = &layout["updatemenus"][0];
        assert_eq!(menu["direction"], "down");
        assert_eq!(menu["buttons"].as_array().unwrap().len(), 3);
        assert_eq!(menu["buttons"][0]["method"], "update");
    }

    #[test]
    fn script_json_cannot_close_the_script() {
        let v = json!({ "name": "</script><script>alert(1)</script>" });
        let s = script_json(&v).unwrap();
        assert!(!s.contains("</script"));
        let back: JSValue = serde_json::from_str(&s).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn title_is_escaped() {
        let doc = sample_document();
        let options = HtmlOptions {
            title: "<b>Montréal & co</b>".to_string(),
            ..HtmlOptions::default()
        };
        let page = render_html(&doc, &options).unwrap();
        assert!(page.contains("<title>&lt;b&gt;Montréal &amp; co&lt;/b&gt;</title>"));
    }

    #[test]
    fn inline_library() {
        let doc = sample_document();
        let options = HtmlOptions {
            renderer: Renderer::Plotly(PlotlyJs::Inline("window.Plotly = {};".to_string())),
            ..HtmlOptions::default()
        };
        let page = render_html(&doc, &options).unwrap();
        assert!(page.contains("window.Plotly = {};"));
        assert!(!page.contains(PLOTLY_CDN_URL));
        assert!(page.contains("Plotly.newPlot(\"election-map\""));
    }

    #[test]
    fn cdn_is_opt_in() {
        let doc = sample_document();
        let options = HtmlOptions {
            renderer: Renderer::Plotly(PlotlyJs::Cdn(PLOTLY_CDN_URL.to_string())),
            ..HtmlOptions::default()
        };
        let page = render_html(&doc, &options).unwrap();
        assert!(page.contains(&format!("<script src=\"{}\"", PLOTLY_CDN_URL)));
    }

    #[test]
    fn default_page_is_self_contained() {
        let doc = sample_document();
        let page = render_html(&doc, &HtmlOptions::default()).unwrap();
        assert!(!page.contains("<script src="));
        assert!(!page.contains("https://"));
        assert!(!page.contains("Plotly"));
        assert!(page.contains("<svg"));
        assert!(page.contains(r#"id="election-map-layer-0""#));
        // One entry per candidate, the first layer selected.
        assert_eq!(page.matches("<option").count(), 3);
        assert!(page.contains(r#"<option value="2" selected>Joly</option>"#));
        assert!(page.contains("<label for=\"election-map-selector\">Candidate:</label>"));
        assert!(page.contains("var buttons = [[false,false,true],[false,true,false],[true,false,false]];"));
    }

    #[test]
    fn invalid_element_id() {
        let doc = sample_document();
        let options = HtmlOptions {
            div_id: "map\" onload=\"x".to_string(),
            ..HtmlOptions::default()
        };
        assert!(matches!(
            render_html(&doc, &options),
            Err(MapError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn temporary_path_is_a_sibling() {
        let p = temporary_path(Path::new("out/map.html"));
        assert_eq!(p, PathBuf::from("out/map.html.tmp"));
    }
}
