use election_map::html::{render_html, serialize, HtmlOptions, PlotlyJs, Renderer};
use election_map::*;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn temp_file(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("election_map_tests");
    fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

fn sample_document(settings: &MapSettings) -> Document {
    build_document(
        &sample::election(),
        Arc::new(sample::election_geometry()),
        settings,
    )
    .unwrap()
}

// n candidates, candidate i wins district i.
fn synthetic_rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|d| Row {
            district: format!("d{}", d),
            votes: (0..n)
                .map(|c| (format!("cand{}", c), if c == d { 100 } else { 1 }))
                .collect(),
            winner: None,
        })
        .collect()
}

#[test]
fn montreal_dropdown() {
    init();
    let doc = sample_document(&MapSettings::default());
    let order: Vec<&str> = doc.layers.iter().map(|l| l.candidate.as_str()).collect();
    assert_eq!(order, vec!["Joly", "Coderre", "Bergeron"]);

    let buttons: Vec<(&str, Vec<bool>)> = doc
        .selector
        .buttons
        .iter()
        .map(|b| (b.label.as_str(), b.visible.clone()))
        .collect();
    assert_eq!(
        buttons,
        vec![
            ("Bergeron", vec![false, false, true]),
            ("Coderre", vec![false, true, false]),
            ("Joly", vec![true, false, false]),
        ]
    );
    // The selected entry is the one of the visible layer.
    assert_eq!(doc.selector.buttons[doc.selector.active].label, "Joly");
}

#[test]
fn buttons_show_their_own_layer() {
    for order in [ButtonOrder::Alphabetical, ButtonOrder::LayerOrder] {
        for n in 1..10 {
            let rows = synthetic_rows(n);
            let geometry = Arc::new(sample::election_geometry());
            let settings = MapSettings {
                button_order: order,
                ..MapSettings::default()
            };
            let doc = build_document(&rows, geometry, &settings).unwrap();
            assert_eq!(doc.layers.len(), n);
            assert_eq!(doc.selector.buttons.len(), n);
            for b in doc.selector.buttons.iter() {
                assert_eq!(b.visible.len(), n);
                assert_eq!(b.visible.iter().filter(|v| **v).count(), 1);
                assert!(b.visible[b.layer_index]);
                assert_eq!(doc.layers[b.layer_index].candidate, b.label);
            }
        }
    }
}

#[test]
fn only_first_layer_visible() {
    let doc = sample_document(&MapSettings::default());
    let visible = doc.visible_layers();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].candidate, doc.layers[0].candidate);
    assert!(doc.layers.iter().skip(1).all(|l| !l.visible));
}

#[test]
fn layers_share_the_geometry() {
    let doc = sample_document(&MapSettings::default());
    for l in doc.layers.iter() {
        assert!(Arc::ptr_eq(&l.geometry, &doc.geometry));
        assert_eq!(l.locations.len(), l.values.len());
    }
    let joly = &doc.layers[0];
    assert_eq!(joly.locations[0], "1-Nord-Ouest");
    assert_eq!(joly.values[0], 2917);
}

#[test]
fn missing_geometry_is_drawn_empty() {
    init();
    let mut rows = sample::election();
    rows.push(Row::new(
        "7-Nowhere",
        &[("Coderre", 10), ("Bergeron", 20), ("Joly", 30)],
    ));
    let geometry = Arc::new(sample::election_geometry());

    let doc = build_document(&rows, geometry.clone(), &MapSettings::default()).unwrap();
    assert!(doc.layers[0].locations.contains(&"7-Nowhere".to_string()));
    assert!(render_html(&doc, &HtmlOptions::default()).is_ok());

    let strict = MapSettings {
        missing_geometry: MissingGeometry::Reject,
        ..MapSettings::default()
    };
    let res = build_document(&rows, geometry, &strict);
    assert!(matches!(res, Err(MapError::MalformedDataset { .. })));
}

#[test]
fn mismatched_rows_fail() {
    let rows = vec![
        Row::new("1-Nord-Ouest", &[("Coderre", 10), ("Joly", 30)]),
        Row::new("2-Nord", &[("Coderre", 10), ("Bergeron", 30)]),
    ];
    let res = build_document(
        &rows,
        Arc::new(sample::election_geometry()),
        &MapSettings::default(),
    );
    assert!(matches!(res, Err(MapError::MalformedDataset { .. })));
}

#[test]
fn rendering_is_deterministic() {
    let plotly = HtmlOptions {
        renderer: Renderer::Plotly(PlotlyJs::Inline("window.Plotly = {};".to_string())),
        ..HtmlOptions::default()
    };
    for options in [HtmlOptions::default(), plotly] {
        let a = render_html(&sample_document(&MapSettings::default()), &options).unwrap();
        let b = render_html(&sample_document(&MapSettings::default()), &options).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn default_page_works_offline() {
    let doc = sample_document(&MapSettings::default());
    let page = render_html(&doc, &HtmlOptions::default()).unwrap();
    assert!(!page.contains("<script src="));
    assert!(!page.contains("https://"));
    // The drawing, the data and the dropdown script are all in the page.
    assert_eq!(page.matches("<g").count(), doc.layers.len() + 1);
    assert!(page.contains("6-Sud-Est\nCoderre: 7102"));
    assert!(page.contains("selector.addEventListener(\"change\""));
}

#[test]
fn serialize_writes_the_page() {
    let doc = sample_document(&MapSettings::default());
    let path = temp_file("serialize_writes_the_page.html");
    serialize(&doc, &path, &HtmlOptions::default()).unwrap();
    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        render_html(&doc, &HtmlOptions::default()).unwrap()
    );
    serialize(&doc, &path, &HtmlOptions::default()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), written);
    assert!(!temp_file("serialize_writes_the_page.html.tmp").exists());
}

#[test]
fn serialize_unwritable_path() {
    let doc = sample_document(&MapSettings::default());
    let path = temp_file("no_such_dir").join("map.html");
    let res = serialize(&doc, &path, &HtmlOptions::default());
    assert!(matches!(res, Err(MapError::Io { .. })));
    assert!(!path.exists());
}

#[test]
fn failed_write_keeps_previous_file() {
    let doc = sample_document(&MapSettings::default());
    // A directory cannot be replaced by a file.
    let path = temp_file("failed_write_keeps_previous_file");
    fs::create_dir_all(&path).unwrap();
    let res = serialize(&doc, &path, &HtmlOptions::default());
    assert!(matches!(res, Err(MapError::Io { .. })));
    assert!(path.is_dir());
    assert!(!temp_file("failed_write_keeps_previous_file.tmp").exists());
}
