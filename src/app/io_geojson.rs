use geojson::GeoJson;

use crate::app::*;

/// Reads the boundaries of the districts from a GeoJSON FeatureCollection.
pub fn read_geometry(path: &str, id_property: &str) -> AppResult<GeometryCollection> {
    info!("Attempting to read geometry file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningGeoJsonSnafu { path })?;
    let geojson: GeoJson = contents
        .parse::<GeoJson>()
        .context(ParsingGeoJsonSnafu { path })?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return NotFeatureCollectionSnafu { path }.fail(),
    };

    let geometry = GeometryCollection::new(collection, id_property);
    info!(
        "read_geometry: {} features, {} districts",
        geometry.len(),
        geometry.num_districts()
    );
    if geometry.num_districts() < geometry.len() {
        warn!(
            "read_geometry: {}: {} features cannot be matched by their {:?} property",
            path,
            geometry.len() - geometry.num_districts(),
            id_property
        );
    }
    Ok(geometry)
}
