/*!

This is the long-form manual for `election_map` and `electionmap`.

## Running

```bash
electionmap
```

Without arguments, the built-in sample is rendered to `election-map.html`. Open the file in a
browser: the dropdown in the top left corner switches between candidates.

```bash
electionmap --data election.csv --geometry districts.geojson --out montreal.html
```

## Input formats

### Dataset

The dataset is a table with a header row and one row per district. Two providers are supported:
* `csv` Comma Separated Values (the default, unless the file name ends with `.xlsx`)
* `xlsx` Excel spreadsheet. The first worksheet is used unless `--excel-worksheet-name` is given.

|  district   | Coderre | Bergeron | Joly | total | winner  |
|-------------|---------|----------|------|-------|---------|
| 101-Lac     | 2481    | 1050     | 3306 | 6837  | Joly    |
| ...         |         |          |      |       |         |

* the district column (default `district`) holds the identifier that is matched with the geometry
* the winner column is optional. If missing, the winner of a district is the candidate with the most
  votes
* the candidate columns are either listed in the configuration (`candidates`), or are all the
  remaining columns except the ones listed in `ignoredColumns`

Every candidate cell must hold a non-negative whole number.

### Geometry

A GeoJSON `FeatureCollection`. Each feature carries the district identifier in one of its
properties (default `district`). Districts without a matching feature are not drawn; set
`missingGeometry` to `reject` to turn them into an error.

## Layers and dropdown

There is one layer per candidate. Layers are ordered by the first district that each candidate
wins, reading the dataset from top to bottom. Candidates that win nowhere come last. Only the
first layer is visible when the page opens.

The dropdown lists the candidates in alphabetical order by default (`buttonOrder: "layerOrder"`
follows the layers instead). Whatever the order, each entry shows exactly the layer of its
candidate.

## Configuration file

All the entries are optional. Relative paths are resolved from the directory of the
configuration file. Command line flags take precedence.

```json
{
  "dataset": {
    "filePath": "election.csv",
    "provider": "csv",
    "districtColumn": "district",
    "winnerColumn": "winner",
    "ignoredColumns": ["total", "result", "district_id"]
  },
  "geometry": { "filePath": "districts.geojson", "featureIdProperty": "district" },
  "map": {
    "style": "carto-positron",
    "center": { "lat": 45.5517, "lon": -73.7073 },
    "zoom": 9,
    "valueRange": { "min": 0, "max": 6500 },
    "markerOpacity": 1,
    "markerLineWidth": 0.2,
    "annotation": "Candidate:",
    "buttonOrder": "alphabetical",
    "missingGeometry": "ignore"
  },
  "output": {
    "filePath": "election-map.html",
    "title": "Election map",
    "renderer": "svg",
    "plotlyJs": "plotly.min.js",
    "open": false
  }
}
```

The color scale is bounded by `valueRange`. It is not computed from the data: districts above
the maximum get the darkest color.

## Output

A single HTML page. Two renderers are available:
* `svg` (the default): the districts are drawn when the page is generated. The page holds the
  drawing, the results and the script of the dropdown. It opens offline, without a server. There
  is no base map under the districts.
* `plotly`: the map is drawn in the browser by plotly.js, on top of base map tiles fetched online.
  The library is loaded from its CDN, unless a local copy is given with `--plotly-js` (or
  `plotlyJs`), in which case it is copied into the page.

With `--open` (or `"open": true`), the page is opened in the default browser once written.

The file is written in one step: if anything fails, the previous file is left untouched.

Rendering the same data twice produces the same file. `--reference` compares the new page with
an earlier one and fails if they differ.

*/
