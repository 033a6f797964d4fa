// Conversion of a raw table into dataset rows, shared by all the readers.

use crate::app::*;

/// The cells of a file, as text. The first data line is line 2.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Table {
    pub path: String,
    pub header: Vec<String>,
    pub lines: Vec<Vec<String>>,
}

pub fn rows_from_table(table: &Table, ds: &DatasetSource) -> AppResult<Vec<Row>> {
    let path = table.path.as_str();
    let district_idx = column_index(table, ds.district_column())?;
    let winner_idx = match &ds.winner_column {
        Some(c) => Some(column_index(table, c)?),
        None => None,
    };
    let ignored: Vec<String> = ds.ignored_columns.clone().unwrap_or_default();

    let candidate_cols: Vec<(String, usize)> = match &ds.candidates {
        Some(names) => {
            let mut cols = Vec::new();
            for name in names.iter() {
                cols.push((name.clone(), column_index(table, name)?));
            }
            cols
        }
        None => table
            .header
            .iter()
            .enumerate()
            .filter(|(idx, h)| {
                *idx != district_idx && Some(*idx) != winner_idx && !ignored.contains(h)
            })
            .map(|(idx, h)| (h.clone(), idx))
            .collect(),
    };
    let names: Vec<String> = candidate_cols.iter().map(|(n, _)| n.clone()).collect();
    info!("rows_from_table: {}: candidates {:?}", path, names);

    let mut builder = Builder::new().candidates(&names).context(MapSnafu {})?;
    for (idx, line) in table.lines.iter().enumerate() {
        let lineno = idx + 2;
        let district = line.get(district_idx).map(|s| s.trim()).unwrap_or("");
        if district.is_empty() {
            warn!(
                "rows_from_table: {}: skipping line {} without a district",
                path, lineno
            );
            continue;
        }

        let mut votes: Vec<(String, u64)> = Vec::new();
        for (name, col) in candidate_cols.iter() {
            let cell = line.get(*col).map(|s| s.trim()).unwrap_or("");
            let count = parse_count(cell).context(WrongCellTypeSnafu {
                path,
                lineno,
                column: name.clone(),
                content: cell,
            })?;
            votes.push((name.clone(), count));
        }
        debug!("rows_from_table: line {}: {} {:?}", lineno, district, votes);

        let winner = winner_idx
            .and_then(|w| line.get(w))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty());
        let added = match winner {
            Some(w) => builder.add_row_with_winner(district, &votes, w),
            None => builder.add_row(district, &votes),
        };
        added.context(MapSnafu {})?;
    }
    Ok(builder.into_rows())
}

fn column_index(table: &Table, column: &str) -> AppResult<usize> {
    table
        .header
        .iter()
        .position(|h| h == column)
        .context(MissingColumnSnafu {
            column,
            path: table.path.as_str(),
        })
}

// Counts are whole numbers, possibly written as floats by spreadsheets.
// 2^64 is the first float above u64::MAX.
pub fn parse_count(cell: &str) -> Option<u64> {
    cell.parse::<u64>().ok().or_else(|| {
        cell.parse::<f64>()
            .ok()
            .filter(|f| *f >= 0.0 && *f < u64::MAX as f64 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}
