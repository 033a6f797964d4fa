// Primitives for reading CSV files.

use crate::app::{io_common::Table, *};

pub fn read_csv_table(path: &str) -> AppResult<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvOpenSnafu { path })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    debug!("read_csv_table: header: {:?}", header);

    let mut lines: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_csv_table: {:?} {:?}", lineno, line);
        lines.push(line.iter().map(|s| s.to_string()).collect());
    }
    Ok(Table {
        path: path.to_string(),
        header,
        lines,
    })
}
