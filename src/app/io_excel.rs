// Primitives for reading Excel spreadsheets.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::app::{io_common::Table, *};

pub fn read_excel_table(path: &str, worksheet_name: Option<&str>) -> AppResult<Table> {
    let wrange = get_range(path, worksheet_name)?;
    let mut rows = wrange.rows();
    let header: Vec<String> = rows
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(read_cell)
        .collect();
    debug!("read_excel_table: header: {:?}", header);

    let lines: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(read_cell).collect())
        .collect();
    Ok(Table {
        path: path.to_string(),
        header,
        lines,
    })
}

fn get_range(path: &str, worksheet_name: Option<&str>) -> AppResult<Range<DataType>> {
    debug!(
        "read_excel_table: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    let wrange = if let Some(name) = worksheet_name {
        workbook
            .worksheet_range(name)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?
    } else {
        workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?
    };
    Ok(wrange)
}

fn read_cell(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.trim().to_string(),
        DataType::Int(i) => i.to_string(),
        // Whole floats are written without a fractional part.
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => "".to_string(),
        // Dates and errors are never vote counts.
        _ => format!("{:?}", cell),
    }
}
