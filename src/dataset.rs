use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::Error;
use crate::types::{
    is_missing, CellValue, Dataset, FileFormat, Respondent, Result, MISSING_SENTINEL,
    MULTI_SELECT_COLUMNS, TIMESTAMP_COLUMN,
};

/// Load and prepare a survey export.
///
/// Picks the reader from the file extension, strips whitespace from column
/// names, drops the timestamp column, and splits every known multi-select
/// column on `;`. The returned [`Dataset`] is never mutated afterwards.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let format = FileFormat::from_extension(ext).ok_or_else(|| {
        Error::UnsupportedFormat(format!("unsupported file extension: .{}", ext))
    })?;

    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let (headers, records) = match format {
        FileFormat::Csv => read_delimited(path, b',')?,
        FileFormat::Tsv => read_delimited(path, b'\t')?,
        FileFormat::Excel => read_excel(path)?,
    };

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let dataset = prepare(source, headers, records)?;
    if dataset.is_empty() {
        log::warn!("no respondent rows in {}", path.display());
    }
    log::info!(
        "loaded {} respondents, {} columns from {}",
        dataset.len(),
        dataset.column_names().len(),
        path.display()
    );
    Ok(dataset)
}

/// Turn a raw header row plus string records into a prepared [`Dataset`].
///
/// Fails with `ColumnMissing` if the timestamp column or any of the configured
/// multi-select columns is absent after header trimming.
pub fn prepare(
    source: String,
    raw_headers: Vec<String>,
    records: Vec<Vec<String>>,
) -> Result<Dataset> {
    let headers: Vec<String> = raw_headers.iter().map(|h| h.trim().to_string()).collect();

    let timestamp_index = headers
        .iter()
        .position(|h| h == TIMESTAMP_COLUMN)
        .ok_or_else(|| Error::ColumnMissing(TIMESTAMP_COLUMN.to_string()))?;

    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != timestamp_index)
        .map(|(_, h)| h.clone())
        .collect();

    for &expected in MULTI_SELECT_COLUMNS {
        if !columns.iter().any(|c| c == expected) {
            return Err(Error::ColumnMissing(expected.to_string()));
        }
    }

    let multi: Vec<bool> = columns
        .iter()
        .map(|c| MULTI_SELECT_COLUMNS.contains(&c.as_str()))
        .collect();

    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        let mut cells = Vec::with_capacity(columns.len());
        let mut kept = 0usize;
        for raw_index in 0..headers.len() {
            if raw_index == timestamp_index {
                continue;
            }
            // Short records are padded with empty cells to the header width
            let raw = record.get(raw_index).map(String::as_str).unwrap_or("");
            let cell = if multi[kept] {
                split_multi(raw)
            } else {
                CellValue::Scalar(raw.trim().to_string())
            };
            cells.push(cell);
            kept += 1;
        }
        rows.push(Respondent { cells });
    }

    Dataset::new(source, columns, rows)
}

/// Split a multi-select cell on `;`.
///
/// An empty or missing cell becomes the single-element sentinel sequence, and
/// whitespace-only segments are dropped so no element is empty after trimming.
fn split_multi(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if is_missing(trimmed) {
        return CellValue::Multi(vec![MISSING_SENTINEL.to_string()]);
    }

    let parts: Vec<String> = trimmed
        .split(';')
        .filter(|p| !p.trim().is_empty())
        .map(str::to_string)
        .collect();

    if parts.is_empty() {
        CellValue::Multi(vec![MISSING_SENTINEL.to_string()])
    } else {
        CellValue::Multi(parts)
    }
}

/// Read a CSV or TSV file into a header row plus string records
fn read_delimited(path: &Path, delimiter: u8) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok((headers, records))
}

/// Read the first worksheet of an Excel workbook into strings
fn read_excel(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::InvalidInput("workbook contains no worksheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(Error::Excel)?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(excel_cell_to_string).collect())
        .unwrap_or_default();

    let records: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(excel_cell_to_string).collect())
        .collect();

    Ok((headers, records))
}

/// Render an Excel cell the way the CSV export would have written it
fn excel_cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
