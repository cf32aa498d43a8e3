use crate::error::{AppError, AppResult};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// One usable row of a two-column import file: column A is an optional
/// reference label, column B the text to synthesize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRow {
    pub reference: Option<String>,
    pub text: String,
}

/// Read synthesis inputs from a tabular file, in file order. Rows with an
/// empty reference column are accepted; rows without text are skipped.
///
/// Supported formats: xlsx/xls/ods via calamine, csv via the csv crate.
pub fn read_rows(path: &Path) -> AppResult<Vec<TextRow>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "ods" => read_spreadsheet(path)?,
        other => {
            return Err(AppError::Import(format!(
                "unsupported import file type '{}'",
                other
            )))
        }
    };

    tracing::info!(
        path = %path.display(),
        row_count = rows.len(),
        "import file read"
    );
    Ok(rows)
}

fn read_csv(path: &Path) -> AppResult<Vec<TextRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| AppError::Import(format!("cannot open {}: {}", path.display(), e)))?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| AppError::Import(format!("cannot read csv row: {}", e)))?;
        let reference = non_empty(record.get(0));
        let Some(text) = non_empty(record.get(1)) else {
            continue;
        };
        rows.push(TextRow { reference, text });
    }
    Ok(rows)
}

fn read_spreadsheet(path: &Path) -> AppResult<Vec<TextRow>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::Import(format!("cannot open {}: {}", path.display(), e)))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Import("workbook has no sheets".to_string()))?
        .map_err(|e| AppError::Import(format!("cannot read first sheet: {}", e)))?;

    let mut rows = Vec::new();
    for row in range.rows() {
        let reference = cell_text(row.first());
        let Some(text) = cell_text(row.get(1)) else {
            continue;
        };
        rows.push(TextRow { reference, text });
    }
    Ok(rows)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn cell_text(cell: Option<&Data>) -> Option<String> {
    match cell? {
        Data::Empty => None,
        Data::String(s) => non_empty(Some(s)),
        other => non_empty(Some(other.to_string().as_str())),
    }
}
