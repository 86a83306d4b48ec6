//! Spreadsheet export.
//!
//! Writes an Excel workbook with a single sheet: one header row followed by
//! one row per record, in record order. The header is written even when
//! there are no records. Dates are stored as `YYYY-MM-DD` text, counts as
//! numbers and the money flag as a boolean cell.

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

use crate::error::{Error, Result};
use crate::models::{ArticleRecord, RECORD_COLUMNS};

/// Name of the only sheet in the workbook.
pub const SHEET_NAME: &str = "Sheet1";

/// Render `records` as the bytes of an `.xlsx` workbook.
pub fn to_xlsx(records: &[ArticleRecord]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let header = Format::new().set_bold();
    for (col, name) in (0u16..).zip(RECORD_COLUMNS) {
        sheet.write_string_with_format(0, col, name, &header)?;
    }
    for (row, record) in (1u32..).zip(records) {
        write_record(sheet, row, record)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_record(sheet: &mut Worksheet, row: u32, record: &ArticleRecord) -> Result<()> {
    let date = record.date.format("%Y-%m-%d").to_string();
    // Empty text is left as a blank cell.
    let texts = [
        (0, record.title.as_str()),
        (1, date.as_str()),
        (2, record.description.as_str()),
        (3, record.image_filename.as_str()),
    ];
    for (col, text) in texts {
        if !text.is_empty() {
            sheet.write_string(row, col, text)?;
        }
    }
    sheet.write_number(row, 4, record.search_count as f64)?;
    sheet.write_boolean(row, 5, record.contains_money)?;
    Ok(())
}

/// Write `records` to `path`.
///
/// Any failure comes back as [`Error::Export`].
#[instrument(level = "info", skip_all, fields(path = %path.display(), records = records.len()))]
pub async fn write_spreadsheet(records: &[ArticleRecord], path: &Path) -> Result<()> {
    let export_error = |source: Error| Error::Export {
        path: path.display().to_string(),
        source: Box::new(source),
    };

    let bytes = to_xlsx(records).map_err(export_error)?;
    if let Err(e) = fs::write(path, &bytes).await {
        error!(error = %e, "Failed to write spreadsheet");
        return Err(export_error(e.into()));
    }
    info!(bytes = bytes.len(), "Wrote spreadsheet");
    Ok(())
}

/// Read the exported sheet back as text cells, blank cells as `""`.
#[cfg(test)]
pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    use calamine::{Data, Reader, Xlsx, open_workbook};

    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(SHEET_NAME).unwrap();
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    Data::String(s) => s.clone(),
                    Data::Float(f) => f.to_string(),
                    Data::Int(i) => i.to_string(),
                    Data::Bool(b) => b.to_string(),
                    other => format!("{other:?}"),
                })
                .collect()
        })
        .collect()
}
