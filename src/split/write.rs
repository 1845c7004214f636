// src/split/write.rs
use std::fs;
use std::path::Path;

use rust_xlsxwriter::{Table, TableColumn, TableStyle, Workbook, XlsxError};
use tracing::debug;

use crate::error::SplitError;
use crate::sheet::Cell;
use crate::split::task::BatchTask;

const SHEET_NAME: &str = "Sheet1";
const TABLE_NAME: &str = "Table1";
const COLUMN_WIDTH: f64 = 20.0;

/// Render one batch to `<dir>/<stem>.xlsx`, replacing any existing file.
///
/// The workbook is written to a sibling `.tmp` first and renamed into place
/// so a failed save never leaves a half-written `.xlsx` behind.
pub fn write_batch(dir: &Path, task: &BatchTask) -> Result<(), SplitError> {
    let out_path = dir.join(format!("{}.xlsx", task.file_stem));
    let tmp_path = out_path.with_extension("tmp");

    build_workbook(task)
        .and_then(|mut workbook| workbook.save(&tmp_path))
        .map_err(|e| write_error(task, Box::new(e)))?;
    fs::rename(&tmp_path, &out_path).map_err(|e| write_error(task, Box::new(e)))?;

    debug!(
        batch = %task.batch,
        path = %out_path.display(),
        rows = task.rows.len(),
        "wrote batch workbook"
    );
    Ok(())
}

/// Lay the batch out as a single styled, filterable table on `Sheet1`.
///
/// Column order comes from the first row of the batch; values in later rows
/// under names the first row lacks are dropped rather than widening the
/// table, and absent cells stay blank.
fn build_workbook(task: &BatchTask) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let Some(first) = task.rows.first() else {
        return Ok(workbook);
    };
    let headers: Vec<&str> = first.names().collect();
    if headers.is_empty() {
        return Ok(workbook);
    }

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
        worksheet.set_column_width(col as u16, COLUMN_WIDTH)?;
    }
    for (r, row) in task.rows.iter().enumerate() {
        let row_idx = (r + 1) as u32;
        for (col, header) in headers.iter().enumerate() {
            match row.get(header) {
                Some(Cell::Text(s)) => {
                    worksheet.write_string(row_idx, col as u16, s.as_str())?;
                }
                Some(Cell::Number(n)) => {
                    worksheet.write_number(row_idx, col as u16, *n)?;
                }
                Some(Cell::Bool(b)) => {
                    worksheet.write_boolean(row_idx, col as u16, *b)?;
                }
                None => {}
            }
        }
    }

    let columns: Vec<TableColumn> = headers
        .iter()
        .map(|h| TableColumn::new().set_header(*h))
        .collect();
    let table = Table::new()
        .set_name(TABLE_NAME)
        .set_style(TableStyle::Medium9)
        .set_header_row(true)
        .set_total_row(false)
        .set_banded_rows(true)
        .set_autofilter(true)
        .set_columns(&columns);
    worksheet.add_table(
        0,
        0,
        task.rows.len() as u32,
        (headers.len() - 1) as u16,
        &table,
    )?;

    Ok(workbook)
}

fn write_error(task: &BatchTask, source: Box<dyn std::error::Error + Send + Sync>) -> SplitError {
    SplitError::OutputWrite {
        context: format!("Failed to write output file for batch {}", task.file_stem),
        source,
    }
}
