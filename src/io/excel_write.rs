use std::fs::{self, Permissions};
use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, Worksheet, XlsxError};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::flatten::Table;
use crate::model::CellValue;

/// Fill colour of the header row (light gray).
pub const HEADER_FILL: u32 = 0xD3D3D3;
/// Extra characters added to the widest value of each column.
pub const COLUMN_PADDING: usize = 2;

/// Writes the table as a single worksheet and saves it at `path`.
///
/// The header row is bold on a light-gray fill and every column is sized to
/// its widest rendered value. The workbook is staged next to `path` and
/// renamed into place, so `path` either holds the complete file or is left
/// untouched.
pub fn write_table(path: &Path, table: &Table, sheet_name: &str) -> Result<()> {
    if sheet_name.trim().is_empty() {
        return Err(ToolError::InvalidSheetName(sheet_name.to_string()));
    }
    if table.is_empty() {
        return Err(ToolError::EmptyTable);
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_num(col_idx)?, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = row_num(row_idx + 1)?;
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(worksheet, row_num, col_num(col_idx)?, cell)?;
        }
    }

    // Widths depend on the final cell contents, so style only once every row is in.
    apply_header_style(worksheet, &table.columns)?;
    for (col_idx, width) in column_widths(table).into_iter().enumerate() {
        debug!(column = %table.columns[col_idx], width, "sizing column");
        worksheet.set_column_width(col_num(col_idx)?, width as f64)?;
    }

    let buffer = workbook.save_to_buffer()?;
    persist(path, &buffer)
}

/// Width of every column: the longest rendered value (header included) plus
/// [`COLUMN_PADDING`].
pub fn column_widths(table: &Table) -> Vec<usize> {
    let mut widths: Vec<usize> = table
        .columns
        .iter()
        .map(|header| header.chars().count())
        .collect();

    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.rendered_len());
        }
    }

    widths.into_iter().map(|width| width + COLUMN_PADDING).collect()
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(HEADER_FILL))
}

fn apply_header_style(worksheet: &mut Worksheet, columns: &[String]) -> Result<()> {
    let format = header_format();
    for (col_idx, header) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col_num(col_idx)?, header, &format)?;
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<()> {
    match cell {
        CellValue::Empty => {}
        CellValue::Text(text) => {
            worksheet.write_string(row, col, text)?;
        }
        CellValue::Number(number) => match number.as_f64() {
            Some(value) => {
                worksheet.write_number(row, col, value)?;
            }
            None => {
                worksheet.write_string(row, col, number.to_string())?;
            }
        },
        CellValue::Bool(value) => {
            worksheet.write_boolean(row, col, *value)?;
        }
    }
    Ok(())
}

fn col_num(col_idx: usize) -> Result<u16> {
    u16::try_from(col_idx).map_err(|_| ToolError::ExcelWrite(XlsxError::RowColumnLimitError))
}

fn row_num(row_idx: usize) -> Result<u32> {
    u32::try_from(row_idx).map_err(|_| ToolError::ExcelWrite(XlsxError::RowColumnLimitError))
}

fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(directory)?;
    staged.write_all(bytes)?;
    // Staged files are owner-only; replacing keeps the existing file's mode.
    if let Some(permissions) = output_permissions(path) {
        staged.as_file().set_permissions(permissions)?;
    }
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|error| error.error)?;
    Ok(())
}

fn output_permissions(path: &Path) -> Option<Permissions> {
    match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}
