use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::flatten::{Table, flatten};
use crate::io::{excel_write, json_read};

/// Outcome of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub output: PathBuf,
    pub groups: usize,
    pub rows: usize,
    pub columns: usize,
}

/// Converts a JSON breach dump into a formatted Excel workbook.
pub fn convert_json_to_excel(
    input: &Path,
    output: &Path,
    sheet_name: &str,
) -> Result<ConversionSummary> {
    let document = json_read::read_document(input)?;
    let table: Table = flatten(&document);
    excel_write::write_table(output, &table, sheet_name)?;

    let summary = ConversionSummary {
        output: output.to_path_buf(),
        groups: document.groups.len(),
        rows: table.rows.len(),
        columns: table.columns.len(),
    };
    info!(
        input = %input.display(),
        output = %output.display(),
        groups = summary.groups,
        rows = summary.rows,
        columns = summary.columns,
        "converted JSON to Excel"
    );
    Ok(summary)
}

/// Output path for a JSON input: same base name with an `.xlsx` extension,
/// placed in `output_dir` when given, otherwise next to the input.
pub fn excel_path_for(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{stem}.xlsx");

    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}
