use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::model::{CellValue, Document};

/// Column holding the name of the group each row came from. Always the first
/// column of a non-empty table.
pub const GROUP_COLUMN: &str = "Breach Name";

/// Default worksheet name for converted breach dumps.
pub const DEFAULT_SHEET_NAME: &str = "Breach Data";

/// One table row; holds exactly one cell per column.
pub type Row = Vec<CellValue>;

/// Column-unified view of a document, ready to be written as a sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the cell at `row` for the named column, if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col_idx = self.columns.iter().position(|name| name == column)?;
        self.rows.get(row).and_then(|cells| cells.get(col_idx))
    }
}

/// Parses raw JSON into a [`Document`] and flattens it.
pub fn flatten_value(value: &Value) -> Result<Table> {
    let document = Document::from_json(value)?;
    Ok(flatten(&document))
}

/// Flattens every record of every group into a single table.
///
/// Rows follow group order, then record order within the group. Each row is
/// tagged with its group name under [`GROUP_COLUMN`]; a record field with the
/// same name is replaced by the group name. A document without records yields
/// a table with no columns.
pub fn flatten(document: &Document) -> Table {
    if document.record_count() == 0 {
        return Table::default();
    }

    let mut builder = TableBuilder::new();
    for group in &document.groups {
        for record in &group.records {
            let mut row_values = Vec::with_capacity(record.fields.len() + 1);
            row_values.push((0, CellValue::Text(group.name.clone())));

            for (field, value) in &record.fields {
                if field == GROUP_COLUMN {
                    debug!(group = %group.name, "record field '{GROUP_COLUMN}' replaced by group name");
                    continue;
                }
                let col_idx = builder.claim_column(field);
                row_values.push((col_idx, value.clone()));
            }

            builder.rows.push(row_values);
        }
    }

    builder.into_table()
}

struct TableBuilder {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    rows: Vec<Vec<(usize, CellValue)>>,
}

impl TableBuilder {
    fn new() -> Self {
        Self {
            columns: vec![GROUP_COLUMN.to_string()],
            positions: HashMap::from([(GROUP_COLUMN.to_string(), 0)]),
            rows: Vec::new(),
        }
    }

    fn claim_column(&mut self, name: &str) -> usize {
        if let Some(&col_idx) = self.positions.get(name) {
            return col_idx;
        }
        let col_idx = self.columns.len();
        self.columns.push(name.to_string());
        self.positions.insert(name.to_string(), col_idx);
        col_idx
    }

    fn into_table(self) -> Table {
        let width = self.columns.len();
        let rows = self
            .rows
            .into_iter()
            .map(|values| {
                let mut cells = vec![CellValue::Empty; width];
                for (col_idx, value) in values {
                    cells[col_idx] = value;
                }
                cells
            })
            .collect();

        Table {
            columns: self.columns,
            rows,
        }
    }
}
