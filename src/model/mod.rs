use serde_json::{Map, Number, Value};

use crate::error::{Result, ToolError};

/// A breach dump: named groups of records, in the order they appear in the
/// source JSON.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub groups: Vec<Group>,
}

impl Document {
    /// Builds a document from an already parsed JSON value.
    ///
    /// The value must be an object whose members are arrays of objects. Any
    /// other shape is rejected with [`ToolError::InvalidInput`].
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            ToolError::InvalidInput(format!(
                "expected a JSON object of groups, found {}",
                json_kind(value)
            ))
        })?;

        let groups = object
            .iter()
            .map(|(name, records)| Group::from_json(name, records))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { groups })
    }

    /// Total number of records across all groups.
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|group| group.records.len()).sum()
    }
}

/// A named collection of records, e.g. one breach data set.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    pub records: Vec<Record>,
}

impl Group {
    fn from_json(name: &str, value: &Value) -> Result<Self> {
        let items = value.as_array().ok_or_else(|| {
            ToolError::InvalidInput(format!(
                "group '{name}' must be an array of records, found {}",
                json_kind(value)
            ))
        })?;

        let records = items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Record::from_map(map),
                other => Err(ToolError::InvalidInput(format!(
                    "record {index} of group '{name}' must be an object, found {}",
                    json_kind(other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            records,
        })
    }
}

/// One flat key/value entry. Field order follows the source object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub fields: Vec<(String, CellValue)>,
}

impl Record {
    fn from_map(map: &Map<String, Value>) -> Result<Self> {
        let fields = map
            .iter()
            .map(|(key, value)| Ok((key.clone(), CellValue::from_json(value)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }
}

/// Value stored in a single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// Missing field or JSON `null`.
    #[default]
    Empty,
    Text(String),
    Number(Number),
    Bool(bool),
}

impl CellValue {
    /// Converts a JSON value into a cell. Nested arrays and objects are kept
    /// as compact JSON text.
    pub fn from_json(value: &Value) -> Result<Self> {
        Ok(match value {
            Value::Null => CellValue::Empty,
            Value::Bool(value) => CellValue::Bool(*value),
            Value::Number(number) => CellValue::Number(number.clone()),
            Value::String(text) => CellValue::Text(text.clone()),
            nested @ (Value::Array(_) | Value::Object(_)) => {
                CellValue::Text(serde_json::to_string(nested)?)
            }
        })
    }

    /// Text shown for the cell; empty cells render as the empty string.
    pub fn rendered(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Number(number) => number.to_string(),
            CellValue::Bool(value) => value.to_string(),
        }
    }

    /// Rendered length in characters, used to size columns.
    pub fn rendered_len(&self) -> usize {
        match self {
            CellValue::Text(text) => text.chars().count(),
            other => other.rendered().chars().count(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
