use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{Result, ToolError};
use crate::model::Document;

/// Loads a breach dump from disk.
pub fn read_document(path: &Path) -> Result<Document> {
    let json = read_json(path)?;
    Document::from_json(&json)
}

/// Reads and parses a JSON file, keeping object member order.
pub fn read_json(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }

    let source = fs::read_to_string(path)?;
    let source = source.strip_prefix('\u{feff}').unwrap_or(&source);
    Ok(serde_json::from_str(source)?)
}
