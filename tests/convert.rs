use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use json2excel::ToolError;
use json2excel::convert::{convert_json_to_excel, excel_path_for};
use json2excel::flatten::{DEFAULT_SHEET_NAME, GROUP_COLUMN, Table, flatten_value};
use json2excel::io::excel_write::{self, COLUMN_PADDING, column_widths};
use serde_json::json;
use tempfile::tempdir;
use zip::ZipArchive;

fn read_sheet(path: &Path, sheet_name: &str) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook(path).expect("workbook opened");
    let range = workbook
        .worksheet_range(sheet_name)
        .expect("sheet present")
        .expect("sheet read");

    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    DataType::String(value) => value.clone(),
                    DataType::Float(value) => value.to_string(),
                    DataType::Int(value) => value.to_string(),
                    DataType::Bool(value) => value.to_string(),
                    DataType::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

fn read_part(path: &Path, part: &str) -> String {
    let file = File::open(path).expect("workbook opened");
    let mut archive = ZipArchive::new(file).expect("workbook is a zip archive");
    let mut entry = archive.by_name(part).expect("part present");
    let mut xml = String::new();
    entry.read_to_string(&mut xml).expect("part read");
    xml
}

fn breach_table() -> Table {
    flatten_value(&json!({
        "BreachA": [{"email": "a@x.com"}],
        "BreachB": [{"email": "b@x.com", "password": "hunter2"}]
    }))
    .expect("table built")
}

#[test]
fn json_file_converts_to_workbook() {
    let temp_dir = tempdir().expect("temporary directory");
    let json_path = temp_dir.path().join("dump.json");
    fs::write(
        &json_path,
        r#"{"BreachA": [{"email": "a@x.com"}], "BreachB": [{"email": "b@x.com", "password": "hunter2"}]}"#,
    )
    .expect("JSON input written");

    let xlsx_path = excel_path_for(&json_path, None);
    assert_eq!(xlsx_path, temp_dir.path().join("dump.xlsx"));

    let summary = convert_json_to_excel(&json_path, &xlsx_path, DEFAULT_SHEET_NAME)
        .expect("conversion succeeded");
    assert_eq!(summary.groups, 2);
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.columns, 3);

    let cells = read_sheet(&xlsx_path, DEFAULT_SHEET_NAME);
    assert_eq!(
        cells,
        vec![
            vec![GROUP_COLUMN.to_string(), "email".into(), "password".into()],
            vec!["BreachA".into(), "a@x.com".into(), String::new()],
            vec!["BreachB".into(), "b@x.com".into(), "hunter2".into()],
        ]
    );
}

#[test]
fn numbers_and_booleans_keep_their_types() {
    let table = flatten_value(&json!({
        "Typed": [{"age": 30, "active": false}]
    }))
    .expect("table built");

    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("typed.xlsx");
    excel_write::write_table(&xlsx_path, &table, "Typed").expect("workbook written");

    let mut workbook: Xlsx<_> = open_workbook(&xlsx_path).expect("workbook opened");
    let range = workbook
        .worksheet_range("Typed")
        .expect("sheet present")
        .expect("sheet read");
    assert_eq!(range.get_value((1, 1)), Some(&DataType::Float(30.0)));
    assert_eq!(range.get_value((1, 2)), Some(&DataType::Bool(false)));
}

#[test]
fn custom_sheet_name_is_used() {
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("named.xlsx");
    excel_write::write_table(&xlsx_path, &breach_table(), "Leaks 2024").expect("written");

    let workbook: Xlsx<_> = open_workbook(&xlsx_path).expect("workbook opened");
    assert_eq!(workbook.sheet_names().to_vec(), vec!["Leaks 2024".to_string()]);
}

#[test]
fn column_widths_fit_longest_value_plus_padding() {
    let table = flatten_value(&json!({
        "A": [{"email": "someone.long@example.com", "pw": "x"}],
        "LongerBreachNameHere": [{"email": "b@x.com"}]
    }))
    .expect("table built");

    let widths = column_widths(&table);
    assert_eq!(
        widths,
        vec![
            "LongerBreachNameHere".len() + COLUMN_PADDING,
            "someone.long@example.com".len() + COLUMN_PADDING,
            "pw".len() + COLUMN_PADDING,
        ]
    );
}

#[test]
fn column_widths_count_characters_not_bytes() {
    let table = flatten_value(&json!({"G": [{"n": "ééé"}]})).expect("table built");
    assert_eq!(column_widths(&table)[1], 3 + COLUMN_PADDING);
}

#[test]
fn empty_table_is_rejected() {
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("empty.xlsx");

    let error = excel_write::write_table(&xlsx_path, &Table::default(), DEFAULT_SHEET_NAME)
        .expect_err("empty table rejected");
    assert!(matches!(error, ToolError::EmptyTable));
    assert!(!xlsx_path.exists());
}

#[test]
fn empty_document_conversion_fails_without_output() {
    let temp_dir = tempdir().expect("temporary directory");
    let json_path = temp_dir.path().join("empty.json");
    fs::write(&json_path, "{}").expect("JSON input written");
    let xlsx_path = temp_dir.path().join("empty.xlsx");

    let error = convert_json_to_excel(&json_path, &xlsx_path, DEFAULT_SHEET_NAME)
        .expect_err("empty document rejected");
    assert!(error.is_invalid_input());
    assert!(!xlsx_path.exists());
}

#[test]
fn blank_sheet_name_is_rejected() {
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("blank.xlsx");

    let error = excel_write::write_table(&xlsx_path, &breach_table(), "  ")
        .expect_err("blank sheet name rejected");
    assert!(matches!(error, ToolError::InvalidSheetName(_)));
}

#[test]
fn missing_parent_directory_is_an_io_error() {
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("missing").join("out.xlsx");

    let error = excel_write::write_table(&xlsx_path, &breach_table(), DEFAULT_SHEET_NAME)
        .expect_err("missing directory rejected");
    assert!(matches!(error, ToolError::Io(_)), "unexpected error: {error}");
}

#[test]
fn failed_write_leaves_existing_file_untouched() {
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("existing.xlsx");
    fs::write(&xlsx_path, b"previous contents").expect("placeholder written");

    excel_write::write_table(&xlsx_path, &breach_table(), "bad[name]")
        .expect_err("invalid sheet name rejected");

    assert_eq!(fs::read(&xlsx_path).expect("file read"), b"previous contents");
}

#[test]
fn overwrites_existing_output() {
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("out.xlsx");
    fs::write(&xlsx_path, b"stale").expect("placeholder written");

    excel_write::write_table(&xlsx_path, &breach_table(), DEFAULT_SHEET_NAME)
        .expect("workbook written");

    assert_eq!(read_sheet(&xlsx_path, DEFAULT_SHEET_NAME).len(), 3);
}

#[test]
fn missing_input_is_reported() {
    let temp_dir = tempdir().expect("temporary directory");
    let json_path = temp_dir.path().join("absent.json");

    let error = convert_json_to_excel(
        &json_path,
        &temp_dir.path().join("absent.xlsx"),
        DEFAULT_SHEET_NAME,
    )
    .expect_err("missing input rejected");
    assert!(matches!(error, ToolError::MissingInput(path) if path == json_path));
}

#[test]
fn malformed_json_is_invalid_input() {
    let temp_dir = tempdir().expect("temporary directory");
    let json_path = temp_dir.path().join("broken.json");
    fs::write(&json_path, "{\"A\": [").expect("JSON input written");

    let error = convert_json_to_excel(
        &json_path,
        &temp_dir.path().join("broken.xlsx"),
        DEFAULT_SHEET_NAME,
    )
    .expect_err("malformed JSON rejected");
    assert!(matches!(error, ToolError::Json(_)));
    assert!(error.is_invalid_input());
}

#[test]
fn output_path_uses_input_stem() {
    let input = Path::new("uploads/archive.2024.json");
    assert_eq!(
        excel_path_for(input, Some(Path::new("processed"))),
        Path::new("processed/archive.2024.xlsx")
    );
    assert_eq!(excel_path_for(input, None), Path::new("uploads/archive.2024.xlsx"));
}

#[test]
fn header_is_bold_on_light_gray_fill() {
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("styled.xlsx");
    excel_write::write_table(&xlsx_path, &breach_table(), DEFAULT_SHEET_NAME)
        .expect("workbook written");

    let styles = read_part(&xlsx_path, "xl/styles.xml");
    assert!(styles.contains("<b/>"), "{styles}");
    assert!(
        styles.contains(r#"<patternFill patternType="solid"><fgColor rgb="FFD3D3D3"/>"#),
        "{styles}"
    );

    let sheet = read_part(&xlsx_path, "xl/worksheets/sheet1.xml");
    for header_cell in ["A1", "B1", "C1"] {
        assert!(
            sheet.contains(&format!(r#"<c r="{header_cell}" s="1""#)),
            "{header_cell} not styled: {sheet}"
        );
    }
    for data_cell in ["A2", "B2", "A3", "C3"] {
        assert!(
            !sheet.contains(&format!(r#"<c r="{data_cell}" s="#)),
            "{data_cell} unexpectedly styled: {sheet}"
        );
    }
}

#[test]
fn written_columns_carry_fitted_widths() {
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("widths.xlsx");
    excel_write::write_table(&xlsx_path, &breach_table(), DEFAULT_SHEET_NAME)
        .expect("workbook written");

    let sheet = read_part(&xlsx_path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<cols>"), "{sheet}");
    // "Breach Name" (11), "b@x.com" (7), "password" (8), each plus 2; Excel
    // stores widths with the default font's pixel padding added.
    for (col, width) in [(1, 13), (2, 9), (3, 10)] {
        let expected = format!(r#"<col min="{col}" max="{col}" width="{width}.7109375""#);
        assert!(sheet.contains(&expected), "missing {expected}: {sheet}");
    }
}

#[cfg(unix)]
#[test]
fn new_workbook_is_not_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("shared.xlsx");
    excel_write::write_table(&xlsx_path, &breach_table(), DEFAULT_SHEET_NAME)
        .expect("workbook written");

    let mode = fs::metadata(&xlsx_path).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}

#[cfg(unix)]
#[test]
fn overwrite_keeps_existing_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("kept.xlsx");
    fs::write(&xlsx_path, b"stale").expect("placeholder written");
    fs::set_permissions(&xlsx_path, fs::Permissions::from_mode(0o640)).expect("mode set");

    excel_write::write_table(&xlsx_path, &breach_table(), DEFAULT_SHEET_NAME)
        .expect("workbook written");

    let mode = fs::metadata(&xlsx_path).expect("metadata").permissions().mode();
    assert_eq!(mode & 0o777, 0o640);
}
