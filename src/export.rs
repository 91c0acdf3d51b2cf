//! CSV and spreadsheet export of the result tables.
//!
//! CSV is always available. The spreadsheet export builds a minimal
//! single-sheet xlsx package (a zip of XML parts with inline strings);
//! callers treat any failure there as "no spreadsheet capability" and fall
//! back to CSV-only.

use std::io::{Cursor, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::domain::{SearchTerm, Year};
use crate::error::ExplorerError;
use crate::table::{BENEFIT_CODE, DiseaseTable, ErrorTable};

pub fn disease_csv_name(term: &SearchTerm, year: Year) -> String {
    format!("icd10_{}_{}.csv", term.as_str(), year)
}

pub fn disease_xlsx_name(term: &SearchTerm, year: Year) -> String {
    format!("icd10_{}_{}.xlsx", term.as_str(), year)
}

pub fn errors_csv_name(term: &SearchTerm, year: Year) -> String {
    format!("errors_{}_{}.csv", term.as_str(), year)
}

/// The disease table as a CSV byte stream, header included.
pub fn disease_csv_bytes(table: &DiseaseTable) -> Result<Vec<u8>, ExplorerError> {
    let columns = table.columns();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&columns)
        .map_err(|err| ExplorerError::CsvExport(err.to_string()))?;
    for row in &table.rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| {
                if column == BENEFIT_CODE {
                    row.benefit_code.clone()
                } else {
                    row.fields.get(column).map(cell_text).unwrap_or_default()
                }
            })
            .collect();
        writer
            .write_record(&record)
            .map_err(|err| ExplorerError::CsvExport(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| ExplorerError::CsvExport(err.to_string()))
}

/// The error table as a CSV byte stream; the three columns are present even
/// when there are no records.
pub fn error_csv_bytes(table: &ErrorTable) -> Result<Vec<u8>, ExplorerError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["etap", "kod/ID", "komunikat"])
        .map_err(|err| ExplorerError::CsvExport(err.to_string()))?;
    for record in &table.records {
        writer
            .write_record([
                record.stage.label(),
                record.item_id.as_deref().unwrap_or(""),
                record.message.as_str(),
            ])
            .map_err(|err| ExplorerError::CsvExport(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| ExplorerError::CsvExport(err.to_string()))
}

/// The disease table as a single-sheet xlsx byte stream.
pub fn disease_xlsx_bytes(table: &DiseaseTable) -> Result<Vec<u8>, ExplorerError> {
    let columns = table.columns();
    let mut sheet = String::new();
    sheet.push_str(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    push_row(&mut sheet, 1, columns.iter().map(|c| Cell::Text(c.clone())));
    for (i, row) in table.rows.iter().enumerate() {
        let cells = columns.iter().map(|column| {
            if column == BENEFIT_CODE {
                Cell::Text(row.benefit_code.clone())
            } else {
                match row.fields.get(column) {
                    Some(Value::Number(number)) => Cell::Number(number.to_string()),
                    Some(value) => Cell::Text(cell_text(value)),
                    None => Cell::Text(String::new()),
                }
            }
        });
        push_row(&mut sheet, i + 2, cells);
    }
    sheet.push_str("</sheetData></worksheet>");

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", ROOT_RELS_XML),
        ("xl/workbook.xml", WORKBOOK_XML),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ] {
        zip.start_file(name, options)
            .map_err(|err| ExplorerError::XlsxExport(err.to_string()))?;
        zip.write_all(content.as_bytes())
            .map_err(|err| ExplorerError::XlsxExport(err.to_string()))?;
    }
    let cursor = zip
        .finish()
        .map_err(|err| ExplorerError::XlsxExport(err.to_string()))?;
    Ok(cursor.into_inner())
}

/// Writes the disease table as a spreadsheet, degrading to CSV-only when
/// the xlsx cannot be produced or written. Returns the path actually
/// written.
pub fn write_spreadsheet_or_csv(
    table: &DiseaseTable,
    xlsx_path: &Utf8Path,
    csv_path: &Utf8Path,
) -> Result<Utf8PathBuf, ExplorerError> {
    match disease_xlsx_bytes(table).and_then(|bytes| write_bytes(xlsx_path, &bytes)) {
        Ok(()) => Ok(xlsx_path.to_owned()),
        Err(err) => {
            tracing::warn!(%err, "xlsx export unavailable, falling back to CSV");
            let bytes = disease_csv_bytes(table)?;
            write_bytes(csv_path, &bytes)?;
            Ok(csv_path.to_owned())
        }
    }
}

pub fn write_bytes(path: &Utf8Path, bytes: &[u8]) -> Result<(), ExplorerError> {
    std::fs::write(path.as_std_path(), bytes)
        .map_err(|err| ExplorerError::Filesystem(format!("{path}: {err}")))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

enum Cell {
    Text(String),
    Number(String),
}

fn push_row(sheet: &mut String, row_index: usize, cells: impl Iterator<Item = Cell>) {
    sheet.push_str(&format!(r#"<row r="{row_index}">"#));
    for (col, cell) in cells.enumerate() {
        let cell_ref = format!("{}{row_index}", column_letters(col));
        match cell {
            Cell::Text(text) => sheet.push_str(&format!(
                r#"<c r="{cell_ref}" t="inlineStr"><is><t>{}</t></is></c>"#,
                xml_escape(&text)
            )),
            Cell::Number(number) => {
                sheet.push_str(&format!(r#"<c r="{cell_ref}"><v>{number}</v></c>"#));
            }
        }
    }
    sheet.push_str("</row>");
}

fn column_letters(mut index: usize) -> String {
    let mut letters = String::new();
    loop {
        letters.insert(0, (b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="ICD10" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;
