// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cell text of .xlsx workbooks.

use std::collections::HashMap;

use folio_core::error::{FolioError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument, warn};

use super::{Package, get_attr, open_package, read_part, xml_error};
use crate::traits::{Sheet, SpreadsheetReader};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Reads every worksheet of a SpreadsheetML workbook as rows of cell text.
///
/// Formulas are not evaluated; the cached value stored in the file is used.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxReader;

impl SpreadsheetReader for XlsxReader {
    #[instrument(skip_all, fields(bytes_len = workbook.len()))]
    fn sheets(&self, workbook: &[u8]) -> Result<Vec<Sheet>> {
        let mut package = open_package(workbook)?;
        let workbook_xml = read_part(&mut package, WORKBOOK_PART)?
            .ok_or_else(|| FolioError::OfficeError(format!("{} is missing", WORKBOOK_PART)))?;
        let targets = match read_part(&mut package, WORKBOOK_RELS_PART)? {
            Some(rels) => parse_relationships(&rels)?,
            None => HashMap::new(),
        };
        let shared = match read_part(&mut package, SHARED_STRINGS_PART)? {
            Some(xml) => parse_shared_strings(&xml)?,
            None => Vec::new(),
        };

        let mut sheets = Vec::new();
        for (index, (name, rel_id)) in parse_sheet_list(&workbook_xml)?.into_iter().enumerate() {
            let part = rel_id
                .and_then(|id| targets.get(&id).cloned())
                .map(|target| resolve_target(&target))
                .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", index + 1));
            let rows = read_sheet(&mut package, &part, &shared)?;
            sheets.push(Sheet { name, rows });
        }
        debug!(sheets = sheets.len(), "Workbook read");
        Ok(sheets)
    }
}

fn read_sheet(package: &mut Package<'_>, part: &str, shared: &[String]) -> Result<Vec<Vec<String>>> {
    match read_part(package, part)? {
        Some(xml) => parse_worksheet(&xml, part, shared),
        None => {
            warn!(part, "Worksheet part missing, treating as empty");
            Ok(Vec::new())
        }
    }
}

/// Relationship targets are relative to `xl/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

/// `(sheet name, relationship id)` in workbook order.
fn parse_sheet_list(xml: &str) -> Result<Vec<(String, Option<String>)>> {
    let mut reader = Reader::from_str(xml);
    let mut sheets = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"sheet" => {
                let name = get_attr(e, b"name").unwrap_or_else(|| format!("Sheet{}", sheets.len() + 1));
                sheets.push((name, get_attr(e, b"r:id")));
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(xml_error(WORKBOOK_PART, err)),
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (get_attr(e, b"Id"), get_attr(e, b"Target")) {
                    targets.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(xml_error(WORKBOOK_RELS_PART, err)),
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

/// Each `<si>` item is the concatenation of its `<t>` runs.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Text(ref e)) if in_text => {
                if let Some(text) = current.as_mut() {
                    text.push_str(&e.unescape().map_err(|err| xml_error(SHARED_STRINGS_PART, err))?);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => strings.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(xml_error(SHARED_STRINGS_PART, err)),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Zero-based column of a cell reference such as `AB12`.
fn column_index(reference: &str) -> Option<usize> {
    let letters: String = reference.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if letters.is_empty() {
        return None;
    }
    let number = letters
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1));
    Some(number - 1)
}

/// Cell currently being read.
struct CellState {
    column: usize,
    kind: Option<String>,
    value: String,
}

fn parse_worksheet(xml: &str, part: &str, shared: &[String]) -> Result<Vec<Vec<String>>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<CellState> = None;
    let mut in_value = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"row" => row = Some(Vec::new()),
                b"c" => {
                    let next = row.as_ref().map_or(0, Vec::len);
                    cell = Some(CellState {
                        column: get_attr(e, b"r").as_deref().and_then(column_index).unwrap_or(next),
                        kind: get_attr(e, b"t"),
                        value: String::new(),
                    });
                }
                b"v" | b"t" => in_value = cell.is_some(),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"row" => rows.push(Vec::new()),
            Ok(Event::Text(ref e)) if in_value => {
                if let Some(state) = cell.as_mut() {
                    state.value.push_str(&e.unescape().map_err(|err| xml_error(part, err))?);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let (Some(state), Some(cells)) = (cell.take(), row.as_mut()) {
                        let text = cell_text(&state, shared);
                        if cells.len() <= state.column {
                            cells.resize(state.column + 1, String::new());
                        }
                        cells[state.column] = text;
                    }
                }
                b"row" => rows.extend(row.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(xml_error(part, err)),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

fn cell_text(state: &CellState, shared: &[String]) -> String {
    match state.kind.as_deref() {
        Some("s") => state
            .value
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| shared.get(index).cloned())
            .unwrap_or_default(),
        Some("b") => match state.value.trim() {
            "1" => "TRUE".to_string(),
            _ => "FALSE".to_string(),
        },
        _ => state.value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn workbook(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, xml) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    const WORKBOOK: &str = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Totals" sheetId="1" r:id="rId1"/></sheets></workbook>"#;
    const RELS: &str = r#"<Relationships><Relationship Id="rId1" Target="worksheets/sheet1.xml"/></Relationships>"#;
    const SHARED: &str = r#"<sst><si><t>Item</t></si><si><r><t>Pri</t></r><r><t>ce</t></r></si></sst>"#;
    const SHEET: &str = r#"<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1" t="s"><v>1</v></c></row>
<row r="2"><c r="A2" t="inlineStr"><is><t>Tea &amp; cake</t></is></c><c r="B2" t="b"><v>1</v></c><c r="C2"><v>4.5</v></c></row>
</sheetData></worksheet>"#;

    #[test]
    fn reads_shared_inline_and_numeric_cells() {
        let xlsx = workbook(&[
            (WORKBOOK_PART, WORKBOOK),
            (WORKBOOK_RELS_PART, RELS),
            (SHARED_STRINGS_PART, SHARED),
            ("xl/worksheets/sheet1.xml", SHEET),
        ]);
        let sheets = XlsxReader.sheets(&xlsx).unwrap();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Totals");
        assert_eq!(
            sheets[0].rows,
            vec![
                vec!["Item".to_string(), String::new(), "Price".to_string()],
                vec!["Tea & cake".to_string(), "TRUE".to_string(), "4.5".to_string()],
            ]
        );
    }

    #[test]
    fn falls_back_to_positional_sheet_parts() {
        let xlsx = workbook(&[(WORKBOOK_PART, WORKBOOK), ("xl/worksheets/sheet1.xml", SHEET)]);
        let sheets = XlsxReader.sheets(&xlsx).unwrap();
        // Without shared strings, shared-string cells read as empty.
        assert_eq!(sheets[0].rows[0][0], "");
        assert_eq!(sheets[0].rows[1][2], "4.5");
    }

    #[test]
    fn column_letters_map_to_indices() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("Z9"), Some(25));
        assert_eq!(column_index("AB12"), Some(27));
        assert_eq!(column_index("12"), None);
    }

    #[test]
    fn missing_workbook_is_an_error() {
        let xlsx = workbook(&[("xl/worksheets/sheet1.xml", SHEET)]);
        assert!(matches!(XlsxReader.sheets(&xlsx), Err(FolioError::OfficeError(_))));
    }
}
