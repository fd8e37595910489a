// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paragraph text of .docx documents.

use folio_core::error::{FolioError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument};

use super::{open_package, read_part, xml_error};
use crate::traits::OfficeReader;

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads the body paragraphs of a WordprocessingML document.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxReader;

impl OfficeReader for DocxReader {
    #[instrument(skip_all, fields(bytes_len = document.len()))]
    fn paragraphs(&self, document: &[u8]) -> Result<Vec<String>> {
        let mut package = open_package(document)?;
        let xml = read_part(&mut package, DOCUMENT_PART)?
            .ok_or_else(|| FolioError::OfficeError(format!("{} is missing", DOCUMENT_PART)))?;
        let paragraphs = parse_paragraphs(&xml)?;
        debug!(paragraphs = paragraphs.len(), "Document text extracted");
        Ok(paragraphs)
    }
}

fn parse_paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    // Whitespace inside runs is significant.
    reader.config_mut().trim_text(false);

    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"p" => current = Some(String::new()),
                b"t" => in_text = current.is_some(),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match (e.local_name().as_ref(), current.as_mut()) {
                (b"p", _) => paragraphs.push(String::new()),
                (b"tab", Some(text)) => text.push('\t'),
                (b"br" | b"cr", Some(text)) => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                if let Some(text) = current.as_mut() {
                    let chunk = e.unescape().map_err(|err| xml_error(DOCUMENT_PART, err))?;
                    text.push_str(&chunk);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(xml_error(DOCUMENT_PART, err)),
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    /// A minimal .docx containing the given body XML.
    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_PART, SimpleFileOptions::default()).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
        .unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn reads_paragraph_runs() {
        let docx = docx_with_body(
            r#"<w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>
<w:p><w:r><w:t>A&amp;B</w:t><w:tab/><w:t>tabbed</w:t></w:r></w:p><w:p/>"#,
        );
        let paragraphs = DocxReader.paragraphs(&docx).unwrap();
        assert_eq!(paragraphs, vec!["Hello world", "A&B\ttabbed", ""]);
    }

    #[test]
    fn ignores_text_outside_paragraphs() {
        let docx = docx_with_body(r#"<w:sectPr><w:t>stray</w:t></w:sectPr><w:p><w:r><w:t>kept</w:t></w:r></w:p>"#);
        assert_eq!(DocxReader.paragraphs(&docx).unwrap(), vec!["kept"]);
    }

    #[test]
    fn non_zip_input_is_an_office_error() {
        assert!(matches!(
            DocxReader.paragraphs(b"plain text"),
            Err(FolioError::OfficeError(_))
        ));
    }
}
