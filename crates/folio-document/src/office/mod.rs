// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Office Open XML containers: reading word-processing and spreadsheet
// documents, writing picture-only presentations.

pub mod docx;
pub mod pptx;
pub mod xlsx;

pub use docx::DocxReader;
pub use pptx::PptxWriter;
pub use xlsx::XlsxReader;

use std::io::{Cursor, Read};

use folio_core::error::{FolioError, Result};
use quick_xml::events::BytesStart;
use zip::ZipArchive;
use zip::result::ZipError;

pub(crate) type Package<'a> = ZipArchive<Cursor<&'a [u8]>>;

pub(crate) fn open_package(bytes: &[u8]) -> Result<Package<'_>> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|err| FolioError::OfficeError(format!("not an Office Open XML package: {}", err)))
}

/// Read one part as UTF-8 text; `None` when the part does not exist.
pub(crate) fn read_part(package: &mut Package<'_>, name: &str) -> Result<Option<String>> {
    let mut file = match package.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(FolioError::OfficeError(format!("cannot open {}: {}", name, err))),
    };
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|err| FolioError::OfficeError(format!("cannot read {}: {}", name, err)))?;
    Ok(Some(contents))
}

/// Attribute value by its qualified name (e.g. `r:id`).
pub(crate) fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| String::from_utf8(a.value.to_vec()).ok())
}

pub(crate) fn xml_error(part: &str, err: quick_xml::Error) -> FolioError {
    FolioError::OfficeError(format!("malformed {}: {}", part, err))
}

pub(crate) fn escape_xml(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}
