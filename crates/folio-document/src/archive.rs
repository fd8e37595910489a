// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ZIP packaging of multi-file results.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use folio_core::error::{FolioError, Result};
use tracing::{info, instrument};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::traits::{ArchiveEntry, ArchiveWriter};

/// Packs entries into a deflated ZIP archive, in the order given.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiver;

impl ArchiveWriter for ZipArchiver {
    #[instrument(skip_all, fields(entries = entries.len()))]
    fn pack(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = entries.iter().find(|entry| !seen.insert(entry.name.as_str())) {
            return Err(FolioError::ArchiveError(format!("duplicate entry name: {}", duplicate.name)));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for entry in entries {
            zip.start_file(entry.name.as_str(), options)
                .map_err(|err| FolioError::ArchiveError(format!("cannot add {}: {}", entry.name, err)))?;
            zip.write_all(&entry.data)?;
        }
        let cursor = zip
            .finish()
            .map_err(|err| FolioError::ArchiveError(format!("cannot finish archive: {}", err)))?;
        let bytes = cursor.into_inner();
        info!(output_bytes = bytes.len(), "Archive packed");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn entry(name: &str, data: &[u8]) -> ArchiveEntry {
        ArchiveEntry {
            name: name.into(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn entries_keep_their_order_and_contents() {
        let packed = ZipArchiver
            .pack(&[entry("page-1.jpg", b"one"), entry("page-2.jpg", b"two")])
            .unwrap();
        let mut archive = ZipArchive::new(Cursor::new(packed)).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), "page-1.jpg");
        let mut second = String::new();
        archive.by_name("page-2.jpg").unwrap().read_to_string(&mut second).unwrap();
        assert_eq!(second, "two");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = ZipArchiver.pack(&[entry("a.jpg", b"1"), entry("a.jpg", b"2")]);
        assert!(matches!(result, Err(FolioError::ArchiveError(_))));
    }
}
