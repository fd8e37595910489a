// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output materialization: turning an artifact into a saved file.

use std::io::Write;
use std::path::{Path, PathBuf};

use folio_core::OutputArtifact;
use folio_core::error::{FolioError, Result};
use tempfile::NamedTempFile;
use tracing::{info, instrument};

/// Saves artifacts somewhere the user can reach them.
pub trait Materializer: Send + Sync {
    fn materialize(&self, artifact: &OutputArtifact) -> Result<PathBuf>;
}

/// Writes artifacts into one directory, replacing files of the same name.
#[derive(Debug, Clone)]
pub struct DirectoryMaterializer {
    dir: PathBuf,
}

impl DirectoryMaterializer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Keep the final path component only, and never an empty or dot name.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = base
        .chars()
        .map(|ch| if ch.is_control() || matches!(ch, ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { ch })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "output".to_string(),
        _ => cleaned,
    }
}

impl Materializer for DirectoryMaterializer {
    #[instrument(skip_all, fields(filename = %artifact.filename, bytes = artifact.payload.len()))]
    fn materialize(&self, artifact: &OutputArtifact) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let target = self.dir.join(sanitize_filename(&artifact.filename));

        // The temp file is removed on drop unless persisted.
        let mut staging = NamedTempFile::new_in(&self.dir)?;
        staging.write_all(artifact.payload.as_bytes())?;
        staging.flush()?;
        staging
            .persist(&target)
            .map_err(|err| FolioError::Io(err.error))?;

        info!(path = %target.display(), "Artifact saved");
        Ok(target)
    }
}

/// Asks the user where to save each artifact.
#[cfg(feature = "dialog")]
#[derive(Debug, Default, Clone, Copy)]
pub struct DialogMaterializer;

#[cfg(feature = "dialog")]
impl Materializer for DialogMaterializer {
    fn materialize(&self, artifact: &OutputArtifact) -> Result<PathBuf> {
        let extension = artifact.filename.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("bin");
        let target = rfd::FileDialog::new()
            .set_file_name(&artifact.filename)
            .add_filter(&artifact.media_type, &[extension])
            .save_file()
            .ok_or_else(|| FolioError::precondition("Save cancelled."))?;
        std::fs::write(&target, artifact.payload.as_bytes())?;
        info!(path = %target.display(), "Artifact saved");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::media;

    #[test]
    fn writes_payload_under_artifact_name() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = DirectoryMaterializer::new(dir.path());
        let artifact = OutputArtifact::text("hello", "converted.txt", media::TEXT);

        let path = materializer.materialize(&artifact).unwrap();
        assert_eq!(path, dir.path().join("converted.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn materializing_twice_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let materializer = DirectoryMaterializer::new(dir.path());
        let artifact = OutputArtifact::binary(vec![1u8, 2, 3], "merged.pdf", media::PDF);

        let first = materializer.materialize(&artifact).unwrap();
        let second = materializer.materialize(&artifact).unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&second).unwrap(), vec![1, 2, 3]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("run");
        let path = DirectoryMaterializer::new(&nested)
            .materialize(&OutputArtifact::text("x", "a.txt", media::TEXT))
            .unwrap();
        assert!(path.starts_with(&nested));
    }

    #[test]
    fn filenames_cannot_escape_the_directory() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("a:b?.pdf"), "a_b_.pdf");
        assert_eq!(sanitize_filename(".."), "output");
        assert_eq!(sanitize_filename(""), "output");
    }
}
