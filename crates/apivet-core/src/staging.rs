//! Per-request temporary files for the `temp_file` staging strategy.
//!
//! A `StagedArtifact` owns exactly one uniquely named file. The file is removed
//! by `close`, or by `Drop` when the owning request unwinds, times out or is
//! cancelled before reaching `close`.

use std::io;
use std::path::Path;

use tempfile::NamedTempFile;
use tokio::fs;

use crate::Error;

const ARTIFACT_PREFIX: &str = "apivet-";
const ARTIFACT_SUFFIX: &str = ".yaml";

#[derive(Debug)]
pub struct StagedArtifact {
    file: NamedTempFile,
}

impl StagedArtifact {
    /// Create a uniquely named file in `dir` holding `content` byte for byte.
    pub async fn create(dir: &Path, content: &str) -> crate::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(ARTIFACT_PREFIX)
            .suffix(ARTIFACT_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| {
                Error::artifact_io(format!(
                    "failed to create staging file in {}: {}",
                    dir.display(),
                    e
                ))
            })?;

        // On failure `file` is dropped here, which removes it.
        fs::write(file.path(), content).await.map_err(|e| {
            Error::artifact_io(format!(
                "failed to write staging file {}: {}",
                file.path().display(),
                e
            ))
        })?;

        log::debug!("Staged submission at {}", file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the file, reporting a failed removal to the caller.
    pub fn close(self) -> io::Result<()> {
        self.file.close()
    }
}
