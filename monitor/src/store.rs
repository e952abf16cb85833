//! Filesystem-backed document store.
//!
//! Writes go to a hidden temporary file next to the document which is then
//! renamed over it, so readers never observe a half-written document.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use checksync_engine::DocumentStore;
use tracing::trace;

/// Suffix of the temporary file used for atomic writes.
const TMP_SUFFIX: &str = ".checksync.tmp";

/// A markdown document on disk.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
}

impl FileDocument {
    /// Creates a store for the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of the temporary file used while writing.
    #[must_use]
    pub fn tmp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{name}{TMP_SUFFIX}"))
    }
}

impl DocumentStore for FileDocument {
    fn read(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }

    fn write(&self, content: &str) -> io::Result<()> {
        let tmp_path = self.tmp_path();

        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(content.as_bytes())?;
        tmp_file.sync_all()?;

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        trace!(path = %self.path.display(), bytes = content.len(), "Document written");
        Ok(())
    }
}
