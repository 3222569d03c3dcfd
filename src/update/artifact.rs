//! Access to the externally owned packaging artifact

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

/// Text resource holding the pinned state
pub trait PinnedArtifact: Send + Sync {
    fn read(&self) -> io::Result<String>;

    /// Replaces the whole content
    fn write(&self, content: &str) -> io::Result<()>;
}

/// Artifact stored in a file such as `package.nix`
#[derive(Debug, Clone)]
pub struct FileArtifact {
    path: PathBuf,
}

impl FileArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PinnedArtifact for FileArtifact {
    fn read(&self) -> io::Result<String> {
        debug!("Reading {:?}", self.path);
        std::fs::read_to_string(&self.path)
    }

    fn write(&self, content: &str) -> io::Result<()> {
        debug!("Writing {:?}", self.path);

        // Write a sibling temp file and rename it over the target so readers
        // never observe a partially written artifact
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;

        if let Ok(metadata) = std::fs::metadata(&self.path) {
            file.as_file().set_permissions(metadata.permissions())?;
        }

        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}
