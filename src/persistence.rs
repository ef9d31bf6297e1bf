//! Persistence boundary for compressed artifacts

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Artifact;

/// How an artifact is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactEncoding {
    Binary,
    Text,
}

pub trait Persistence {
    /// Store `artifact`, appending `suggested_extension` to the target name if
    /// it lacks it. Returns where the artifact was written.
    fn save(&self, artifact: &Artifact, suggested_extension: &str) -> Result<PathBuf>;

    /// Load an artifact from a source whose name ends with `extension_filter`.
    fn load(&self, extension_filter: &str, encoding: ArtifactEncoding) -> Result<Artifact>;
}

/// File-system persistence bound to a single path.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn with_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    if !path.to_string_lossy().ends_with(extension) {
        name.push(extension);
    }
    PathBuf::from(name)
}

impl Persistence for FilePersistence {
    fn save(&self, artifact: &Artifact, suggested_extension: &str) -> Result<PathBuf> {
        let target = with_extension(&self.path, suggested_extension);
        fs::write(&target, artifact.as_bytes())?;
        tracing::debug!(path = %target.display(), bytes = artifact.len(), "saved artifact");
        Ok(target)
    }

    fn load(&self, extension_filter: &str, encoding: ArtifactEncoding) -> Result<Artifact> {
        if !self.path.to_string_lossy().ends_with(extension_filter) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "{} does not match filter {extension_filter}",
                    self.path.display()
                ),
            )
            .into());
        }
        let artifact = match encoding {
            ArtifactEncoding::Binary => Artifact::Binary(fs::read(&self.path)?),
            ArtifactEncoding::Text => Artifact::Text(fs::read_to_string(&self.path)?),
        };
        tracing::debug!(path = %self.path.display(), bytes = artifact.len(), "loaded artifact");
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[test]
    fn test_save_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePersistence::new(dir.path().join("image"));
        let path = store
            .save(&Artifact::Binary(vec![1, 2]), ".RLC")
            .unwrap();
        assert_eq!(path, dir.path().join("image.RLC"));
        assert_eq!(fs::read(path).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_save_keeps_existing_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePersistence::new(dir.path().join("image.HCSV"));
        let path = store.save(&Artifact::Text("1\n,0".into()), ".HCSV").unwrap();
        assert_eq!(path, dir.path().join("image.HCSV"));
    }

    #[test]
    fn test_load_text_and_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.HCSV");
        fs::write(&path, "1\n,5").unwrap();
        let store = FilePersistence::new(&path);
        assert_eq!(
            store.load(".HCSV", ArtifactEncoding::Text).unwrap(),
            Artifact::Text("1\n,5".into())
        );
        assert_eq!(
            store.load(".HCSV", ArtifactEncoding::Binary).unwrap(),
            Artifact::Binary(b"1\n,5".to_vec())
        );
    }

    #[test]
    fn test_load_rejects_filter_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.RLC");
        fs::write(&path, [0, 1]).unwrap();
        let err = FilePersistence::new(&path)
            .load(".RLCBP", ArtifactEncoding::Binary)
            .unwrap_err();
        assert!(matches!(err, CodecError::Io(e) if e.kind() == io::ErrorKind::InvalidInput));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FilePersistence::new(dir.path().join("none.RLC"))
            .load(".RLC", ArtifactEncoding::Binary)
            .unwrap_err();
        assert!(matches!(err, CodecError::Io(_)));
    }
}
