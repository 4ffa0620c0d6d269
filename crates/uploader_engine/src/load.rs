use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uploader_core::LocalFile;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0:?} is not a regular file")]
    NotAFile(PathBuf),
}

/// Reads a file from disk into a [`LocalFile`], sniffing its MIME type.
pub fn load_local_file(path: &Path) -> Result<LocalFile, LoadError> {
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let meta = fs::metadata(path).map_err(io_err)?;
    if !meta.is_file() {
        return Err(LoadError::NotAFile(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(io_err)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(LocalFile::sniffed(name, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uploader_core::FileInspector;

    #[test]
    fn loads_bytes_and_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cover.webp");
        fs::write(&path, b"not really webp").unwrap();

        let file = load_local_file(&path).unwrap();
        assert_eq!(file.name(), "cover.webp");
        assert_eq!(file.mime_type(), "image/webp");
        assert_eq!(file.len(), 15);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_local_file(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_local_file(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::NotAFile(_)));
    }
}
