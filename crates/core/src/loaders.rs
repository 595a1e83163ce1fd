//! Filesystem helpers for source and outline files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Returns `path` if it names an existing regular file.
pub fn validate_file(path: impl AsRef<Path>) -> io::Result<PathBuf> {
    let path = path.as_ref();
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a file", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

/// Reads a whole UTF-8 text file.
pub fn read_text(path: impl AsRef<Path>) -> io::Result<String> {
    let path = validate_file(path)?;
    fs::read_to_string(path)
}

/// File name without directory or extension (`chapters/ch1.md` → `ch1`).
///
/// Only the last extension is dropped, so `ch1.draft.md` becomes `ch1.draft`.
pub fn short_name(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_strips_directory_and_extension() {
        assert_eq!(short_name("chapters/ch1.md"), "ch1");
        assert_eq!(short_name("ch1"), "ch1");
        assert_eq!(short_name("/abs/path/ch1.draft.md"), "ch1.draft");
        assert_eq!(short_name(".hidden"), ".hidden");
    }

    #[test]
    fn validate_rejects_directories_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_file(dir.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        let missing = dir.path().join("missing.md");
        assert!(validate_file(&missing).is_err());
    }

    #[test]
    fn reads_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ch1.md");
        fs::write(&path, "hello\n").unwrap();
        assert_eq!(read_text(&path).unwrap(), "hello\n");
    }
}
