//! Working-directory preparation for a run.
//!
//! The process working directory is global state; callers sequencing
//! multiple runs must serialize them (each run context's temporary
//! directory is unique, but `set_current_dir` is shared).

use crate::error::RunError;
use std::io;
use std::path::{Path, PathBuf};

fn setup_error(path: &Path) -> impl FnOnce(io::Error) -> RunError + '_ {
    move |source| RunError::Setup {
        path: path.to_path_buf(),
        source,
    }
}

/// Resolve `path` against the current working directory.
fn absolute(path: &Path) -> Result<PathBuf, RunError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().map_err(setup_error(path))?;
        Ok(cwd.join(path))
    }
}

/// Create a fresh, uniquely named temporary directory that outlives the
/// run (it stays on disk until explicitly cleaned).
pub(crate) fn prepare_tmp_dir() -> Result<PathBuf, RunError> {
    let tmp = std::env::temp_dir();
    let dir = tempfile::Builder::new()
        .prefix("genharness-")
        .tempdir()
        .map_err(setup_error(&tmp))?;
    Ok(dir.into_path())
}

/// Create `path` if needed and remove any pre-existing contents.
pub(crate) fn prepare_dir(path: &Path) -> Result<PathBuf, RunError> {
    let path = absolute(path)?;
    std::fs::create_dir_all(&path).map_err(setup_error(&path))?;
    clean_dir(&path).map_err(setup_error(&path))?;
    Ok(path)
}

/// Make `path` the process working directory and report its canonical
/// absolute form.
pub(crate) fn enter(path: &Path) -> Result<PathBuf, RunError> {
    let path = absolute(path)?;
    std::env::set_current_dir(&path).map_err(setup_error(&path))?;
    let canonical = dunce::canonicalize(&path).map_err(setup_error(&path))?;
    tracing::debug!(dir = %canonical.display(), "entered working directory");
    Ok(canonical)
}

/// Remove the contents of `path`, keeping the directory itself.
pub(crate) fn clean_dir(path: &Path) -> io::Result<()> {
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let entry_path = entry.path();
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(&entry_path)?;
        } else {
            std::fs::remove_file(&entry_path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_dirs_are_unique_and_persistent() {
        let first = prepare_tmp_dir().unwrap();
        let second = prepare_tmp_dir().unwrap();
        assert_ne!(first, second);
        assert!(first.is_dir());
        assert!(second.is_dir());
        std::fs::remove_dir_all(&first).unwrap();
        std::fs::remove_dir_all(&second).unwrap();
    }

    #[test]
    fn prepare_dir_empties_existing_contents() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("fixture");
        std::fs::create_dir_all(target.join("nested")).unwrap();
        std::fs::write(target.join("stale.txt"), "old").unwrap();

        let prepared = prepare_dir(&target).unwrap();
        assert!(prepared.is_dir());
        assert_eq!(std::fs::read_dir(&prepared).unwrap().count(), 0);
    }

    #[test]
    fn clean_dir_keeps_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file"), "x").unwrap();
        clean_dir(dir.path()).unwrap();
        assert!(dir.path().is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
