//! Filesystem helpers with create-if-absent semantics.
//!
//! Directory creation never tests for existence first; an `AlreadyExists` error is
//! simply treated as success, so two processes racing to create the same tree both win.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{BuildError, PathContext, Result};

/// Ensures that `dir` and its parents exist.
pub fn ensure_dir(dir: &Path) -> Result<&Path> {
  fs::create_dir_all(dir).at_path(dir)?;
  Ok(dir)
}

/// Creates a single directory, reporting whether this call created it.
pub fn create_dir_if_absent(dir: &Path) -> Result<bool> {
  match fs::create_dir(dir) {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(false),
    Err(e) => Err(BuildError::at(dir, e)),
  }
}

/// Last-modified time of `path`, or `None` if it does not exist.
pub fn modified(path: &Path) -> Result<Option<SystemTime>> {
  match fs::metadata(path) {
    Ok(meta) => Ok(Some(meta.modified().at_path(path)?)),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(BuildError::at(path, e)),
  }
}

/// Copies a file and carries its modification time over to the copy.
pub fn copy_preserving_mtime(from: &Path, to: &Path) -> Result<()> {
  fs::copy(from, to).at_path(to)?;
  let time = fs::metadata(from).and_then(|m| m.modified()).at_path(from)?;
  let file = fs::File::options().write(true).open(to).at_path(to)?;
  file.set_modified(time).at_path(to)?;
  Ok(())
}

/// Recursively deletes `dir` and everything in it, returning the number of entries
/// (files and directories, `dir` included) that were deleted.
///
/// A missing `dir` is not an error: nothing is deleted and the count is zero.
pub fn remove_tree(dir: &Path) -> Result<usize> {
  if fs::symlink_metadata(dir).is_err() {
    return Ok(0);
  }

  let mut count = 0;
  for entry in WalkDir::new(dir).contents_first(true) {
    let entry = entry?;
    let path = entry.path();
    if entry.file_type().is_dir() {
      fs::remove_dir(path).at_path(path)?;
    } else {
      fs::remove_file(path).at_path(path)?;
    }
    count += 1;
  }

  debug!(dir = %dir.display(), count, "removed tree");
  Ok(count)
}
