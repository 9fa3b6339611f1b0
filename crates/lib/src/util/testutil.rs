//! Test utilities for apkstage-lib.
//!
//! Helpers for building file trees with controlled modification times.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A fixed point in time, `secs` seconds after an arbitrary base.
///
/// Tests speak in small numbers (t=100, t=150) to mirror build scenarios.
pub fn at(secs: u64) -> SystemTime {
  UNIX_EPOCH + Duration::from_secs(1_600_000_000 + secs)
}

/// Sets the modification time of an existing file.
pub fn set_mtime(path: &Path, time: SystemTime) {
  let file = std::fs::File::options().write(true).open(path).unwrap();
  file.set_modified(time).unwrap();
}

/// Writes `content` to `root/relative`, creating parents, and sets its mtime.
pub fn write_at(root: &Path, relative: &str, content: &str, time: SystemTime) -> PathBuf {
  let path = root.join(relative);
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent).unwrap();
  }
  std::fs::write(&path, content).unwrap();
  set_mtime(&path, time);
  path
}
