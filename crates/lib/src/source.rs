//! Source set resolution.
//!
//! Walks a source tree depth-first in file-name order, consulting a [`SourceMatcher`]
//! for every entry below the root. A directory the matcher rejects is pruned: the walk
//! never descends into it, so unioned scans stay mutually exclusive and excluded
//! subtrees are never read.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::ConfigError;
use crate::error::{PathContext, Result};

/// Decides which entries of a source tree take part in the build.
pub trait SourceMatcher {
  fn matches(&self, path: &Path, is_dir: bool) -> bool;
}

/// The default matcher: every file and directory is a source.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl SourceMatcher for AcceptAll {
  fn matches(&self, _path: &Path, _is_dir: bool) -> bool {
    true
  }
}

impl<F> SourceMatcher for F
where
  F: Fn(&Path, bool) -> bool,
{
  fn matches(&self, path: &Path, is_dir: bool) -> bool {
    self(path, is_dir)
  }
}

/// Rejects entries matching any of a list of gitignore-style patterns.
#[derive(Debug, Clone)]
pub struct ExcludeMatcher {
  excludes: Gitignore,
}

impl ExcludeMatcher {
  /// Compiles `patterns` relative to `root`.
  pub fn new(root: &Path, patterns: &[String]) -> Result<Self, ConfigError> {
    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
      builder
        .add_line(None, pattern)
        .map_err(|e| ConfigError::invalid("source_exclude", format!("{}: {}", pattern, e)))?;
    }
    let excludes = builder
      .build()
      .map_err(|e| ConfigError::invalid("source_exclude", e.to_string()))?;
    Ok(Self { excludes })
  }

  pub fn is_empty(&self) -> bool {
    self.excludes.is_empty()
  }
}

impl SourceMatcher for ExcludeMatcher {
  fn matches(&self, path: &Path, is_dir: bool) -> bool {
    !self.excludes.matched(path, is_dir).is_ignore()
  }
}

/// A file found by [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceFile {
  /// Absolute (or root-joined) path.
  pub path: PathBuf,
  /// Path relative to the walked root.
  pub relative: PathBuf,
  pub modified: SystemTime,
}

impl SourceFile {
  pub fn file_name(&self) -> &str {
    self.path.file_name().and_then(|n| n.to_str()).unwrap_or("")
  }

  pub fn has_extension(&self, ext: &str) -> bool {
    self.path.extension().is_some_and(|e| e == ext)
  }
}

/// Walks `root` and returns every file the matcher accepts, in walk order.
///
/// Each call performs a fresh walk.
pub fn resolve(root: &Path, matcher: &dyn SourceMatcher) -> Result<Vec<SourceFile>> {
  std::fs::metadata(root).at_path(root)?;

  let mut files = Vec::new();
  let walker = WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| entry.depth() == 0 || matcher.matches(entry.path(), entry.file_type().is_dir()));

  for entry in walker {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    let path = entry.path().to_path_buf();
    let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
    let modified = entry.metadata()?.modified().at_path(&path)?;
    files.push(SourceFile {
      path,
      relative,
      modified,
    });
  }

  debug!(root = %root.display(), count = files.len(), "resolved source set");
  Ok(files)
}

/// Like [`resolve`], keeping only files with the given extension.
pub fn resolve_ext(root: &Path, matcher: &dyn SourceMatcher, ext: &str) -> Result<Vec<SourceFile>> {
  Ok(resolve(root, matcher)?.into_iter().filter(|f| f.has_extension(ext)).collect())
}
