//! Dependency diffs: which units of a stage's input must be regenerated.
//!
//! Diffs are recomputed from the filesystem on every invocation and never persisted.
//! All staleness tests go through [`crate::timestamp`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{PathContext, Result};
use crate::source::SourceFile;
use crate::timestamp;

/// True for `Name.class`, false for nested classes such as `Outer$Inner.class`.
pub fn is_top_class(name: &str) -> bool {
  name
    .strip_suffix(".class")
    .is_some_and(|stem| !stem.is_empty() && !stem.contains('$'))
}

/// Maps source paths to the output each one produces, both relative to their roots.
pub trait NamingRule {
  /// The output produced from `source`, or `None` if it is not a compilation unit.
  fn output_for(&self, source: &Path) -> Option<PathBuf>;

  /// The source that would have produced `output`, or `None` if `output` is not
  /// an independent unit.
  fn source_for(&self, output: &Path) -> Option<PathBuf>;
}

/// `a/One.java` compiles to `a/One.class`. `package-info.java` produces no unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaClassRule;

impl NamingRule for JavaClassRule {
  fn output_for(&self, source: &Path) -> Option<PathBuf> {
    let name = source.file_name()?.to_str()?;
    let stem = name.strip_suffix(".java")?;
    if stem.is_empty() || name.starts_with("package-") {
      return None;
    }
    Some(source.with_file_name(format!("{}.class", stem)))
  }

  fn source_for(&self, output: &Path) -> Option<PathBuf> {
    let name = output.file_name()?.to_str()?;
    if !is_top_class(name) {
      return None;
    }
    let stem = name.strip_suffix(".class")?;
    Some(output.with_file_name(format!("{}.java", stem)))
  }
}

/// Result of diffing a source set against its outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceDiff {
  /// Sources whose output is missing or older than the source.
  pub to_regenerate: Vec<SourceFile>,
  /// Sources whose translated copy is missing or older than the source.
  pub to_retranslate: Vec<SourceFile>,
  /// Units whose output is current.
  pub unchanged: usize,
  /// Outputs with no source any more. Reported only; nothing deletes them.
  pub orphaned: usize,
}

impl SourceDiff {
  /// True when nothing needs compiling. Translation alone never triggers a stage.
  pub fn is_empty(&self) -> bool {
    self.to_regenerate.is_empty()
  }
}

/// Diffs `candidates` against their outputs under `output_dir`.
///
/// When `translated_dir` is given, each unit is also compared against its
/// translated copy at the same relative path.
pub fn diff_sources(
  candidates: &[SourceFile],
  output_dir: &Path,
  rule: &dyn NamingRule,
  translated_dir: Option<&Path>,
) -> Result<SourceDiff> {
  let mut diff = SourceDiff::default();
  let mut expected = HashSet::new();

  for source in candidates {
    let Some(output) = rule.output_for(&source.relative) else {
      continue;
    };
    let top_level = output
      .file_name()
      .and_then(|n| n.to_str())
      .is_some_and(is_top_class);
    if !top_level {
      continue;
    }

    let output_path = output_dir.join(&output);
    if timestamp::is_stale_path(source.modified, &output_path).at_path(&output_path)? {
      diff.to_regenerate.push(source.clone());
    } else {
      diff.unchanged += 1;
    }

    if let Some(translated_dir) = translated_dir {
      let copy = translated_dir.join(&source.relative);
      if timestamp::is_stale_path(source.modified, &copy).at_path(&copy)? {
        diff.to_retranslate.push(source.clone());
      }
    }

    expected.insert(output);
  }

  diff.orphaned = count_orphans(output_dir, rule, &expected)?;

  debug!(
    output_dir = %output_dir.display(),
    regenerate = diff.to_regenerate.len(),
    retranslate = diff.to_retranslate.len(),
    unchanged = diff.unchanged,
    orphaned = diff.orphaned,
    "computed source diff"
  );
  Ok(diff)
}

fn count_orphans(output_dir: &Path, rule: &dyn NamingRule, expected: &HashSet<PathBuf>) -> Result<usize> {
  if !output_dir.is_dir() {
    return Ok(0);
  }

  let mut orphaned = 0;
  for entry in WalkDir::new(output_dir) {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    let relative = entry.path().strip_prefix(output_dir).unwrap_or(entry.path());
    if rule.source_for(relative).is_some() && !expected.contains(relative) {
      orphaned += 1;
    }
  }
  Ok(orphaned)
}

/// Class files produced since the previous bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleDiff {
  /// Every class file (nested ones included), relative to the class directory.
  pub inputs: Vec<PathBuf>,
  /// How many of `inputs` are top-level classes.
  pub top_level: usize,
}

impl BundleDiff {
  pub fn is_empty(&self) -> bool {
    self.inputs.is_empty()
  }
}

/// Collects the class files under `dir` modified at or after `threshold`.
pub fn compiled_since(dir: &Path, threshold: SystemTime) -> Result<BundleDiff> {
  let mut diff = BundleDiff::default();
  if !dir.is_dir() {
    return Ok(diff);
  }

  for entry in WalkDir::new(dir).sort_by_file_name() {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }
    let name = entry.file_name().to_string_lossy();
    if !name.ends_with(".class") {
      continue;
    }
    let modified = entry.metadata()?.modified().at_path(entry.path())?;
    if modified < threshold {
      continue;
    }
    if is_top_class(&name) {
      diff.top_level += 1;
    }
    let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
    diff.inputs.push(relative.to_path_buf());
  }
  Ok(diff)
}

/// Counts top-level class files under `dir` modified at or after `since`.
pub fn count_compiled(dir: &Path, since: SystemTime) -> Result<usize> {
  Ok(compiled_since(dir, since)?.top_level)
}
