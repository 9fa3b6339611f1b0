//! The append-only command log.
//!
//! Each entry is the command line, an underline of `^`, the exit value, and the
//! captured output and error streams. The log is diagnostic only and is never read
//! back by the build.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{PathContext, Result};
use crate::tool::{ToolCommand, ToolOutput};

/// Longest underline written beneath a command.
const MAX_UNDERLINE: usize = 90;

#[derive(Debug, Clone)]
pub struct CommandLog {
  path: PathBuf,
}

impl CommandLog {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Appends one entry. `output` is `None` when the command could not be started.
  pub fn append(&self, command: &ToolCommand, output: Option<&ToolOutput>) -> Result<()> {
    if let Some(parent) = self.path.parent() {
      crate::util::fs::ensure_dir(parent)?;
    }
    let mut file = OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .at_path(&self.path)?;
    file
      .write_all(format_entry(command, output).as_bytes())
      .at_path(&self.path)
  }
}

fn format_entry(command: &ToolCommand, output: Option<&ToolOutput>) -> String {
  let line = command.to_string();
  let underline = "^".repeat(line.chars().count().min(MAX_UNDERLINE));
  let mut entry = format!("{}\n{}\n", line, underline);

  let Some(output) = output else {
    entry.push_str("    Exit value = (not started)\n\n");
    return entry;
  };

  let code = output.code.map_or_else(|| "(signal)".to_string(), |c| c.to_string());
  entry.push_str(&format!("    Exit value = {}\n\n", code));
  for (label, text) in [("Out", &output.stdout), ("Err", &output.stderr)] {
    if text.is_empty() {
      continue;
    }
    entry.push_str(&format!("    {}:\n    ---\n{}\n", label, text));
    if !text.ends_with('\n') {
      entry.push('\n');
    }
  }
  entry
}
