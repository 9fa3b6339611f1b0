//! Error types for build orchestration.
//!
//! Every kind here is fatal: nothing is retried, and the CLI reports the message
//! and exits with a nonzero status.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T, E = BuildError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BuildError {
  /// A configuration value is absent or invalid.
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// An external tool could not be smoke tested.
  #[error("{detail}\nDoes your config.lua correctly set {key}?{extra}")]
  ToolUnavailable {
    key: &'static str,
    detail: String,
    extra: String,
  },

  /// A required SDK or JDK file is absent.
  #[error("Missing {what}: {}\nDoes your config.lua correctly set {hint}?", path.display())]
  MissingDependency {
    what: &'static str,
    path: PathBuf,
    hint: &'static str,
  },

  /// A toolchain command exited nonzero. `stderr` is the tool's own output, verbatim.
  #[error("{stderr}\n(command failed with exit code {code:?}: {command})")]
  ToolFailed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },

  /// A source line that the assert rewriter cannot parse.
  #[error("{}( {line} )\n  Unrecognized pattern of assert statement:\n{text}", file.display())]
  UnrecognizedPattern { file: PathBuf, line: usize, text: String },

  /// The manifest template has no root `<manifest>` element to complete.
  #[error("{}: no <manifest> element found in template", path.display())]
  ManifestTemplate { path: PathBuf },

  /// Target name that is neither standard nor defined in the user config.
  #[error("unknown target: {0}\nDefine it under `targets` in your config.lua, or check the spelling")]
  UnknownTarget(String),

  /// A target that (directly or through its dependencies) requires itself.
  #[error("target {0} depends on itself")]
  TargetCycle(String),

  #[error("io error at {}: {source}", path.display())]
  Path {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("io error: {0}")]
  Io(#[from] io::Error),

  #[error("failed to walk directory: {0}")]
  Walk(#[from] walkdir::Error),
}

impl BuildError {
  /// Wraps an I/O error with the path it concerns.
  pub fn at(path: impl Into<PathBuf>, source: io::Error) -> Self {
    BuildError::Path {
      path: path.into(),
      source,
    }
  }
}

/// Attaches a path to I/O results, in the manner of `anyhow::Context`.
pub trait PathContext<T> {
  fn at_path(self, path: &std::path::Path) -> Result<T>;
}

impl<T> PathContext<T> for io::Result<T> {
  fn at_path(self, path: &std::path::Path) -> Result<T> {
    self.map_err(|e| BuildError::at(path, e))
  }
}
