mod build;
mod info;
mod plan;

use std::path::PathBuf;

use anyhow::{Context, Result};

use apkstage_lib::config::{self, BuildConfig, LoadOptions};
use apkstage_lib::platform::paths;

pub use build::cmd_build;
pub use info::cmd_info;
pub use plan::cmd_plan;

/// Global flags that shape the effective configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigArgs {
  pub file: Option<PathBuf>,
  pub release: bool,
  pub overrides: Vec<String>,
}

impl ConfigArgs {
  pub fn config_file(&self) -> PathBuf {
    self.file.clone().unwrap_or_else(paths::config_file)
  }

  /// Loads the config script, applies `-D` overrides and resolves paths against the
  /// current directory.
  pub fn load(&self) -> Result<BuildConfig> {
    let file = self.config_file();
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let options = LoadOptions {
      file: file.clone(),
      release: self.release,
      overrides: self.overrides.clone(),
      cwd,
    };
    config::load(&options).with_context(|| format!("Failed to load config: {}", file.display()))
  }
}
