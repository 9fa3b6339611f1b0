//! Typed build configuration.
//!
//! A [`BuildConfig`] starts from built-in defaults (or the release defaults), is
//! amended by the user's `config.lua` (see [`lua`]), then by `-D config.NAME=VALUE`
//! overrides (see [`overrides`]), and is finally resolved against the working
//! directory. It is immutable afterwards.

pub mod lua;
pub mod overrides;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::platform::Os;
use crate::timestamp::Skew;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid value for {key}: {message}")]
  Invalid { key: String, message: String },

  #[error("unknown configuration key: {0}")]
  UnknownKey(String),

  #[error("malformed override '{0}': expected config.NAME=VALUE")]
  MalformedOverride(String),

  #[error("cannot override {0}: only string-valued settings accept -D overrides")]
  NotOverridable(String),

  #[error("failed to evaluate {}: {source}", path.display())]
  Lua {
    path: PathBuf,
    #[source]
    source: mlua::Error,
  },

  #[error("cannot read {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl ConfigError {
  pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
    ConfigError::Invalid {
      key: key.into(),
      message: message.into(),
    }
  }
}

/// How `assert` statements are rewritten before compiling for Android.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertTranslation {
  /// Rewrite each assert to an `if` that throws, keeping assertions enabled.
  #[default]
  If,
  /// Rewrite each assert to an empty statement.
  Empty,
}

impl AssertTranslation {
  pub fn as_str(&self) -> &'static str {
    match self {
      AssertTranslation::If => "if",
      AssertTranslation::Empty => "empty",
    }
  }
}

impl FromStr for AssertTranslation {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "if" => Ok(AssertTranslation::If),
      "empty" => Ok(AssertTranslation::Empty),
      other => Err(ConfigError::invalid(
        "android_assert_translation",
        format!("expected \"if\" or \"empty\", got \"{}\"", other),
      )),
    }
  }
}

/// A target defined in the user's config: shell commands run after its dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomTarget {
  pub commands: Vec<String>,
  pub depends: Vec<String>,
}

/// Every key accepted in `config.lua`.
pub const KEYS: &[&str] = &[
  "android_assert_translation",
  "android_build_tools_loc",
  "android_package",
  "android_sdk_loc",
  "android_version",
  "app_package_name",
  "jdk_bin_loc",
  "jdk_version",
  "java_target",
  "product_loc",
  "project_loc",
  "source_dir",
  "source_exclude",
  "targets",
  "timestamp_skew_ms",
  "version",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildConfig {
  pub android_assert_translation: AssertTranslation,
  /// Empty means: find the tools on the PATH.
  pub android_build_tools_loc: PathBuf,
  pub android_package: String,
  pub android_sdk_loc: PathBuf,
  pub android_version: u32,
  pub app_package_name: String,
  /// Empty means: find the tools on the PATH.
  pub jdk_bin_loc: PathBuf,
  pub jdk_version: String,
  pub java_target: String,
  /// Empty until [`BuildConfig::resolve`] derives `<project>-<version>`.
  pub product_loc: PathBuf,
  pub project_loc: PathBuf,
  pub source_dir: String,
  pub source_exclude: Vec<String>,
  pub targets: BTreeMap<String, CustomTarget>,
  pub timestamp_skew_ms: u64,
  pub version: String,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      android_assert_translation: AssertTranslation::If,
      android_build_tools_loc: PathBuf::new(),
      android_package: "app.android".to_string(),
      android_sdk_loc: default_sdk_loc(),
      android_version: 24,
      app_package_name: "com.example.app".to_string(),
      jdk_bin_loc: PathBuf::new(),
      jdk_version: "1.8".to_string(),
      java_target: "1.7".to_string(),
      product_loc: PathBuf::new(),
      project_loc: PathBuf::new(),
      source_dir: "src".to_string(),
      source_exclude: Vec::new(),
      targets: BTreeMap::new(),
      timestamp_skew_ms: 1,
      version: "0.0".to_string(),
    }
  }
}

/// Where the Android SDK lives when `ANDROID_HOME` is unset.
fn default_sdk_loc() -> PathBuf {
  if let Some(home) = std::env::var_os("ANDROID_HOME").filter(|v| !v.is_empty()) {
    return PathBuf::from(home);
  }
  match Os::current() {
    Os::MacOs => PathBuf::from("/usr/local/Cellar/android-sdk"),
    Os::Windows => crate::platform::paths::home_dir()
      .join("AppData")
      .join("Local")
      .join("Android")
      .join("android-sdk"),
    Os::Linux => PathBuf::from("/opt/android-sdk"),
  }
}

impl BuildConfig {
  /// Defaults for a release build: assertions compiled out.
  pub fn release() -> Self {
    Self {
      android_assert_translation: AssertTranslation::Empty,
      ..Self::default()
    }
  }

  /// Assigns a string-valued setting by name.
  ///
  /// Errors with [`ConfigError::UnknownKey`] for names outside [`KEYS`] and
  /// [`ConfigError::NotOverridable`] for settings of another type.
  pub fn set_string(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
    match key {
      "android_assert_translation" => self.android_assert_translation = value.parse()?,
      "android_build_tools_loc" => self.android_build_tools_loc = PathBuf::from(value),
      "android_package" => self.android_package = value,
      "android_sdk_loc" => self.android_sdk_loc = PathBuf::from(value),
      "app_package_name" => self.app_package_name = value,
      "jdk_bin_loc" => self.jdk_bin_loc = PathBuf::from(value),
      "jdk_version" => self.jdk_version = value,
      "java_target" => self.java_target = value,
      "product_loc" => self.product_loc = PathBuf::from(value),
      "project_loc" => self.project_loc = PathBuf::from(value),
      "source_dir" => self.source_dir = value,
      "version" => self.version = value,
      other if KEYS.contains(&other) => return Err(ConfigError::NotOverridable(other.to_string())),
      other => return Err(ConfigError::UnknownKey(other.to_string())),
    }
    Ok(())
  }

  /// Makes `project_loc` absolute and derives `product_loc` if unset.
  pub fn resolve(mut self, cwd: &Path) -> Result<Self, ConfigError> {
    if self.source_dir.is_empty() {
      return Err(ConfigError::invalid("source_dir", "must not be empty"));
    }
    if self.timestamp_skew_ms == 0 {
      return Err(ConfigError::invalid("timestamp_skew_ms", "must be positive"));
    }

    self.project_loc = absolutize(cwd, &self.project_loc);
    if self.product_loc.as_os_str().is_empty() {
      let name = self
        .project_loc
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("app");
      self.product_loc = PathBuf::from(format!("{}-{}", name, self.version));
    }
    self.product_loc = absolutize(&self.project_loc, &self.product_loc);
    Ok(self)
  }

  /// Root of the source tree.
  pub fn source_root(&self) -> PathBuf {
    self.project_loc.join(&self.source_dir)
  }

  pub fn skew(&self) -> Skew {
    Skew::from_millis(self.timestamp_skew_ms)
  }

  /// The Java package holding the manifest template, as a relative directory.
  pub fn android_package_dir(&self) -> PathBuf {
    self.android_package.split('.').collect()
  }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
  let joined = if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  };
  dunce::simplified(&joined).to_path_buf()
}

/// Everything needed to produce the effective configuration for one run.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
  /// Path of the config script; a missing file means defaults.
  pub file: PathBuf,
  pub release: bool,
  /// Raw `config.NAME=VALUE` strings from the command line.
  pub overrides: Vec<String>,
  pub cwd: PathBuf,
}

/// Loads, overrides and resolves the configuration.
pub fn load(options: &LoadOptions) -> Result<BuildConfig, ConfigError> {
  let mut config = if options.release {
    BuildConfig::release()
  } else {
    BuildConfig::default()
  };

  if options.file.is_file() {
    lua::apply_file(&mut config, &options.file)?;
  } else {
    tracing::debug!(path = %options.file.display(), "no config file, using defaults");
  }

  overrides::apply(&mut config, &options.overrides)?;
  config.resolve(&options.cwd)
}
