//! The JDK and Android SDK toolchain.
//!
//! A tool is smoke tested the first time it is needed, once per configuration key
//! that locates it. A failed smoke test names the key the user should check. SDK
//! files are checked for existence once and cached.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::BuildConfig;
use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::platform::Os;
use crate::tool::{ToolCommand, locate};

/// Matches aapt's summary line; group 1 is the number of generated files.
pub static AAPT_COUNT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)^Generated (\d+) file").expect("aapt pattern is valid"));

/// Matches once per top-level class in dx's verbose output.
pub static DEXED_TOP_CLASS: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?m)^processing [^$\n]+\.class\.*$").expect("dx pattern is valid"));

/// Number of files aapt reports having generated, if it says.
pub fn aapt_count(stdout: &str) -> Option<usize> {
  AAPT_COUNT.captures(stdout)?.get(1)?.as_str().parse().ok()
}

/// Number of top-level classes dx reports having processed.
pub fn dexed_count(stdout: &str) -> usize {
  // `$` before a `\r` would otherwise fail on CRLF output
  DEXED_TOP_CLASS.find_iter(&stdout.replace("\r\n", "\n")).count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tool {
  Java,
  Javac,
  Javadoc,
  Aapt,
  Dx,
  Zipalign,
}

impl Tool {
  pub fn name(self) -> &'static str {
    match self {
      Tool::Java => "java",
      Tool::Javac => "javac",
      Tool::Javadoc => "javadoc",
      Tool::Aapt => "aapt",
      Tool::Dx => "dx",
      Tool::Zipalign => "zipalign",
    }
  }

  /// Config keys that a successful smoke test of this tool vouches for.
  pub fn config_keys(self) -> &'static [&'static str] {
    match self {
      Tool::Java | Tool::Javadoc => &["jdk_bin_loc"],
      Tool::Javac => &["jdk_bin_loc", "jdk_version"],
      Tool::Aapt | Tool::Dx | Tool::Zipalign => &["android_build_tools_loc"],
    }
  }

  pub fn program(self, config: &BuildConfig) -> PathBuf {
    match self {
      Tool::Java | Tool::Javac | Tool::Javadoc => locate(&config.jdk_bin_loc, self.name()),
      Tool::Dx => locate(&config.android_build_tools_loc, &Os::current().script_name("dx")),
      Tool::Aapt | Tool::Zipalign => locate(&config.android_build_tools_loc, self.name()),
    }
  }

  /// The harmless invocation used as a smoke test.
  pub fn smoke_test(self, config: &BuildConfig) -> ToolCommand {
    let command = ToolCommand::new(self.program(config));
    match self {
      Tool::Java => command.arg("-version"),
      Tool::Javac => command.args(["-target", config.jdk_version.as_str(), "-version"]),
      Tool::Javadoc => command.arg("-help"),
      Tool::Aapt => command.arg("version"),
      Tool::Dx => command.arg("--version"),
      Tool::Zipalign => command,
    }
  }

  /// Whether a nonzero exit fails the smoke test. Only javac's test is meaningful
  /// beyond "the program starts": an older javac rejects `-target`.
  fn exit_matters(self) -> bool {
    matches!(self, Tool::Javac)
  }
}

impl BuildContext {
  /// Returns the program for `tool`, smoke testing it first if the config keys
  /// locating it are yet untested.
  pub fn tool(&mut self, tool: Tool) -> Result<PathBuf> {
    let keys = tool.config_keys();
    if keys.iter().all(|k| self.tested.contains(k)) {
      return Ok(tool.program(&self.config));
    }

    let test = tool.smoke_test(&self.config);
    let failure = match self.spawn(&test)? {
      Ok(output) if output.success() || !tool.exit_matters() => None,
      Ok(output) => Some(output.stderr.trim_end().to_string()),
      Err(e) => Some(format!("cannot run {}: {}", test, e)),
    };

    if let Some(detail) = failure {
      let extra = if tool == Tool::Javac {
        format!("  Is your JDK version {} or later?", self.config.jdk_version)
      } else {
        String::new()
      };
      return Err(BuildError::ToolUnavailable {
        key: keys[0],
        detail,
        extra,
      });
    }

    debug!(tool = tool.name(), "smoke test passed");
    self.tested.extend(keys.iter().copied());
    Ok(tool.program(&self.config))
  }

  /// The platform's bootclass jar, `platforms/android-N/android.jar`.
  pub fn android_jar(&mut self) -> Result<PathBuf> {
    let path = self
      .config
      .android_sdk_loc
      .join("platforms")
      .join(format!("android-{}", self.config.android_version))
      .join("android.jar");
    self.checked_file("android.jar", path, "android_sdk_loc and android_version")
  }

  /// The SDK library holding the APK builder, `tools/lib/sdklib.jar`.
  pub fn sdklib_jar(&mut self) -> Result<PathBuf> {
    let path = self
      .config
      .android_sdk_loc
      .join("tools")
      .join("lib")
      .join("sdklib.jar");
    self.checked_file("sdklib.jar", path, "android_sdk_loc")
  }

  fn checked_file(&mut self, name: &'static str, path: PathBuf, hint: &'static str) -> Result<PathBuf> {
    if let Some(path) = self.checked_files.get(name) {
      return Ok(path.clone());
    }
    if !path.is_file() {
      return Err(BuildError::MissingDependency {
        what: "SDK file",
        path,
        hint,
      });
    }
    self.checked_files.insert(name, path.clone());
    Ok(path)
  }
}
