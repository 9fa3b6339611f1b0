//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the project, the config
/// directory and the OS temp directory the build log and intermediates go to.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let env = Self { temp };
    std::fs::create_dir_all(env.project_path()).unwrap();
    env
  }

  fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  /// The project directory; commands run here.
  pub fn project_path(&self) -> PathBuf {
    self.root().join("myapp")
  }

  /// The per-user config directory apkstage reads `config.lua` from.
  pub fn config_dir(&self) -> PathBuf {
    self.root().join("config").join("apkstage")
  }

  pub fn tmp_path(&self) -> PathBuf {
    self.root().join("tmp")
  }

  pub fn log_path(&self) -> PathBuf {
    self.tmp_path().join("apkstage").join("log")
  }

  /// Writes the user config script.
  pub fn write_config(&self, content: &str) {
    std::fs::create_dir_all(self.config_dir()).unwrap();
    std::fs::write(self.config_dir().join("config.lua"), content).unwrap();
  }

  /// Write a file relative to the project directory, dated an hour ago.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.project_path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
    std::fs::File::options()
      .write(true)
      .open(&path)
      .unwrap()
      .set_modified(an_hour_ago)
      .unwrap();
    path
  }

  pub fn exists(&self, relative_path: &str) -> bool {
    self.project_path().join(relative_path).exists()
  }

  /// Get a pre-configured Command for the apkstage binary.
  ///
  /// Sets environment variables for isolated testing:
  /// - `XDG_CONFIG_HOME` / `LOCALAPPDATA`: isolated config directory
  /// - `HOME`: the temp directory
  /// - `TMPDIR` / `TMP` / `TEMP`: isolated log and build directory
  /// - `ANDROID_HOME`: an SDK location that does not exist
  pub fn apkstage_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("apkstage");
    cmd.current_dir(self.project_path());
    cmd.env("XDG_CONFIG_HOME", self.root().join("config"));
    cmd.env("LOCALAPPDATA", self.root().join("config"));
    cmd.env("HOME", self.root());
    cmd.env("TMPDIR", self.tmp_path());
    cmd.env("TMP", self.tmp_path());
    cmd.env("TEMP", self.tmp_path());
    cmd.env("ANDROID_HOME", self.root().join("no-sdk"));
    cmd.env_remove("RUST_LOG");
    cmd
  }
}

pub fn file_text(path: &Path) -> String {
  std::fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}
