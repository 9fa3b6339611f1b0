use std::path::PathBuf;

use crate::consts::{APP_NAME, BUILD_SUBDIR, CONFIG_FILENAME, LOG_FILENAME};

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var_os("USERPROFILE").map(PathBuf::from).unwrap_or_default()
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default()
}

/// Returns the directory for configuration files for the application
#[cfg(windows)]
pub fn config_dir() -> PathBuf {
  std::env::var_os("LOCALAPPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|| home_dir().join("AppData").join("Local"))
    .join(APP_NAME)
}

/// Returns the directory for configuration files for the application
#[cfg(target_os = "macos")]
pub fn config_dir() -> PathBuf {
  home_dir().join("Library").join("Application Support").join(APP_NAME)
}

/// Returns the directory for configuration files for the application
#[cfg(not(any(windows, target_os = "macos")))]
pub fn config_dir() -> PathBuf {
  let config_home = std::env::var("XDG_CONFIG_HOME")
    .ok()
    .filter(|v| !v.is_empty())
    .map(PathBuf::from)
    .unwrap_or_else(|| home_dir().join(".config"));
  config_home.join(APP_NAME)
}

/// Returns the path of the user configuration script
pub fn config_file() -> PathBuf {
  config_dir().join(CONFIG_FILENAME)
}

/// Returns the directory for expendable output of this tool (OS temp dir + app name).
///
/// Holds the command log and, under `build/`, every intermediate stage artifact.
pub fn tmp_dir() -> PathBuf {
  std::env::temp_dir().join(APP_NAME)
}

/// Returns the directory for intermediate build output.
pub fn build_tmp_dir() -> PathBuf {
  tmp_dir().join(BUILD_SUBDIR)
}

/// Returns the path of the append-only command log.
pub fn log_file() -> PathBuf {
  tmp_dir().join(LOG_FILENAME)
}
