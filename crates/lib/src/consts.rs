/// Name used for the config, temp and product directories.
pub const APP_NAME: &str = "apkstage";

/// File name of the user configuration script inside the config directory.
pub const CONFIG_FILENAME: &str = "config.lua";

/// Reserved prefix for `-D` configuration overrides.
pub const OVERRIDE_PREFIX: &str = "config.";

/// Target built when none is named on the command line.
pub const DEFAULT_TARGET: &str = "whole";

/// Name of the command log inside the temp directory.
pub const LOG_FILENAME: &str = "log";

/// Subdirectory of the temp directory holding intermediate build output.
pub const BUILD_SUBDIR: &str = "build";
