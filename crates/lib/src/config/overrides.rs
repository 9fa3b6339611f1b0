//! Command-line overrides of the form `config.NAME=VALUE`.

use tracing::debug;

use super::{BuildConfig, ConfigError};
use crate::consts::OVERRIDE_PREFIX;

/// A parsed override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
  pub key: String,
  pub value: String,
}

impl Override {
  /// Parses `config.NAME=VALUE`. The value may be empty and may contain `=`.
  pub fn parse(raw: &str) -> Result<Self, ConfigError> {
    let (name, value) = raw
      .split_once('=')
      .ok_or_else(|| ConfigError::MalformedOverride(raw.to_string()))?;
    let key = name
      .strip_prefix(OVERRIDE_PREFIX)
      .filter(|k| !k.is_empty())
      .ok_or_else(|| ConfigError::MalformedOverride(raw.to_string()))?;
    Ok(Self {
      key: key.to_string(),
      value: value.to_string(),
    })
  }
}

/// Applies every override in order; a later override of the same key wins.
pub fn apply(config: &mut BuildConfig, raw: &[String]) -> Result<(), ConfigError> {
  for raw in raw {
    let o = Override::parse(raw)?;
    debug!(key = %o.key, value = %o.value, "config override");
    config.set_string(&o.key, o.value)?;
  }
  Ok(())
}
