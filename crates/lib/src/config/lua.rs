//! Evaluation of the `config.lua` script.
//!
//! The script runs in a fresh Lua state with an `apkstage` global describing the
//! host, and must return a table whose keys are a subset of [`super::KEYS`]:
//!
//! ```lua
//! return {
//!   android_version = 25,
//!   jdk_bin_loc = apkstage.os == "win" and "C:\\jdk\\bin" or "",
//!   source_exclude = { "*.orig", "private/" },
//!   targets = {
//!     deploy = { depends = { "android" }, commands = { "adb install -r app.apk" } },
//!   },
//! }
//! ```

use std::path::Path;

use mlua::prelude::*;
use tracing::debug;

use super::{BuildConfig, ConfigError, CustomTarget, KEYS};
use crate::platform::{Os, paths};

/// Evaluates the script at `path` and applies the table it returns.
pub fn apply_file(config: &mut BuildConfig, path: &Path) -> Result<(), ConfigError> {
  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  apply_source(config, &content, path)
}

/// Evaluates `source` as if it were read from `path`.
pub fn apply_source(config: &mut BuildConfig, source: &str, path: &Path) -> Result<(), ConfigError> {
  let lua_err = |source: LuaError| ConfigError::Lua {
    path: path.to_path_buf(),
    source,
  };

  let lua = create_runtime().map_err(lua_err)?;
  let value = lua
    .load(source)
    .set_name(format!("@{}", path.display()))
    .eval::<LuaValue>()
    .map_err(lua_err)?;

  let LuaValue::Table(table) = value else {
    return Err(lua_err(LuaError::external("config must return a table")));
  };

  for pair in table.pairs::<String, LuaValue>() {
    let (key, value) = pair.map_err(lua_err)?;
    apply_key(config, &key, value).map_err(|e| match e {
      KeyError::Config(e) => e,
      KeyError::Lua(e) => lua_err(e),
    })?;
    debug!(key = %key, "applied config key");
  }
  Ok(())
}

/// Creates the Lua state and registers the `apkstage` global.
fn create_runtime() -> LuaResult<Lua> {
  let lua = Lua::new();
  let host = lua.create_table()?;
  host.set("os", Os::current().as_str())?;
  host.set("home", paths::home_dir().to_string_lossy().to_string())?;
  host.set("config_dir", paths::config_dir().to_string_lossy().to_string())?;
  lua.globals().set("apkstage", host)?;
  Ok(lua)
}

enum KeyError {
  Config(ConfigError),
  Lua(LuaError),
}

impl From<ConfigError> for KeyError {
  fn from(e: ConfigError) -> Self {
    KeyError::Config(e)
  }
}

impl From<LuaError> for KeyError {
  fn from(e: LuaError) -> Self {
    KeyError::Lua(e)
  }
}

fn apply_key(config: &mut BuildConfig, key: &str, value: LuaValue) -> Result<(), KeyError> {
  match key {
    "android_version" => {
      let n = integer(key, &value)?;
      config.android_version =
        u32::try_from(n).map_err(|_| ConfigError::invalid(key, format!("{} is not a valid API level", n)))?;
    }
    "timestamp_skew_ms" => {
      let n = integer(key, &value)?;
      config.timestamp_skew_ms =
        u64::try_from(n).map_err(|_| ConfigError::invalid(key, format!("{} is negative", n)))?;
    }
    "source_exclude" => config.source_exclude = string_list(key, value)?,
    "targets" => {
      let LuaValue::Table(table) = value else {
        return Err(ConfigError::invalid(key, "must be a table of targets").into());
      };
      for pair in table.pairs::<String, LuaValue>() {
        let (name, def) = pair?;
        let target = parse_target(&name, def)?;
        config.targets.insert(name, target);
      }
    }
    _ if KEYS.contains(&key) => config.set_string(key, scalar_string(key, &value)?)?,
    _ => return Err(ConfigError::UnknownKey(key.to_string()).into()),
  }
  Ok(())
}

fn parse_target(name: &str, value: LuaValue) -> Result<CustomTarget, KeyError> {
  let LuaValue::Table(table) = value else {
    return Err(ConfigError::invalid(format!("targets.{}", name), "must be a table").into());
  };

  let mut target = CustomTarget::default();
  for pair in table.pairs::<String, LuaValue>() {
    let (field, value) = pair?;
    let key = format!("targets.{}.{}", name, field);
    match field.as_str() {
      "commands" => target.commands = string_list(&key, value)?,
      "depends" => target.depends = string_list(&key, value)?,
      _ => return Err(ConfigError::UnknownKey(key).into()),
    }
  }
  Ok(target)
}

fn integer(key: &str, value: &LuaValue) -> Result<i64, ConfigError> {
  match value {
    LuaValue::Integer(n) => Ok(*n),
    LuaValue::Number(f) if f.fract() == 0.0 => Ok(*f as i64),
    other => Err(ConfigError::invalid(
      key,
      format!("expected an integer, got {}", other.type_name()),
    )),
  }
}

/// Accepts strings and numbers (so that `jdk_version = 1.8` reads as "1.8").
fn scalar_string(key: &str, value: &LuaValue) -> Result<String, KeyError> {
  match value {
    LuaValue::String(s) => Ok(s.to_str()?.to_string()),
    LuaValue::Integer(n) => Ok(n.to_string()),
    LuaValue::Number(f) => Ok(f.to_string()),
    other => Err(
      ConfigError::invalid(key, format!("expected a string, got {}", other.type_name())).into(),
    ),
  }
}

/// A single string, or a sequence of them.
fn string_list(key: &str, value: LuaValue) -> Result<Vec<String>, KeyError> {
  match value {
    LuaValue::String(s) => Ok(vec![s.to_str()?.to_string()]),
    LuaValue::Table(table) => {
      let mut items = Vec::new();
      for item in table.sequence_values::<LuaValue>() {
        items.push(scalar_string(key, &item?)?);
      }
      Ok(items)
    }
    other => Err(
      ConfigError::invalid(key, format!("expected a list of strings, got {}", other.type_name())).into(),
    ),
  }
}
