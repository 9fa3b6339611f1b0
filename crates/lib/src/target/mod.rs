//! Build targets and their dependency order.
//!
//! Standard targets:
//!
//! | target    | does                                                  |
//! |-----------|-------------------------------------------------------|
//! | `clean`   | deletes the intermediate build tree and the product   |
//! | `source`  | copies the filtered source tree into the product      |
//! | `android` | builds `app.apk` (see [`android`])                    |
//! | `javadoc` | generates the API documentation                       |
//! | `whole`   | `source`, `android`, `javadoc` (the default)          |
//! | `release` | the same, meant for use with the release config       |
//!
//! Any other name is looked up among the `targets` of the user config.

pub mod android;
pub mod clean;
pub mod custom;
pub mod javadoc;
pub mod manifest;
pub mod source;

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::{BuildConfig, CustomTarget};
use crate::context::{BuildContext, BuildEvent};
use crate::error::{BuildError, Result};
use crate::stage::Sequencer;

/// Names of the built-in targets.
pub const STANDARD: &[&str] = &["android", "clean", "javadoc", "release", "source", "whole"];

const COMPOSITE_PARTS: &[&str] = &["source", "android", "javadoc"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  Clean,
  Source,
  Android,
  Javadoc,
  Whole,
  Release,
  Custom(CustomTarget),
}

impl Target {
  /// Resolves a target name; built-in names take precedence over user targets.
  pub fn lookup(name: &str, config: &BuildConfig) -> Result<Self> {
    let target = match name {
      "clean" => Target::Clean,
      "source" => Target::Source,
      "android" => Target::Android,
      "javadoc" => Target::Javadoc,
      "whole" => Target::Whole,
      "release" => Target::Release,
      _ => match config.targets.get(name) {
        Some(custom) => Target::Custom(custom.clone()),
        None => return Err(BuildError::UnknownTarget(name.to_string())),
      },
    };
    Ok(target)
  }

  /// Targets to build, in order, before this one's own work.
  pub fn dependencies(&self) -> Vec<String> {
    match self {
      Target::Whole | Target::Release => COMPOSITE_PARTS.iter().map(|s| s.to_string()).collect(),
      Target::Custom(custom) => custom.depends.clone(),
      _ => Vec::new(),
    }
  }

  /// This target's own stages, or `None` for a pure composite.
  fn pipeline(&self, ctx: &BuildContext) -> Option<Sequencer> {
    match self {
      Target::Clean => Some(clean::pipeline(ctx)),
      Target::Source => Some(source::pipeline(ctx)),
      Target::Android => Some(android::pipeline(ctx)),
      Target::Javadoc => Some(javadoc::pipeline(ctx)),
      Target::Custom(custom) if !custom.commands.is_empty() => Some(custom::pipeline(custom)),
      _ => None,
    }
  }
}

/// Builds targets in order, each at most once, dependencies first.
#[derive(Debug, Default)]
pub struct Builder {
  built: BTreeSet<String>,
  stack: Vec<String>,
  changed: bool,
}

impl Builder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Whether any stage of any target built so far did work.
  pub fn changed(&self) -> bool {
    self.changed
  }

  pub fn build(&mut self, ctx: &mut BuildContext, name: &str) -> Result<()> {
    if self.stack.iter().any(|n| n == name) {
      let mut chain = self.stack.clone();
      chain.push(name.to_string());
      return Err(BuildError::TargetCycle(chain.join(" -> ")));
    }
    if self.built.contains(name) {
      debug!(target = name, "already built");
      return Ok(());
    }

    let target = Target::lookup(name, &ctx.config)?;
    let start = Instant::now();
    let depth = ctx.depth();
    ctx.report(&BuildEvent::TargetStarted { name, depth });
    info!(target = name, "building");

    self.stack.push(name.to_string());
    ctx.enter();
    let result = self.build_target(ctx, &target);
    ctx.leave();
    self.stack.pop();
    result?;

    self.built.insert(name.to_string());
    ctx.report(&BuildEvent::TargetFinished {
      name,
      depth,
      elapsed: start.elapsed(),
    });
    Ok(())
  }

  fn build_target(&mut self, ctx: &mut BuildContext, target: &Target) -> Result<()> {
    for dependency in target.dependencies() {
      self.build(ctx, &dependency)?;
    }
    if let Some(mut pipeline) = target.pipeline(ctx) {
      self.changed |= pipeline.run(ctx)?;
    }
    Ok(())
  }
}

/// Builds each named target in turn. Returns whether anything was regenerated.
pub fn build_targets(ctx: &mut BuildContext, names: &[String]) -> Result<bool> {
  let mut builder = Builder::new();
  for name in names {
    builder.build(ctx, name)?;
  }
  Ok(builder.changed())
}
