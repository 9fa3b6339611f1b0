//! Implementation of the `apkstage build` command.

use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use apkstage_lib::BuildContext;
use apkstage_lib::context::Layout;
use apkstage_lib::target;

use crate::cmd::ConfigArgs;
use crate::output::{ProgressReporter, format_duration, print_info, print_success};

/// Builds each target in order, printing progress as stages finish.
///
/// A failing stage aborts the whole run; its command and output are in the log
/// under the temp directory.
pub fn cmd_build(args: &ConfigArgs, targets: &[String]) -> Result<()> {
  let config = args.load()?;
  let layout = Layout::standard();
  info!(log = %layout.log.display(), product = %config.product_loc.display(), "starting build");

  let mut ctx = BuildContext::new(config, layout)
    .context("Failed to set up build")?
    .with_reporter(ProgressReporter);

  let start = Instant::now();
  let changed = target::build_targets(&mut ctx, targets)
    .with_context(|| format!("Build failed (see {})", ctx.layout.log.display()))?;

  if changed {
    print_success(&format!("Done in {}", format_duration(start.elapsed())));
  } else {
    print_info("Everything up to date");
  }
  Ok(())
}
