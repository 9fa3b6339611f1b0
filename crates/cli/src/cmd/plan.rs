//! Implementation of the `apkstage plan` command.
//!
//! Diffs the Java sources against the compiled classes and their translated copies
//! without running any tool.

use anyhow::{Context, Result};

use apkstage_lib::BuildContext;
use apkstage_lib::context::Layout;
use apkstage_lib::target::android::{AndroidPaths, source_diff};

use crate::cmd::ConfigArgs;
use crate::output::{OutputFormat, print_info, print_json, print_stat, print_warning, symbols};

pub fn cmd_plan(args: &ConfigArgs, output: OutputFormat) -> Result<()> {
  let config = args.load()?;
  let ctx = BuildContext::new(config, Layout::standard()).context("Failed to set up build")?;
  let paths = AndroidPaths::new(&ctx);
  let diff = source_diff(&ctx, &paths).context("Failed to diff sources")?;

  if output.is_json() {
    return print_json(&diff);
  }

  if diff.is_empty() {
    print_info("Nothing to compile");
  } else {
    println!("To compile:");
    for file in &diff.to_regenerate {
      println!("  {} {}", symbols::INFO, file.relative.display());
    }
  }
  println!();
  print_stat("Compile", &diff.to_regenerate.len().to_string());
  print_stat("Translate", &diff.to_retranslate.len().to_string());
  print_stat("Unchanged", &diff.unchanged.to_string());

  if diff.orphaned > 0 {
    print_warning(&format!(
      "{} compiled class(es) have no source; run 'apkstage build clean' to remove them",
      diff.orphaned
    ));
  }
  Ok(())
}
