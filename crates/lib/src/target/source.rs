//! The `source` target: an incremental copy of the filtered source tree into the
//! product directory.

use std::path::PathBuf;

use crate::context::BuildContext;
use crate::error::{PathContext, Result};
use crate::source::{self, SourceFile};
use crate::stage::{Sequencer, Stage, StagePlan};
use crate::timestamp;
use crate::util::fs::{copy_preserving_mtime, create_dir_if_absent, ensure_dir};

pub struct CopySources {
  from: PathBuf,
  to: PathBuf,
  pending: Vec<SourceFile>,
}

impl CopySources {
  pub fn new(from: PathBuf, to: PathBuf) -> Self {
    Self {
      from,
      to,
      pending: Vec::new(),
    }
  }
}

impl Stage for CopySources {
  fn name(&self) -> &str {
    "copy"
  }

  fn plan(&mut self, ctx: &mut BuildContext, _upstream_changed: bool) -> Result<StagePlan> {
    self.pending.clear();
    for file in source::resolve(&self.from, ctx.matcher())? {
      let dest = self.to.join(&file.relative);
      if timestamp::is_stale_path(file.modified, &dest).at_path(&dest)? {
        self.pending.push(file);
      }
    }
    Ok(match self.pending.len() {
      0 => StagePlan::Skip,
      units => StagePlan::Run { units },
    })
  }

  /// Returns the number of files copied plus directories created.
  fn execute(&mut self, _ctx: &mut BuildContext) -> Result<usize> {
    ensure_dir(&self.to)?;
    let mut count = 0;
    for file in std::mem::take(&mut self.pending) {
      let dest = self.to.join(&file.relative);
      if let Some(parent) = dest.parent() {
        count += create_missing_dirs(&self.to, parent)?;
      }
      copy_preserving_mtime(&file.path, &dest)?;
      count += 1;
    }
    Ok(count)
  }
}

/// Creates `dir` and any missing ancestors below `root`, returning how many were created.
fn create_missing_dirs(root: &std::path::Path, dir: &std::path::Path) -> Result<usize> {
  if dir == root || dir.is_dir() {
    return Ok(0);
  }
  let mut created = 0;
  if let Some(parent) = dir.parent() {
    created += create_missing_dirs(root, parent)?;
  }
  if create_dir_if_absent(dir)? {
    created += 1;
  }
  Ok(created)
}

pub fn pipeline(ctx: &BuildContext) -> Sequencer {
  let from = ctx.config.source_root();
  let to = ctx.config.product_loc.join(&ctx.config.source_dir);
  Sequencer::new().stage(CopySources::new(from, to))
}
