//! The `clean` target: deletes the intermediate build tree and the product.

use std::path::PathBuf;

use crate::context::BuildContext;
use crate::error::Result;
use crate::stage::{Sequencer, Stage, StagePlan};
use crate::util::fs::remove_tree;

/// Deletes one directory tree, counting every file and directory removed.
pub struct RemoveTree {
  name: String,
  dir: PathBuf,
}

impl RemoveTree {
  pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      dir: dir.into(),
    }
  }
}

impl Stage for RemoveTree {
  fn name(&self) -> &str {
    &self.name
  }

  fn plan(&mut self, _ctx: &mut BuildContext, _upstream_changed: bool) -> Result<StagePlan> {
    if std::fs::symlink_metadata(&self.dir).is_ok() {
      Ok(StagePlan::Run { units: 0 })
    } else {
      Ok(StagePlan::Skip)
    }
  }

  fn execute(&mut self, _ctx: &mut BuildContext) -> Result<usize> {
    remove_tree(&self.dir)
  }
}

pub fn pipeline(ctx: &BuildContext) -> Sequencer {
  Sequencer::new()
    .stage(RemoveTree::new("tmp", &ctx.layout.build))
    .stage(RemoveTree::new("product", &ctx.config.product_loc))
}
