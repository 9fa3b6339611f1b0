//! User-defined targets: shell commands from `config.lua`, run in the project
//! directory after the target's dependencies are built.

use crate::config::CustomTarget;
use crate::context::BuildContext;
use crate::error::Result;
use crate::stage::{Sequencer, Stage, StagePlan};
use crate::tool::ToolCommand;

/// Runs one shell command, unconditionally.
pub struct ShellCommand {
  line: String,
}

impl ShellCommand {
  pub fn new(line: impl Into<String>) -> Self {
    Self { line: line.into() }
  }
}

impl Stage for ShellCommand {
  fn name(&self) -> &str {
    &self.line
  }

  fn plan(&mut self, _ctx: &mut BuildContext, _upstream_changed: bool) -> Result<StagePlan> {
    Ok(StagePlan::Run { units: 1 })
  }

  fn execute(&mut self, ctx: &mut BuildContext) -> Result<usize> {
    let command = ToolCommand::shell(&self.line).current_dir(&ctx.config.project_loc);
    ctx.exec(&command)?;
    Ok(1)
  }
}

pub fn pipeline(target: &CustomTarget) -> Sequencer {
  target
    .commands
    .iter()
    .fold(Sequencer::new(), |seq, line| seq.stage(ShellCommand::new(line.as_str())))
}
