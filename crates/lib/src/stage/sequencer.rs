use std::time::Instant;

use tracing::{debug, info, warn};

use super::{Stage, StagePlan, StageReport, StageState};
use crate::context::{BuildContext, BuildEvent};
use crate::error::Result;

/// Runs stages in the order they were added, stopping at the first failure.
pub struct Sequencer {
  stages: Vec<Box<dyn Stage>>,
  reports: Vec<StageReport>,
}

impl Sequencer {
  pub fn new() -> Self {
    Self {
      stages: Vec::new(),
      reports: Vec::new(),
    }
  }

  pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
    self.reports.push(StageReport::new(stage.name()));
    self.stages.push(Box::new(stage));
    self
  }

  /// One report per stage, in order. Stages after a failure stay `NotEvaluated`.
  pub fn reports(&self) -> &[StageReport] {
    &self.reports
  }

  /// Runs every stage. Returns whether any stage did work.
  pub fn run(&mut self, ctx: &mut BuildContext) -> Result<bool> {
    let mut changed = false;

    for (stage, report) in self.stages.iter_mut().zip(self.reports.iter_mut()) {
      let start = Instant::now();
      let outcome = run_stage(stage.as_mut(), report, ctx, changed);
      report.elapsed = start.elapsed();
      let depth = ctx.depth();
      ctx.report(&BuildEvent::StageFinished { depth, report });

      match outcome {
        Ok(()) => changed |= report.state.did_work(),
        Err(e) => {
          warn!(stage = %report.name, error = %e, "stage failed");
          return Err(e);
        }
      }
    }

    Ok(changed)
  }
}

impl Default for Sequencer {
  fn default() -> Self {
    Self::new()
  }
}

fn run_stage(
  stage: &mut dyn Stage,
  report: &mut StageReport,
  ctx: &mut BuildContext,
  upstream_changed: bool,
) -> Result<()> {
  let plan = stage.plan(ctx, upstream_changed).inspect_err(|_| {
    report.state = StageState::Failed;
  })?;
  report.state = StageState::DiffComputed;

  match plan {
    StagePlan::Skip => {
      report.state = StageState::Skipped;
      debug!(stage = %report.name, "nothing to do");
    }
    StagePlan::Run { units } => {
      report.state = StageState::Executing;
      debug!(stage = %report.name, units, "executing");
      match stage.execute(ctx) {
        Ok(produced) => {
          report.state = StageState::Succeeded;
          report.units = produced;
          info!(stage = %report.name, units = produced, "stage succeeded");
        }
        Err(e) => {
          report.state = StageState::Failed;
          return Err(e);
        }
      }
    }
  }
  Ok(())
}
