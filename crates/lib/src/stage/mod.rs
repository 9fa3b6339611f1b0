//! Build stages and their life cycle.
//!
//! A stage first computes its plan (its dependency diff against the filesystem),
//! then runs its external tool only if the plan is non-empty:
//!
//! ```text
//! NotEvaluated -> DiffComputed -> Skipped
//!                              -> Executing -> Succeeded
//!                                           -> Failed
//! ```

pub mod sequencer;

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::context::BuildContext;
use crate::error::Result;

pub use sequencer::Sequencer;

/// What a stage intends to do this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePlan {
  /// Nothing is stale.
  Skip,
  /// Run the tool over this many stale units.
  Run { units: usize },
}

impl StagePlan {
  pub fn is_empty(&self) -> bool {
    matches!(self, StagePlan::Skip)
  }
}

/// One step of a pipeline.
///
/// The plan computed by [`Stage::plan`] is kept by the stage itself and consumed
/// by [`Stage::execute`].
pub trait Stage {
  fn name(&self) -> &str;

  /// Examines this stage's own inputs. `upstream_changed` tells whether any earlier
  /// stage of the run did work; it never forces work on its own.
  fn plan(&mut self, ctx: &mut BuildContext, upstream_changed: bool) -> Result<StagePlan>;

  /// Runs the tool for the last non-empty plan and returns the number of units
  /// it produced.
  fn execute(&mut self, ctx: &mut BuildContext) -> Result<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
  NotEvaluated,
  DiffComputed,
  Skipped,
  Executing,
  Succeeded,
  Failed,
}

impl StageState {
  /// True once the stage can no longer change state.
  pub fn is_final(&self) -> bool {
    matches!(self, StageState::Skipped | StageState::Succeeded | StageState::Failed)
  }

  pub fn did_work(&self) -> bool {
    matches!(self, StageState::Succeeded)
  }
}

impl fmt::Display for StageState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      StageState::NotEvaluated => "not evaluated",
      StageState::DiffComputed => "diff computed",
      StageState::Skipped => "skipped",
      StageState::Executing => "executing",
      StageState::Succeeded => "succeeded",
      StageState::Failed => "failed",
    };
    f.write_str(s)
  }
}

/// The outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
  pub name: String,
  pub state: StageState,
  /// Units processed; zero when skipped.
  pub units: usize,
  pub elapsed: Duration,
}

impl StageReport {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      state: StageState::NotEvaluated,
      units: 0,
      elapsed: Duration::ZERO,
    }
  }
}
