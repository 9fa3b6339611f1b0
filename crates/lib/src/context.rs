//! The per-invocation build context.
//!
//! Built once from the resolved configuration and passed by `&mut` to every target
//! and stage. It owns the tool runner, the command log, the set of config keys whose
//! tools have already been smoke tested, and the nesting depth used to indent
//! progress output.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::platform::paths;
use crate::source::{ExcludeMatcher, SourceMatcher};
use crate::stage::StageReport;
use crate::tool::log::CommandLog;
use crate::tool::{ProcessRunner, ToolCommand, ToolOutput, ToolRunner};

/// Locations of expendable output.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Layout {
  /// Root of all temporary output; holds the log.
  pub tmp: PathBuf,
  /// Intermediate artifacts of every stage.
  pub build: PathBuf,
  pub log: PathBuf,
}

impl Layout {
  /// The standard layout under the OS temp directory.
  pub fn standard() -> Self {
    Self {
      tmp: paths::tmp_dir(),
      build: paths::build_tmp_dir(),
      log: paths::log_file(),
    }
  }

  /// The same shape rooted at `tmp`.
  pub fn under(tmp: impl Into<PathBuf>) -> Self {
    let tmp = tmp.into();
    Self {
      build: tmp.join(crate::consts::BUILD_SUBDIR),
      log: tmp.join(crate::consts::LOG_FILENAME),
      tmp,
    }
  }
}

/// Progress notifications, in the order things happen.
#[derive(Debug)]
pub enum BuildEvent<'a> {
  TargetStarted { name: &'a str, depth: usize },
  TargetFinished { name: &'a str, depth: usize, elapsed: Duration },
  StageFinished { depth: usize, report: &'a StageReport },
}

/// Receives [`BuildEvent`]s, e.g. to print progress.
pub trait Reporter {
  fn report(&mut self, event: &BuildEvent<'_>);
}

/// Discards all events.
#[derive(Debug, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
  fn report(&mut self, _event: &BuildEvent<'_>) {}
}

pub struct BuildContext {
  pub config: BuildConfig,
  pub layout: Layout,
  matcher: ExcludeMatcher,
  runner: Box<dyn ToolRunner>,
  reporter: Box<dyn Reporter>,
  log: CommandLog,
  depth: usize,
  /// Config keys whose tools have passed a smoke test this run.
  pub(crate) tested: BTreeSet<&'static str>,
  /// SDK/JDK files already checked for existence.
  pub(crate) checked_files: BTreeMap<&'static str, PathBuf>,
}

impl BuildContext {
  pub fn new(config: BuildConfig, layout: Layout) -> Result<Self> {
    let matcher = ExcludeMatcher::new(&config.source_root(), &config.source_exclude)?;
    let log = CommandLog::new(layout.log.clone());
    Ok(Self {
      config,
      layout,
      matcher,
      runner: Box::new(ProcessRunner),
      reporter: Box::new(SilentReporter),
      log,
      depth: 0,
      tested: BTreeSet::new(),
      checked_files: BTreeMap::new(),
    })
  }

  pub fn with_runner(mut self, runner: impl ToolRunner + 'static) -> Self {
    self.runner = Box::new(runner);
    self
  }

  pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
    self.reporter = Box::new(reporter);
    self
  }

  /// The configured source filter.
  pub fn matcher(&self) -> &dyn SourceMatcher {
    &self.matcher
  }

  /// Current target nesting depth (0 at the top level).
  pub fn depth(&self) -> usize {
    self.depth
  }

  pub(crate) fn enter(&mut self) {
    self.depth += 1;
  }

  pub(crate) fn leave(&mut self) {
    self.depth = self.depth.saturating_sub(1);
  }

  pub fn report(&mut self, event: &BuildEvent<'_>) {
    self.reporter.report(event);
  }

  /// Runs `command` and logs it, returning the spawn result as is.
  ///
  /// The outer error covers only failure to write the log.
  pub fn spawn(&mut self, command: &ToolCommand) -> Result<io::Result<ToolOutput>> {
    info!(command = %command, "running");
    let result = self.runner.run(command);
    self.log.append(command, result.as_ref().ok())?;
    Ok(result)
  }

  /// Runs `command`, failing unless it exits with status 0.
  pub fn exec(&mut self, command: &ToolCommand) -> Result<ToolOutput> {
    match self.spawn(command)? {
      Ok(output) if output.success() => Ok(output),
      Ok(output) => {
        let stderr = if output.stderr.trim().is_empty() {
          output.stdout
        } else {
          output.stderr
        };
        Err(BuildError::ToolFailed {
          command: command.to_string(),
          code: output.code,
          stderr: stderr.trim_end().to_string(),
        })
      }
      Err(e) => Err(BuildError::ToolFailed {
        command: command.to_string(),
        code: None,
        stderr: e.to_string(),
      }),
    }
  }
}

impl std::fmt::Debug for BuildContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("BuildContext")
      .field("config", &self.config)
      .field("layout", &self.layout)
      .field("depth", &self.depth)
      .field("tested", &self.tested)
      .finish_non_exhaustive()
  }
}
