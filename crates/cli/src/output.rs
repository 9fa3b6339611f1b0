//! CLI output formatting utilities.
//!
//! Colored status symbols, duration formatting, and the progress reporter that
//! prints targets and stages as a build runs.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use apkstage_lib::context::{BuildEvent, Reporter};
use apkstage_lib::stage::StageState;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const SKIP: &str = "-";
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

fn indent(depth: usize) -> String {
  "  ".repeat(depth)
}

/// Prints one line per target start, stage outcome, and target completion,
/// indented by nesting depth.
#[derive(Debug, Default)]
pub struct ProgressReporter;

impl Reporter for ProgressReporter {
  fn report(&mut self, event: &BuildEvent<'_>) {
    match event {
      BuildEvent::TargetStarted { name, depth } => {
        println!(
          "{}{} {}",
          indent(*depth),
          symbols::ARROW.if_supports_color(Stream::Stdout, |s| s.cyan()),
          name.if_supports_color(Stream::Stdout, |s| s.bold())
        );
      }
      BuildEvent::StageFinished { depth, report } => {
        let line = format!("{}: {} ({})", report.name, report.state, report.units);
        match report.state {
          StageState::Succeeded => println!(
            "{}{} {} {}",
            indent(*depth),
            symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
            line,
            format_duration(report.elapsed).if_supports_color(Stream::Stdout, |s| s.dimmed())
          ),
          StageState::Failed => println!(
            "{}{} {}",
            indent(*depth),
            symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red()),
            line
          ),
          _ => println!(
            "{}{} {}",
            indent(*depth),
            symbols::SKIP.if_supports_color(Stream::Stdout, |s| s.dimmed()),
            line.if_supports_color(Stream::Stdout, |s| s.dimmed())
          ),
        }
      }
      BuildEvent::TargetFinished { name, depth, elapsed } => {
        println!(
          "{}{} {} {}",
          indent(*depth),
          symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
          name,
          format_duration(*elapsed).if_supports_color(Stream::Stdout, |s| s.dimmed())
        );
      }
    }
  }
}
