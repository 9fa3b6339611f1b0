//! External tool invocation.
//!
//! Every toolchain program (javac, dx, aapt, zipalign, javadoc, the APK builder,
//! and the shell commands of user targets) runs as a blocking child process through
//! a [`ToolRunner`]. Its exit code and captured output are returned whole.

pub mod log;
pub mod toolchain;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// A command line to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
  pub program: PathBuf,
  pub args: Vec<String>,
  /// Working directory; inherits ours when `None`.
  pub cwd: Option<PathBuf>,
}

impl ToolCommand {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
    }
  }

  /// Runs `line` through the platform shell.
  pub fn shell(line: &str) -> Self {
    #[cfg(unix)]
    let (shell, flag) = ("/bin/sh", "-c");
    #[cfg(windows)]
    let (shell, flag) = ("cmd.exe", "/C");

    Self::new(shell).arg(flag).arg(line)
  }

  pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
    self.args.push(arg.as_ref().to_string_lossy().into_owned());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
  {
    for arg in args {
      self = self.arg(arg);
    }
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.cwd = Some(dir.into());
    self
  }

  /// File name of the program, e.g. `javac` for `/opt/jdk/bin/javac`.
  pub fn program_name(&self) -> &str {
    self
      .program
      .file_stem()
      .and_then(|n| n.to_str())
      .unwrap_or_default()
  }
}

impl fmt::Display for ToolCommand {
  /// Renders the command as a shell-quoted line, for logs and messages.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let program = self.program.to_string_lossy();
    let words = std::iter::once(program.as_ref()).chain(self.args.iter().map(String::as_str));
    match shlex::try_join(words) {
      Ok(line) => f.write_str(&line),
      Err(_) => write!(f, "{} {}", program, self.args.join(" ")),
    }
  }
}

/// What a finished command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
  /// `None` if the process was terminated by a signal.
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl ToolOutput {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

/// Runs tool commands. Injected into the build context so that tests can script
/// toolchain behavior.
pub trait ToolRunner {
  /// Runs `command` to completion. Errors only if the process could not be started.
  fn run(&mut self, command: &ToolCommand) -> io::Result<ToolOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
  fn run(&mut self, command: &ToolCommand) -> io::Result<ToolOutput> {
    let mut process = Command::new(&command.program);
    process.args(&command.args);
    if let Some(cwd) = &command.cwd {
      process.current_dir(cwd);
    }

    debug!(command = %command, cwd = ?command.cwd, "spawning process");
    let output = process.output()?;
    Ok(ToolOutput {
      code: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
  }
}

/// Resolves a tool by name inside `dir`, or leaves it to the PATH when `dir` is empty.
pub fn locate(dir: &Path, name: &str) -> PathBuf {
  if dir.as_os_str().is_empty() {
    PathBuf::from(name)
  } else {
    dir.join(name)
  }
}

/// Writes a JDK `@argfile`, one argument per line. Arguments containing
/// whitespace are double quoted.
pub fn write_argfile(path: &Path, args: &[String]) -> crate::Result<()> {
  use crate::error::PathContext;

  let mut text = String::new();
  for arg in args {
    if arg.chars().any(char::is_whitespace) {
      text.push('"');
      text.push_str(&arg.replace('\\', "\\\\").replace('"', "\\\""));
      text.push('"');
    } else {
      text.push_str(arg);
    }
    text.push('\n');
  }
  std::fs::write(path, text).at_path(path)
}
