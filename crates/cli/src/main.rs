mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use apkstage_lib::consts::DEFAULT_TARGET;

use crate::cmd::ConfigArgs;
use crate::output::OutputFormat;

/// apkstage - incremental build driver for Android apps written in Java
#[derive(Parser)]
#[command(name = "apkstage")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the config script (default: the per-user config.lua)
  #[arg(long, global = true, value_name = "PATH")]
  config: Option<PathBuf>,

  /// Use the release configuration (asserts compiled out)
  #[arg(long, global = true)]
  release: bool,

  /// Override a string config value
  #[arg(short = 'D', global = true, value_name = "config.NAME=VALUE")]
  define: Vec<String>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build targets and their dependencies
  Build {
    /// Targets to build, in order
    #[arg(value_name = "TARGET", default_value = DEFAULT_TARGET)]
    targets: Vec<String>,
  },

  /// Show which Java sources would be retranslated and recompiled
  Plan {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show platform, paths and the effective configuration
  Info {
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let args = ConfigArgs {
    file: cli.config,
    release: cli.release,
    overrides: cli.define,
  };

  let result = match cli.command {
    Commands::Build { targets } => cmd::cmd_build(&args, &targets),
    Commands::Plan { output } => cmd::cmd_plan(&args, output),
    Commands::Info { output } => cmd::cmd_info(&args, output),
  };

  if let Err(err) = result {
    abort(err);
  }
}

/// The single exit point for fatal errors.
fn abort(err: anyhow::Error) -> ! {
  output::print_error(&format!("{err:#}"));
  std::process::exit(1);
}
