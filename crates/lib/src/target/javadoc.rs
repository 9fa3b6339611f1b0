//! The `javadoc` target: API documentation of the whole source tree.
//!
//! Javadoc is not incremental. It reruns whenever any source is newer than the
//! generated index page.

use std::path::PathBuf;

use crate::context::BuildContext;
use crate::error::{PathContext, Result};
use crate::platform::join_classpath;
use crate::source;
use crate::stage::{Sequencer, Stage, StagePlan};
use crate::timestamp;
use crate::tool::toolchain::Tool;
use crate::tool::{ToolCommand, write_argfile};
use crate::util::fs::ensure_dir;

pub struct Javadoc {
  source_root: PathBuf,
  generated_source: PathBuf,
  tmp: PathBuf,
  out: PathBuf,
  packages: Vec<String>,
}

impl Javadoc {
  pub fn new(ctx: &BuildContext) -> Self {
    Self {
      source_root: ctx.config.source_root(),
      generated_source: ctx.layout.build.join("android").join("aaptSourceOut"),
      tmp: ctx.layout.build.join("javadoc"),
      out: ctx.config.product_loc.join("javadoc"),
      packages: Vec::new(),
    }
  }

  fn index(&self) -> PathBuf {
    self.out.join("index.html")
  }
}

/// Major version for documentation links: `1.8` -> `8`, `11` -> `11`.
pub fn simple_jdk_version(version: &str) -> &str {
  let version = version.strip_prefix("1.").unwrap_or(version);
  version.split('.').next().unwrap_or(version)
}

impl Stage for Javadoc {
  fn name(&self) -> &str {
    "javadoc"
  }

  fn plan(&mut self, ctx: &mut BuildContext, _upstream_changed: bool) -> Result<StagePlan> {
    let sources = source::resolve_ext(&self.source_root, ctx.matcher(), "java")?;
    let index = self.index();
    let mut stale = 0;
    for file in &sources {
      if timestamp::is_stale_path(file.modified, &index).at_path(&index)? {
        stale += 1;
      }
    }

    // Top-level packages are the first path segment of every source in a package.
    self.packages = sources
      .iter()
      .filter(|f| f.relative.components().count() > 1)
      .filter_map(|f| f.relative.components().next())
      .map(|c| c.as_os_str().to_string_lossy().into_owned())
      .collect();
    self.packages.dedup();

    if stale == 0 || self.packages.is_empty() {
      return Ok(StagePlan::Skip);
    }
    Ok(StagePlan::Run { units: stale })
  }

  fn execute(&mut self, ctx: &mut BuildContext) -> Result<usize> {
    ensure_dir(&self.tmp)?;
    ensure_dir(&self.out)?;
    let android_jar = ctx.android_jar()?;
    let javadoc = ctx.tool(Tool::Javadoc)?;

    let link = format!(
      "https://docs.oracle.com/javase/{}/docs/api/",
      simple_jdk_version(&ctx.config.jdk_version)
    );
    let sourcepath = if self.generated_source.is_dir() {
      join_classpath([&self.source_root, &self.generated_source])
    } else {
      self.source_root.to_string_lossy().into_owned()
    };
    let args = vec![
      "-bootclasspath".to_string(),
      android_jar.to_string_lossy().into_owned(),
      "-breakiterator".to_string(),
      "-charset".to_string(),
      "UTF-8".to_string(),
      "-d".to_string(),
      self.out.to_string_lossy().into_owned(),
      "-encoding".to_string(),
      "UTF-8".to_string(),
      "-link".to_string(),
      link,
      "-package".to_string(),
      "-sourcepath".to_string(),
      sourcepath,
      "-subpackages".to_string(),
      self.packages.join(":"),
      "-use".to_string(),
      "-Xdoclint:all,-missing".to_string(),
    ];
    let arg_file = self.tmp.join("argIn");
    write_argfile(&arg_file, &args)?;

    ctx.exec(&ToolCommand::new(javadoc).arg(format!("@{}", arg_file.display())))?;
    Ok(self.packages.len())
  }
}

pub fn pipeline(ctx: &BuildContext) -> Sequencer {
  Sequencer::new().stage(Javadoc::new(ctx))
}
