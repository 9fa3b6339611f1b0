//! The `android` target: builds `app.apk` in six stages.
//!
//! ```text
//! package-partial  manifest + resources  -> app.apkPart   (aapt)
//! translate        sources               -> jtransSourceOut (assert rewriting)
//! compile          translated sources    -> javacOut/*.class (javac)
//! dex              class files           -> classes.dex   (dx)
//! package-full     classes.dex + apkPart -> app.apkUnalign (ApkBuilderMain)
//! align            app.apkUnalign        -> <product>/app.apk (zipalign)
//! ```
//!
//! Each stage re-examines its own inputs, so a stage whose outputs are current does
//! nothing even when an earlier stage did work.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::context::BuildContext;
use crate::diff::{self, BundleDiff, JavaClassRule, SourceDiff};
use crate::error::{BuildError, PathContext, Result};
use crate::platform::join_classpath;
use crate::source::{self, AcceptAll, SourceFile};
use crate::stage::{Sequencer, Stage, StagePlan};
use crate::target::manifest;
use crate::timestamp;
use crate::tool::toolchain::{self, Tool};
use crate::tool::{ToolCommand, write_argfile};
use crate::translate;
use crate::util::fs::{ensure_dir, modified};

/// Where the pipeline reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidPaths {
  pub source_root: PathBuf,
  pub manifest_template: PathBuf,
  pub res_dir: PathBuf,
  pub tmp: PathBuf,
  pub manifest: PathBuf,
  pub aapt_source_out: PathBuf,
  pub apk_part: PathBuf,
  pub translated: PathBuf,
  pub javac_out: PathBuf,
  pub javac_arg: PathBuf,
  pub javac_source_arg: PathBuf,
  pub dex: PathBuf,
  pub dex_input_list: PathBuf,
  pub apk_full: PathBuf,
  pub apk: PathBuf,
}

impl AndroidPaths {
  pub fn new(ctx: &BuildContext) -> Self {
    let config = &ctx.config;
    let source_root = config.source_root();
    let package_dir = source_root.join(config.android_package_dir());
    let tmp = ctx.layout.build.join("android");
    Self {
      manifest_template: package_dir.join("AndroidManifest.xml"),
      res_dir: package_dir.join("res"),
      manifest: tmp.join("AndroidManifest.xml"),
      aapt_source_out: tmp.join("aaptSourceOut"),
      apk_part: tmp.join("app.apkPart"),
      translated: tmp.join("jtransSourceOut"),
      javac_out: tmp.join("javacOut"),
      javac_arg: tmp.join("javacArg"),
      javac_source_arg: tmp.join("javacSourceArg"),
      dex: tmp.join("classes.dex"),
      dex_input_list: tmp.join("classesIn"),
      apk_full: tmp.join("app.apkUnalign"),
      apk: config.product_loc.join("app.apk"),
      source_root,
      tmp,
    }
  }
}

/// The six android stages, in order.
pub fn pipeline(ctx: &BuildContext) -> Sequencer {
  let paths = AndroidPaths::new(ctx);
  Sequencer::new()
    .stage(PackagePartial::new(paths.clone()))
    .stage(Translate::new(paths.clone()))
    .stage(Compile::new(paths.clone()))
    .stage(Dex::new(paths.clone()))
    .stage(PackageFull::new(paths.clone()))
    .stage(Align::new(paths))
}

/// Diffs the Java sources against compiled classes and their translated copies.
pub fn source_diff(ctx: &BuildContext, paths: &AndroidPaths) -> Result<SourceDiff> {
  let sources = source::resolve_ext(&paths.source_root, ctx.matcher(), "java")?;
  diff::diff_sources(&sources, &paths.javac_out, &JavaClassRule, Some(&paths.translated))
}

fn mtime_required(path: &Path) -> Result<std::time::SystemTime> {
  modified(path)?.ok_or_else(|| BuildError::at(path, std::io::ErrorKind::NotFound.into()))
}

// -- package-partial --------------------------------------------------------------------

pub struct PackagePartial {
  paths: AndroidPaths,
}

impl PackagePartial {
  pub fn new(paths: AndroidPaths) -> Self {
    Self { paths }
  }

  /// Newest modification time among the manifest template and resource files.
  fn newest_input(&self) -> Result<std::time::SystemTime> {
    let mut newest = modified(&self.paths.manifest_template)?.ok_or_else(|| BuildError::MissingDependency {
      what: "manifest template",
      path: self.paths.manifest_template.clone(),
      hint: "android_package",
    })?;
    if self.paths.res_dir.is_dir() {
      for file in source::resolve(&self.paths.res_dir, &AcceptAll)? {
        newest = newest.max(file.modified);
      }
    }
    Ok(newest)
  }
}

impl Stage for PackagePartial {
  fn name(&self) -> &str {
    "package-partial"
  }

  fn plan(&mut self, _ctx: &mut BuildContext, _upstream_changed: bool) -> Result<StagePlan> {
    let newest = self.newest_input()?;
    if timestamp::is_stale_path(newest, &self.paths.apk_part).at_path(&self.paths.apk_part)? {
      Ok(StagePlan::Run { units: 1 })
    } else {
      Ok(StagePlan::Skip)
    }
  }

  fn execute(&mut self, ctx: &mut BuildContext) -> Result<usize> {
    let p = &self.paths;
    ensure_dir(&p.tmp)?;
    manifest::generate(&p.manifest_template, &p.manifest, &ctx.config.app_package_name)?;

    let r_dir = p.aapt_source_out.join(ctx.config.android_package_dir());
    ensure_dir(&r_dir)?;
    let android_jar = ctx.android_jar()?;
    let aapt = ctx.tool(Tool::Aapt)?;

    let mut command = ToolCommand::new(aapt)
      .arg("package")
      .args(["--custom-package", ctx.config.android_package.as_str()])
      .arg("-f")
      .arg("-F")
      .arg(&p.apk_part)
      .arg("-I")
      .arg(&android_jar)
      .arg("-J")
      .arg(&r_dir)
      .arg("-M")
      .arg(&p.manifest);
    if p.res_dir.is_dir() {
      command = command.arg("-S").arg(&p.res_dir);
    }
    let output = ctx.exec(&command.arg("-v"))?;
    Ok(toolchain::aapt_count(&output.stdout).unwrap_or(0))
  }
}

// -- translate --------------------------------------------------------------------------

pub struct Translate {
  paths: AndroidPaths,
  pending: Vec<SourceFile>,
}

impl Translate {
  pub fn new(paths: AndroidPaths) -> Self {
    Self {
      paths,
      pending: Vec::new(),
    }
  }
}

impl Stage for Translate {
  fn name(&self) -> &str {
    "translate"
  }

  fn plan(&mut self, ctx: &mut BuildContext, _upstream_changed: bool) -> Result<StagePlan> {
    let diff = source_diff(ctx, &self.paths)?;
    // Translation serves compilation; with nothing to compile there is nothing to do.
    if diff.is_empty() || diff.to_retranslate.is_empty() {
      self.pending.clear();
      return Ok(StagePlan::Skip);
    }
    let units = diff.to_retranslate.len();
    self.pending = diff.to_retranslate;
    Ok(StagePlan::Run { units })
  }

  fn execute(&mut self, ctx: &mut BuildContext) -> Result<usize> {
    let pending = std::mem::take(&mut self.pending);
    translate::translate_all(&pending, &self.paths.translated, ctx.config.android_assert_translation)
  }
}

// -- compile ----------------------------------------------------------------------------

pub struct Compile {
  paths: AndroidPaths,
  pending: Vec<SourceFile>,
}

impl Compile {
  pub fn new(paths: AndroidPaths) -> Self {
    Self {
      paths,
      pending: Vec::new(),
    }
  }
}

impl Stage for Compile {
  fn name(&self) -> &str {
    "compile"
  }

  fn plan(&mut self, ctx: &mut BuildContext, _upstream_changed: bool) -> Result<StagePlan> {
    let diff = source_diff(ctx, &self.paths)?;
    if diff.orphaned > 0 {
      warn!(count = diff.orphaned, "class files remain for deleted sources; run the clean target to remove them");
    }
    if diff.is_empty() {
      self.pending.clear();
      return Ok(StagePlan::Skip);
    }
    let units = diff.to_regenerate.len();
    self.pending = diff.to_regenerate;
    Ok(StagePlan::Run { units })
  }

  fn execute(&mut self, ctx: &mut BuildContext) -> Result<usize> {
    let p = &self.paths;
    ensure_dir(&p.javac_out)?;
    let android_jar = ctx.android_jar()?;
    let javac = ctx.tool(Tool::Javac)?;

    write_argfile(
      &p.javac_arg,
      &["-classpath".to_string(), p.javac_out.to_string_lossy().into_owned()],
    )?;
    let sources: Vec<String> = self
      .pending
      .iter()
      .map(|f| p.translated.join(&f.relative).to_string_lossy().into_owned())
      .collect();
    write_argfile(&p.javac_source_arg, &sources)?;
    let compile_time = mtime_required(&p.javac_source_arg)?;

    let target = ctx.config.java_target.clone();
    let command = ToolCommand::new(javac)
      .arg("-bootclasspath")
      .arg(&android_jar)
      .arg("-d")
      .arg(&p.javac_out)
      .args(["-encoding", "UTF-8"])
      .args(["-source", target.as_str()])
      .arg("-sourcepath")
      .arg(join_classpath([&p.translated, &p.aapt_source_out]))
      .args(["-target", target.as_str()])
      .args(["-Werror", "-Xdoclint:all,-missing", "-Xlint"])
      .arg(format!("@{}", p.javac_arg.display()))
      .arg(format!("@{}", p.javac_source_arg.display()));
    ctx.exec(&command)?;

    self.pending.clear();
    diff::count_compiled(&p.javac_out, compile_time)
  }
}

// -- dex --------------------------------------------------------------------------------

enum DexMode {
  Incremental(BundleDiff),
  Full,
}

pub struct Dex {
  paths: AndroidPaths,
  mode: Option<DexMode>,
}

impl Dex {
  pub fn new(paths: AndroidPaths) -> Self {
    Self { paths, mode: None }
  }
}

impl Stage for Dex {
  fn name(&self) -> &str {
    "dex"
  }

  fn plan(&mut self, ctx: &mut BuildContext, _upstream_changed: bool) -> Result<StagePlan> {
    let p = &self.paths;
    self.mode = None;

    match modified(&p.dex)? {
      Some(previous) => {
        let threshold = ctx.config.skew().threshold(previous);
        let bundle = diff::compiled_since(&p.javac_out, threshold)?;
        if bundle.is_empty() {
          return Ok(StagePlan::Skip);
        }
        let units = bundle.top_level;
        self.mode = Some(DexMode::Incremental(bundle));
        Ok(StagePlan::Run { units })
      }
      None => {
        let all = diff::compiled_since(&p.javac_out, std::time::UNIX_EPOCH)?;
        if all.is_empty() {
          debug!("no class files to dex");
          return Ok(StagePlan::Skip);
        }
        self.mode = Some(DexMode::Full);
        Ok(StagePlan::Run { units: all.top_level })
      }
    }
  }

  fn execute(&mut self, ctx: &mut BuildContext) -> Result<usize> {
    let p = &self.paths;
    let dx = ctx.tool(Tool::Dx)?;
    let command = ToolCommand::new(dx)
      .arg("--dex")
      .arg(format!("--output={}", p.dex.display()))
      .arg("--verbose");

    let command = match self.mode.take() {
      Some(DexMode::Incremental(bundle)) => {
        // dx resolves the listed class files against its working directory
        let list: Vec<String> = bundle
          .inputs
          .iter()
          .map(|f| f.to_string_lossy().into_owned())
          .collect();
        std::fs::write(&p.dex_input_list, list.join("\n") + "\n").at_path(&p.dex_input_list)?;
        command
          .arg("--incremental")
          .arg(format!("--input-list={}", p.dex_input_list.display()))
          .current_dir(&p.javac_out)
      }
      Some(DexMode::Full) | None => {
        let list = format!("{}\n", p.javac_out.display());
        std::fs::write(&p.dex_input_list, list).at_path(&p.dex_input_list)?;
        command.arg(format!("--input-list={}", p.dex_input_list.display()))
      }
    };

    let output = ctx.exec(&command)?;
    Ok(toolchain::dexed_count(&output.stdout))
  }
}

// -- package-full -----------------------------------------------------------------------

pub struct PackageFull {
  paths: AndroidPaths,
}

impl PackageFull {
  pub fn new(paths: AndroidPaths) -> Self {
    Self { paths }
  }
}

impl Stage for PackageFull {
  fn name(&self) -> &str {
    "package-full"
  }

  fn plan(&mut self, _ctx: &mut BuildContext, _upstream_changed: bool) -> Result<StagePlan> {
    let p = &self.paths;
    let (Some(dex), Some(part)) = (modified(&p.dex)?, modified(&p.apk_part)?) else {
      warn!("nothing to package yet");
      return Ok(StagePlan::Skip);
    };
    let stale = timestamp::is_stale_path(dex, &p.apk_full).at_path(&p.apk_full)?
      || timestamp::is_stale_path(part, &p.apk_full).at_path(&p.apk_full)?;
    Ok(if stale { StagePlan::Run { units: 1 } } else { StagePlan::Skip })
  }

  fn execute(&mut self, ctx: &mut BuildContext) -> Result<usize> {
    let p = &self.paths;
    let sdklib = ctx.sdklib_jar()?;
    let java = ctx.tool(Tool::Java)?;
    let command = ToolCommand::new(java)
      .arg("-classpath")
      .arg(&sdklib)
      .arg("com.android.sdklib.build.ApkBuilderMain")
      .arg(&p.apk_full)
      .arg("-d")
      .arg("-f")
      .arg(&p.dex)
      .arg("-v")
      .arg("-z")
      .arg(&p.apk_part);
    ctx.exec(&command)?;
    Ok(1)
  }
}

// -- align ------------------------------------------------------------------------------

pub struct Align {
  paths: AndroidPaths,
}

impl Align {
  pub fn new(paths: AndroidPaths) -> Self {
    Self { paths }
  }
}

impl Stage for Align {
  fn name(&self) -> &str {
    "align"
  }

  fn plan(&mut self, _ctx: &mut BuildContext, _upstream_changed: bool) -> Result<StagePlan> {
    let p = &self.paths;
    let Some(full) = modified(&p.apk_full)? else {
      return Ok(StagePlan::Skip);
    };
    if timestamp::is_stale_path(full, &p.apk).at_path(&p.apk)? {
      Ok(StagePlan::Run { units: 1 })
    } else {
      Ok(StagePlan::Skip)
    }
  }

  fn execute(&mut self, ctx: &mut BuildContext) -> Result<usize> {
    let p = &self.paths;
    if let Some(product) = p.apk.parent() {
      ensure_dir(product)?;
    }
    let zipalign = ctx.tool(Tool::Zipalign)?;
    let command = ToolCommand::new(zipalign)
      .args(["-f", "-v", "4"])
      .arg(&p.apk_full)
      .arg(&p.apk);
    ctx.exec(&command)?;
    Ok(1)
  }
}
