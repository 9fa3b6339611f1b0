//! Shared helpers: a sandboxed project and a scripted toolchain that writes the
//! files the real tools would.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use apkstage_lib::BuildContext;
use apkstage_lib::config::BuildConfig;
use apkstage_lib::context::{BuildEvent, Layout, Reporter};
use apkstage_lib::diff::compiled_since;
use apkstage_lib::platform::classpath_separator;
use apkstage_lib::stage::StageState;
use apkstage_lib::tool::{ToolCommand, ToolOutput, ToolRunner};
use tempfile::TempDir;

pub const MANIFEST_TEMPLATE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- incomplete template -->
<manifest xmlns:android="http://schemas.android.com/apk/res/android">
  <application android:label="Test"/>
</manifest>
"#;

/// An hour ago, so that anything the build writes is newer.
pub fn an_hour_ago() -> SystemTime {
  SystemTime::now() - Duration::from_secs(3600)
}

pub fn set_mtime(path: &Path, time: SystemTime) {
  fs::File::options().write(true).open(path).unwrap().set_modified(time).unwrap();
}

pub fn mtime(path: &Path) -> SystemTime {
  fs::metadata(path).unwrap().modified().unwrap()
}

/// A project directory with an SDK beside it, all inside one temp dir.
pub struct Project {
  pub temp: TempDir,
  pub config: BuildConfig,
}

impl Project {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();

    let sdk = root.join("sdk");
    for jar in ["platforms/android-24/android.jar", "tools/lib/sdklib.jar"] {
      let path = sdk.join(jar);
      fs::create_dir_all(path.parent().unwrap()).unwrap();
      fs::write(path, "").unwrap();
    }

    let config = BuildConfig {
      project_loc: root.join("myapp"),
      android_sdk_loc: sdk,
      ..BuildConfig::default()
    }
    .resolve(&root)
    .unwrap();

    let project = Self { temp, config };
    project.write_source("app/android/AndroidManifest.xml", MANIFEST_TEMPLATE);
    project
  }

  pub fn source_root(&self) -> PathBuf {
    self.config.source_root()
  }

  pub fn layout(&self) -> Layout {
    Layout::under(self.temp.path().join("tmp"))
  }

  /// Path of an intermediate android artifact.
  pub fn android_tmp(&self, name: &str) -> PathBuf {
    self.layout().build.join("android").join(name)
  }

  /// Writes a source file, dated an hour ago.
  pub fn write_source(&self, relative: &str, content: &str) -> PathBuf {
    let path = self.source_root().join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    set_mtime(&path, an_hour_ago());
    path
  }

  /// Marks a source file as modified now.
  pub fn touch_source(&self, relative: &str) {
    set_mtime(&self.source_root().join(relative), SystemTime::now());
  }

  pub fn context(&self, toolchain: &FakeToolchain, events: &Events) -> BuildContext {
    BuildContext::new(self.config.clone(), self.layout())
      .unwrap()
      .with_runner(toolchain.clone())
      .with_reporter(events.clone())
  }
}

pub fn java_class(package: &str, name: &str) -> String {
  format!("package {package};\n\npublic class {name} {{\n}}\n")
}

/// What the stages reported, in order.
#[derive(Clone, Default)]
pub struct Events {
  pub stages: Rc<RefCell<Vec<(String, StageState, usize)>>>,
  pub targets: Rc<RefCell<Vec<String>>>,
}

impl Events {
  pub fn stage(&self, name: &str) -> Option<(StageState, usize)> {
    self
      .stages
      .borrow()
      .iter()
      .rev()
      .find(|(n, _, _)| n == name)
      .map(|(_, state, units)| (*state, *units))
  }

  pub fn clear(&self) {
    self.stages.borrow_mut().clear();
    self.targets.borrow_mut().clear();
  }
}

impl Reporter for Events {
  fn report(&mut self, event: &BuildEvent<'_>) {
    match event {
      BuildEvent::TargetStarted { name, .. } => self.targets.borrow_mut().push(name.to_string()),
      BuildEvent::StageFinished { report, .. } => {
        self
          .stages
          .borrow_mut()
          .push((report.name.clone(), report.state, report.units))
      }
      BuildEvent::TargetFinished { .. } => {}
    }
  }
}

/// Stands in for the JDK and SDK tools, producing their output files.
#[derive(Clone, Default)]
pub struct FakeToolchain {
  pub commands: Rc<RefCell<Vec<ToolCommand>>>,
  /// Program whose real (non smoke test) invocations fail.
  pub failing: Option<&'static str>,
}

impl FakeToolchain {
  pub fn failing(program: &'static str) -> Self {
    Self {
      failing: Some(program),
      ..Self::default()
    }
  }

  /// Commands run for `program`, smoke tests excluded.
  pub fn runs_of(&self, program: &str) -> Vec<ToolCommand> {
    self
      .commands
      .borrow()
      .iter()
      .filter(|c| c.program_name() == program && !is_smoke_test(c))
      .cloned()
      .collect()
  }

  pub fn smoke_tests_of(&self, program: &str) -> usize {
    self
      .commands
      .borrow()
      .iter()
      .filter(|c| c.program_name() == program && is_smoke_test(c))
      .count()
  }
}

fn is_smoke_test(command: &ToolCommand) -> bool {
  let probes = ["-version", "-help", "version", "--version"];
  match command.program_name() {
    "zipalign" => command.args.is_empty(),
    _ => command.args.len() <= 3 && command.args.iter().any(|a| probes.contains(&a.as_str())),
  }
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
  let at = args.iter().position(|a| a == flag)?;
  args.get(at + 1).map(String::as_str)
}

fn argfile_lines(path: &Path) -> Vec<String> {
  fs::read_to_string(path)
    .unwrap()
    .lines()
    .map(|l| l.trim_matches('"').to_string())
    .collect()
}

fn write(path: &Path, content: &str) {
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

fn ok(stdout: String) -> io::Result<ToolOutput> {
  Ok(ToolOutput {
    code: Some(0),
    stdout,
    stderr: String::new(),
  })
}

impl FakeToolchain {
  fn javac(&self, args: &[String]) -> String {
    let out = PathBuf::from(value_after(args, "-d").unwrap());
    let sourcepath = value_after(args, "-sourcepath").unwrap();
    let translated = PathBuf::from(sourcepath.split(classpath_separator()).next().unwrap());
    let sources = args.last().unwrap().trim_start_matches('@');

    for source in argfile_lines(Path::new(sources)) {
      let source = PathBuf::from(source);
      let relative = source.strip_prefix(&translated).unwrap();
      let class = out.join(relative).with_extension("class");
      write(&class, "class");
      if fs::read_to_string(&source).unwrap().contains("class Inner") {
        let stem = class.file_stem().unwrap().to_string_lossy().into_owned();
        write(&class.with_file_name(format!("{stem}$Inner.class")), "class");
      }
    }
    String::new()
  }

  fn dx(&self, command: &ToolCommand) -> String {
    let arg = |prefix: &str| {
      command
        .args
        .iter()
        .find_map(|a| a.strip_prefix(prefix))
        .map(PathBuf::from)
        .unwrap()
    };
    let output = arg("--output=");
    let list = argfile_lines(&arg("--input-list="));

    let processed: Vec<String> = if command.args.iter().any(|a| a == "--incremental") {
      list
    } else {
      compiled_since(Path::new(&list[0]), SystemTime::UNIX_EPOCH)
        .unwrap()
        .inputs
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
    };
    write(&output, "dex");
    processed.iter().map(|p| format!("processing {p}...\n")).collect()
  }

  fn aapt(&self, args: &[String]) -> String {
    write(Path::new(value_after(args, "-F").unwrap()), "apk part");
    write(&Path::new(value_after(args, "-J").unwrap()).join("R.java"), "class R {}");
    "Generated 1 file\n".to_string()
  }

  fn javadoc(&self, args: &[String]) -> String {
    let lines = argfile_lines(Path::new(args[0].trim_start_matches('@')));
    let out = value_after(&lines, "-d").unwrap();
    write(&Path::new(out).join("index.html"), "<html/>");
    String::new()
  }
}

impl ToolRunner for FakeToolchain {
  fn run(&mut self, command: &ToolCommand) -> io::Result<ToolOutput> {
    self.commands.borrow_mut().push(command.clone());
    if is_smoke_test(command) {
      return ok(String::new());
    }
    if self.failing == Some(command.program_name()) {
      return Ok(ToolOutput {
        code: Some(1),
        stdout: String::new(),
        stderr: format!("{}: error: simulated failure", command.program_name()),
      });
    }

    let args = &command.args;
    let stdout = match command.program_name() {
      "javac" => self.javac(args),
      "dx" => self.dx(command),
      "aapt" => self.aapt(args),
      "javadoc" => self.javadoc(args),
      "java" => {
        write(Path::new(value_after(args, "com.android.sdklib.build.ApkBuilderMain").unwrap()), "apk");
        String::new()
      }
      "zipalign" => {
        write(Path::new(args.last().unwrap()), "aligned apk");
        String::new()
      }
      _ => String::new(),
    };
    ok(stdout)
  }
}
