//! The android pipeline end to end, driven by the scripted toolchain.

use std::fs;
use std::thread::sleep;
use std::time::Duration;

use apkstage_lib::config::AssertTranslation;
use apkstage_lib::error::BuildError;
use apkstage_lib::stage::StageState;
use apkstage_lib::target::android::{AndroidPaths, source_diff};
use apkstage_lib::target::build_targets;
use apkstage_lib::translate::assert::MARKER;

use super::common::{Events, FakeToolchain, Project, java_class};

const ANDROID_STAGES: [&str; 6] = ["package-partial", "translate", "compile", "dex", "package-full", "align"];

const WITH_INNER: &str = "package a;\n\npublic class Two {\n  static class Inner {\n  }\n}\n";

fn android() -> Vec<String> {
  vec!["android".to_string()]
}

fn two_class_project() -> Project {
  let project = Project::new();
  project.write_source("a/One.java", &java_class("a", "One"));
  project.write_source("a/Two.java", WITH_INNER);
  project
}

#[test]
fn first_build_runs_every_stage() {
  let project = two_class_project();
  let tools = FakeToolchain::default();
  let events = Events::default();
  let mut ctx = project.context(&tools, &events);

  assert!(build_targets(&mut ctx, &android()).unwrap());

  assert_eq!(events.stage("package-partial"), Some((StageState::Succeeded, 1)));
  assert_eq!(events.stage("translate"), Some((StageState::Succeeded, 2)));
  // Two$Inner.class is compiled and dexed but not counted
  assert_eq!(events.stage("compile"), Some((StageState::Succeeded, 2)));
  assert_eq!(events.stage("dex"), Some((StageState::Succeeded, 2)));
  assert_eq!(events.stage("package-full"), Some((StageState::Succeeded, 1)));
  assert_eq!(events.stage("align"), Some((StageState::Succeeded, 1)));

  assert!(project.config.product_loc.join("app.apk").is_file());
  assert!(project.android_tmp("javacOut/a/Two$Inner.class").is_file());

  let manifest = fs::read_to_string(project.android_tmp("AndroidManifest.xml")).unwrap();
  assert!(manifest.contains(r#"package="com.example.app""#));
  assert!(manifest.contains("generated by build script"));

  let dx = tools.runs_of("dx");
  assert_eq!(dx.len(), 1);
  assert!(!dx[0].args.iter().any(|a| a == "--incremental"));
}

#[test]
fn second_build_is_a_no_op() {
  let project = two_class_project();
  let tools = FakeToolchain::default();
  let events = Events::default();
  build_targets(&mut project.context(&tools, &events), &android()).unwrap();

  events.clear();
  let mut ctx = project.context(&tools, &events);
  assert!(!build_targets(&mut ctx, &android()).unwrap());

  for stage in ANDROID_STAGES {
    assert_eq!(events.stage(stage), Some((StageState::Skipped, 0)), "{stage}");
  }
  assert_eq!(tools.runs_of("javac").len(), 1);
  assert_eq!(tools.runs_of("dx").len(), 1);
}

#[test]
fn touched_source_is_recompiled_and_dexed_incrementally() {
  let project = two_class_project();
  let tools = FakeToolchain::default();
  let events = Events::default();
  build_targets(&mut project.context(&tools, &events), &android()).unwrap();

  sleep(Duration::from_millis(20));
  project.touch_source("a/One.java");
  events.clear();
  assert!(build_targets(&mut project.context(&tools, &events), &android()).unwrap());

  assert_eq!(events.stage("package-partial"), Some((StageState::Skipped, 0)));
  assert_eq!(events.stage("translate"), Some((StageState::Succeeded, 1)));
  assert_eq!(events.stage("compile"), Some((StageState::Succeeded, 1)));
  assert_eq!(events.stage("dex"), Some((StageState::Succeeded, 1)));
  assert_eq!(events.stage("align"), Some((StageState::Succeeded, 1)));

  let sources = fs::read_to_string(project.android_tmp("javacSourceArg")).unwrap();
  assert_eq!(sources.lines().count(), 1);
  assert!(sources.trim_end().ends_with("One.java"));

  let dx = tools.runs_of("dx");
  assert!(dx[1].args.iter().any(|a| a == "--incremental"));
  assert_eq!(dx[1].cwd.as_deref(), Some(project.android_tmp("javacOut").as_path()));
  let listed = fs::read_to_string(project.android_tmp("classesIn")).unwrap();
  assert_eq!(listed.lines().collect::<Vec<_>>(), vec!["a/One.class"]);
}

#[test]
fn deleted_source_leaves_an_orphan_without_failing() {
  let project = two_class_project();
  let tools = FakeToolchain::default();
  build_targets(&mut project.context(&tools, &Events::default()), &android()).unwrap();

  fs::remove_file(project.source_root().join("a/Two.java")).unwrap();
  let events = Events::default();
  let mut ctx = project.context(&tools, &events);
  assert!(!build_targets(&mut ctx, &android()).unwrap());
  assert_eq!(events.stage("compile"), Some((StageState::Skipped, 0)));

  let diff = source_diff(&ctx, &AndroidPaths::new(&ctx)).unwrap();
  assert!(diff.is_empty());
  assert_eq!(diff.unchanged, 1);
  assert_eq!(diff.orphaned, 1);
}

#[test]
fn excluded_directories_are_not_scanned() {
  let mut project = two_class_project();
  project.config.source_exclude = vec!["experimental/".to_string()];
  // Would be rejected by the assert rewriter if it were ever read.
  project.write_source(
    "experimental/Broken.java",
    "package experimental;\nclass Broken {\n  String word = \"assert\";\n}\n",
  );

  let tools = FakeToolchain::default();
  build_targets(&mut project.context(&tools, &Events::default()), &android()).unwrap();

  assert!(!project.android_tmp("jtransSourceOut/experimental").exists());
  assert!(!project.android_tmp("javacOut/experimental").exists());
}

#[test]
fn asserts_become_explicit_checks() {
  let project = Project::new();
  project.write_source(
    "a/Counter.java",
    "package a;\nclass Counter {\n  void check(int count) {\n    assert count > 0 : \"empty\";\n  }\n}\n",
  );

  let tools = FakeToolchain::default();
  build_targets(&mut project.context(&tools, &Events::default()), &android()).unwrap();

  let translated = fs::read_to_string(project.android_tmp("jtransSourceOut/a/Counter.java")).unwrap();
  assert!(translated.contains("{ if( !( count > 0"));
  assert!(translated.contains("throw new AssertionError( \"empty\" ); }"));
  assert!(translated.contains(MARKER));
  assert!(!translated.contains("assert "));
}

#[test]
fn release_config_compiles_asserts_out() {
  let mut project = Project::new();
  project.config.android_assert_translation = AssertTranslation::Empty;
  project.write_source(
    "a/Counter.java",
    "package a;\nclass Counter {\n  void check(int count) {\n    assert count > 0;\n  }\n}\n",
  );

  let tools = FakeToolchain::default();
  build_targets(&mut project.context(&tools, &Events::default()), &android()).unwrap();

  let translated = fs::read_to_string(project.android_tmp("jtransSourceOut/a/Counter.java")).unwrap();
  assert!(translated.contains(&format!("    ; {MARKER}")));
  assert!(!translated.contains("AssertionError"));
}

#[test]
fn unrecognized_assert_stops_before_compiling() {
  let project = Project::new();
  let source = project.write_source(
    "a/Odd.java",
    "package a;\nclass Odd {\n  int x;\n  String word = \"assert\";\n}\n",
  );

  let tools = FakeToolchain::default();
  let events = Events::default();
  let err = build_targets(&mut project.context(&tools, &events), &android()).unwrap_err();

  match err {
    BuildError::UnrecognizedPattern { file, line, .. } => {
      assert_eq!(file, source);
      assert_eq!(line, 4);
    }
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(events.stage("translate"), Some((StageState::Failed, 0)));
  assert_eq!(events.stage("compile"), None);
  assert!(tools.runs_of("javac").is_empty());
}

#[test]
fn compiler_failure_aborts_remaining_stages() {
  let project = two_class_project();
  let tools = FakeToolchain::failing("javac");
  let events = Events::default();

  let err = build_targets(&mut project.context(&tools, &events), &android()).unwrap_err();
  match err {
    BuildError::ToolFailed { code, stderr, .. } => {
      assert_eq!(code, Some(1));
      assert!(stderr.contains("simulated failure"));
    }
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(events.stage("compile"), Some((StageState::Failed, 0)));
  assert_eq!(events.stage("dex"), None);
  assert!(tools.runs_of("dx").is_empty());

  let log = fs::read_to_string(project.layout().log).unwrap();
  assert!(log.contains("Exit value = 1"));
  assert!(log.contains("simulated failure"));
}

#[test]
fn missing_platform_jar_names_the_config_keys() {
  let project = two_class_project();
  fs::remove_file(project.config.android_sdk_loc.join("platforms/android-24/android.jar")).unwrap();

  let err = build_targets(
    &mut project.context(&FakeToolchain::default(), &Events::default()),
    &android(),
  )
  .unwrap_err();
  match err {
    BuildError::MissingDependency { path, hint, .. } => {
      assert!(path.ends_with("android.jar"));
      assert!(hint.contains("android_sdk_loc"));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn each_tool_is_smoke_tested_once_per_run() {
  let project = two_class_project();
  let tools = FakeToolchain::default();
  let mut ctx = project.context(&tools, &Events::default());

  build_targets(&mut ctx, &["android".to_string(), "javadoc".to_string()]).unwrap();

  assert_eq!(tools.smoke_tests_of("javac"), 1);
  assert_eq!(tools.smoke_tests_of("aapt"), 1);
  // dx and zipalign share aapt's build-tools key
  assert_eq!(tools.smoke_tests_of("dx"), 0);
  assert_eq!(tools.smoke_tests_of("zipalign"), 0);
  // java and javadoc ride on javac's jdk_bin_loc test
  assert_eq!(tools.smoke_tests_of("java"), 0);
  assert_eq!(tools.smoke_tests_of("javadoc"), 0);
}
