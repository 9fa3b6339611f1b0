//! `apkstage build` with the targets that need no Android toolchain.

use predicates::prelude::*;

use super::common::{TestEnv, file_text};

fn with_sources() -> TestEnv {
  let env = TestEnv::new();
  env.write_file("src/a/One.java", "package a;\nclass One {}\n");
  env.write_file("src/a/b/Two.java", "package a.b;\nclass Two {}\n");
  env
}

#[test]
fn source_target_copies_the_tree_into_the_product() {
  let env = with_sources();

  env
    .apkstage_cmd()
    .args(["build", "source"])
    .assert()
    .success()
    .stdout(predicate::str::contains("copy: succeeded"));

  assert!(env.exists("myapp-0.0/src/a/One.java"));
  assert!(env.exists("myapp-0.0/src/a/b/Two.java"));
}

#[test]
fn second_build_reports_nothing_to_do() {
  let env = with_sources();
  env.apkstage_cmd().args(["build", "source"]).assert().success();

  env
    .apkstage_cmd()
    .args(["build", "source"])
    .assert()
    .success()
    .stdout(predicate::str::contains("copy: skipped"))
    .stdout(predicate::str::contains("Everything up to date"));
}

#[test]
fn clean_removes_the_product() {
  let env = with_sources();
  env.apkstage_cmd().args(["build", "source"]).assert().success();
  assert!(env.exists("myapp-0.0"));

  env
    .apkstage_cmd()
    .args(["build", "clean"])
    .assert()
    .success()
    .stdout(predicate::str::contains("product: succeeded"));
  assert!(!env.exists("myapp-0.0"));
}

#[test]
fn android_without_sdk_names_the_setting() {
  let env = with_sources();
  env.write_file("src/app/android/AndroidManifest.xml", "<manifest/>\n");

  env
    .apkstage_cmd()
    .args(["build", "android"])
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("android.jar"))
    .stderr(predicate::str::contains("android_sdk_loc"));
}

#[test]
fn android_without_manifest_template_fails() {
  let env = with_sources();

  env
    .apkstage_cmd()
    .args(["build", "android"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("manifest template"));
}

#[cfg(unix)]
#[test]
fn custom_target_runs_shell_commands_in_the_project() {
  let env = with_sources();
  let config = env.write_file(
    "build.lua",
    r#"
return {
  targets = {
    stamp = { commands = { "echo built > stamp.txt" }, depends = { "source" } },
  },
}
"#,
  );

  env
    .apkstage_cmd()
    .args(["--config", config.to_str().unwrap(), "build", "stamp"])
    .assert()
    .success();

  assert!(env.exists("myapp-0.0/src/a/One.java"));
  assert_eq!(file_text(&env.project_path().join("stamp.txt")).trim(), "built");

  let log = file_text(&env.log_path());
  assert!(log.contains("echo built > stamp.txt"));
  assert!(log.contains("Exit value = 0"));
}

#[cfg(unix)]
#[test]
fn failing_custom_command_exits_nonzero() {
  let env = with_sources();
  let config = env.write_file(
    "build.lua",
    r#"return { targets = { broken = { commands = { "echo oops >&2; exit 3" } } } }"#,
  );

  env
    .apkstage_cmd()
    .args(["--config", config.to_str().unwrap(), "build", "broken"])
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("oops"));
}
