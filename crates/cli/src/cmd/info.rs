//! Implementation of the `apkstage info` command.

use anyhow::Result;
use serde::Serialize;

use apkstage_lib::config::BuildConfig;
use apkstage_lib::context::Layout;
use apkstage_lib::platform::Os;

use crate::cmd::ConfigArgs;
use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Serialize)]
struct Info {
  os: &'static str,
  config_file: String,
  config_file_exists: bool,
  layout: Layout,
  config: BuildConfig,
}

pub fn cmd_info(args: &ConfigArgs, output: OutputFormat) -> Result<()> {
  let config_file = args.config_file();
  let info = Info {
    os: Os::current().as_str(),
    config_file_exists: config_file.is_file(),
    config_file: config_file.display().to_string(),
    layout: Layout::standard(),
    config: args.load()?,
  };

  if output.is_json() {
    return print_json(&info);
  }

  println!("System:");
  print_stat("Platform", info.os);
  print_stat(
    "Config",
    &if info.config_file_exists {
      info.config_file.clone()
    } else {
      format!("{} (not found, using defaults)", info.config_file)
    },
  );
  print_stat("Log", &info.layout.log.display().to_string());
  print_stat("Build", &info.layout.build.display().to_string());

  let config = &info.config;
  println!();
  println!("Configuration:");
  print_stat("project_loc", &config.project_loc.display().to_string());
  print_stat("source_dir", &config.source_dir);
  print_stat("product_loc", &config.product_loc.display().to_string());
  print_stat("version", &config.version);
  print_stat("app_package_name", &config.app_package_name);
  print_stat("android_package", &config.android_package);
  print_stat("android_sdk_loc", &config.android_sdk_loc.display().to_string());
  print_stat("android_build_tools_loc", &config.android_build_tools_loc.display().to_string());
  print_stat("android_version", &config.android_version.to_string());
  print_stat("android_assert_translation", config.android_assert_translation.as_str());
  print_stat("jdk_bin_loc", &config.jdk_bin_loc.display().to_string());
  print_stat("jdk_version", &config.jdk_version);
  print_stat("java_target", &config.java_target);
  print_stat("source_exclude", &config.source_exclude.join(", "));
  print_stat("timestamp_skew_ms", &config.timestamp_skew_ms.to_string());
  if !config.targets.is_empty() {
    let names: Vec<&str> = config.targets.keys().map(String::as_str).collect();
    print_stat("targets", &names.join(", "));
  }
  Ok(())
}
