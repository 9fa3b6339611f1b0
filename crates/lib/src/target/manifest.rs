//! Completion of the app manifest template.
//!
//! The template under the Android package is an ordinary `AndroidManifest.xml`
//! lacking the `package` attribute, which depends on who publishes the build. The
//! generated copy gains `package="<app_package_name>"` on its root element, and
//! its ` incomplete template ` comment is reworded.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{BuildError, PathContext, Result};

static TEMPLATE_COMMENT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"<!-- incomplete template -->").expect("comment pattern is valid"));

// Either a comment (skipped) or the root start tag; group 1 holds its attributes.
static ROOT_TAG: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?s)<!--.*?-->|<manifest((?:\s[^>]*?)?)(/?)>"#).expect("manifest pattern is valid")
});

static PACKAGE_ATTR: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"\spackage\s*=\s*("[^"]*"|'[^']*')"#).expect("package pattern is valid"));

/// Returns `template` completed for `package`, or `None` if it has no root element.
pub fn complete(template: &str, package: &str) -> Option<String> {
  let text = TEMPLATE_COMMENT.replace_all(template, "<!-- generated by build script -->");

  let root = ROOT_TAG
    .captures_iter(&text)
    .find(|caps| caps.get(1).is_some())?;
  let whole = root.get(0)?;
  let attrs = root.get(1).map_or("", |m| m.as_str());
  let close = root.get(2).map_or("", |m| m.as_str());

  let value = format!("\"{}\"", escape_attr(package));
  let attrs = if PACKAGE_ATTR.is_match(attrs) {
    PACKAGE_ATTR
      .replace(attrs, |_: &Captures| format!(" package={}", value))
      .into_owned()
  } else {
    format!("{} package={}", attrs, value)
  };

  let mut out = String::with_capacity(text.len() + package.len() + 16);
  out.push_str(&text[..whole.start()]);
  out.push_str(&format!("<manifest{}{}>", attrs, close));
  out.push_str(&text[whole.end()..]);
  Some(out)
}

/// Writes the completed manifest for `template` to `dest`.
pub fn generate(template: &Path, dest: &Path, package: &str) -> Result<()> {
  let text = std::fs::read_to_string(template).at_path(template)?;
  let completed = complete(&text, package).ok_or_else(|| BuildError::ManifestTemplate {
    path: template.to_path_buf(),
  })?;
  std::fs::write(dest, completed).at_path(dest)
}

fn escape_attr(value: &str) -> String {
  value
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('"', "&quot;")
}
