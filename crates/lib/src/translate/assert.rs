//! Line rewriting of Java `assert` statements.
//!
//! The Android runtime offers no reliable support for assertions, so each assert is
//! rewritten either to an empty statement or to an explicit `if` that throws.
//!
//! Only lines of a recognizable shape are rewritten. The assert may lead the line;
//! otherwise it must follow an `if (...)` or `else if (...)` clause, an `else`, or any
//! text ending in `{` or `;`. A line that mentions `assert` in any other way, or that
//! still mentions it after rewriting (two asserts on one line), is rejected.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::AssertTranslation;

/// Marker appended to every rewritten statement.
pub const MARKER: &str = "/*androidAssertTranslation*/";

// Groups: 1 leader, 2 condition, 3 message (optional), 4 trailer.
static ASSERT_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^((?:(?:(?:else\s+)?if\s*\([^)]*\)|else|.*[{;])\s*)?)assert ([^;:]+)(?:: ([^;]+))?;(.*)$")
    .expect("assert pattern is valid")
});

/// A line mentions `assert` in a form that cannot be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unrecognized;

/// Rewrites the assert statement on `line`, if any.
///
/// Blank lines and lines that look like comments (leading `//`, `/*` or `*`) pass
/// through untouched, as do lines that never mention `assert`.
pub fn rewrite_line(line: &str, mode: AssertTranslation) -> Result<Cow<'_, str>, Unrecognized> {
  let Some(first) = line.find(|c| c != ' ' && c != '\t') else {
    return Ok(Cow::Borrowed(line));
  };
  let (indent, body) = line.split_at(first);

  if body.starts_with("//") || body.starts_with("/*") || body.starts_with('*') {
    return Ok(Cow::Borrowed(line));
  }
  if !body.contains("assert") {
    return Ok(Cow::Borrowed(line));
  }

  let caps = ASSERT_STATEMENT.captures(body).ok_or(Unrecognized)?;
  let leader = caps.get(1).map_or("", |m| m.as_str());
  let condition = caps.get(2).map_or("", |m| m.as_str());
  let message = caps.get(3).map(|m| m.as_str());
  let trailer = caps.get(4).map_or("", |m| m.as_str());

  let statement = match mode {
    AssertTranslation::Empty => format!("{}; {}{}", leader, MARKER, trailer),
    AssertTranslation::If => {
      let throw = match message {
        Some(message) => format!("throw new AssertionError( {} );", message),
        None => "throw new AssertionError();".to_string(),
      };
      format!("{}{{ if( !( {} )) {} }}{}{}", leader, condition, throw, MARKER, trailer)
    }
  };

  let rewritten = format!("{}{}", indent, statement);
  if rewritten.contains("assert") {
    return Err(Unrecognized);
  }
  Ok(Cow::Owned(rewritten))
}
