//! Source translation: copies Java sources into the translation tree, rewriting
//! assert statements on the way.

pub mod assert;

use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::AssertTranslation;
use crate::error::{BuildError, PathContext, Result};
use crate::source::SourceFile;
use crate::util::fs::ensure_dir;

/// Translates one file, replacing `dest` only once the whole file is written.
pub fn translate_file(source: &Path, dest: &Path, mode: AssertTranslation) -> Result<()> {
  let dir = dest.parent().unwrap_or(Path::new("."));
  ensure_dir(dir)?;

  let input = std::fs::File::open(source).at_path(source)?;
  let mut buffer = NamedTempFile::new_in(dir).at_path(dir)?;

  for (index, line) in BufReader::new(input).lines().enumerate() {
    let line = line.at_path(source)?;
    let rewritten = assert::rewrite_line(&line, mode).map_err(|_| BuildError::UnrecognizedPattern {
      file: source.to_path_buf(),
      line: index + 1,
      text: line.clone(),
    })?;
    writeln!(buffer, "{}", rewritten).at_path(buffer.path())?;
  }

  buffer.flush().at_path(dest)?;
  buffer.persist(dest).map_err(|e| BuildError::at(dest, e.error))?;
  debug!(source = %source.display(), dest = %dest.display(), "translated");
  Ok(())
}

/// Translates every file in `sources` to the same relative path under `out_root`.
///
/// Files named `package-*` are skipped. Returns the number of files written.
pub fn translate_all(sources: &[SourceFile], out_root: &Path, mode: AssertTranslation) -> Result<usize> {
  let mut count = 0;
  for source in sources {
    if source.file_name().starts_with("package-") {
      continue;
    }
    translate_file(&source.path, &out_root.join(&source.relative), mode)?;
    count += 1;
  }
  info!(count, mode = mode.as_str(), "translated sources");
  Ok(count)
}
