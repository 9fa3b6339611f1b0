pub mod os;
pub mod paths;

pub use os::Os;

/// Returns the separator between entries of a classpath (`:` on Unix, `;` on Windows).
pub fn classpath_separator() -> &'static str {
  if cfg!(windows) { ";" } else { ":" }
}

/// Joins paths into a single classpath argument.
pub fn join_classpath<I, P>(paths: I) -> String
where
  I: IntoIterator<Item = P>,
  P: AsRef<std::path::Path>,
{
  paths
    .into_iter()
    .map(|p| p.as_ref().to_string_lossy().into_owned())
    .collect::<Vec<_>>()
    .join(classpath_separator())
}
