//! Timestamp comparison: the sole primitive behind every staleness decision.
//!
//! An output is stale iff it is missing or its modification time is strictly
//! earlier than that of its input. Equal times count as fresh.

use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Returns true if an output written at `output` no longer reflects an input
/// last modified at `input`.
pub fn is_stale(input: SystemTime, output: SystemTime) -> bool {
  output < input
}

/// Like [`is_stale`], reading the output time from the filesystem.
///
/// A missing `output` is always stale.
pub fn is_stale_path(input: SystemTime, output: &Path) -> io::Result<bool> {
  match std::fs::metadata(output) {
    Ok(meta) => Ok(is_stale(input, meta.modified()?)),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
    Err(e) => Err(e),
  }
}

/// A positive tolerance added to a producer's previous output time before comparing
/// it against units produced since.
///
/// Units written in the same clock tick as the previous output are not produced
/// since it. Filesystems with coarse timestamps need more than the default 1 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Skew(Duration);

impl Skew {
  pub fn from_millis(ms: u64) -> Self {
    Skew(Duration::from_millis(ms))
  }

  pub fn as_duration(&self) -> Duration {
    self.0
  }

  /// The earliest modification time that counts as "produced after" `previous`.
  pub fn threshold(&self, previous: SystemTime) -> SystemTime {
    previous + self.0
  }
}

impl Default for Skew {
  fn default() -> Self {
    Skew::from_millis(1)
  }
}
