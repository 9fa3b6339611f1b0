use std::fmt;

/// Operating system families that decide config locations and tool names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  MacOs,
  Windows,
}

impl Os {
  /// Detect the current operating system at runtime.
  ///
  /// Anything that is neither macOS nor Windows is treated as a generic Unix.
  pub fn current() -> Self {
    match std::env::consts::OS {
      "macos" => Self::MacOs,
      "windows" => Self::Windows,
      _ => Self::Linux,
    }
  }

  /// Returns the short tag for this OS
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "nix",
      Self::MacOs => "mac",
      Self::Windows => "win",
    }
  }

  /// File name of a build tool that ships as a batch script on Windows.
  pub fn script_name(&self, name: &str) -> String {
    match self {
      Self::Windows => format!("{}.bat", name),
      _ => name.to_string(),
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
