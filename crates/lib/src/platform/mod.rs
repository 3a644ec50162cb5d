pub mod paths;

use std::io;
use std::path::{Path, PathBuf};

use crate::consts::BUNDLED_BIN_DIR;

/// The running process, as seen by the scripts it starts.
///
/// Scripts that re-invoke the interpreter must get the same binary, so the
/// interpreter path, its entry point and the bundled tool directory are
/// resolved once and handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
  exec_path: PathBuf,
  entry_point: PathBuf,
  bundled_bin_dir: PathBuf,
}

impl Host {
  pub fn new(exec_path: impl Into<PathBuf>, entry_point: impl Into<PathBuf>, bundled_bin_dir: impl Into<PathBuf>) -> Self {
    Self {
      exec_path: exec_path.into(),
      entry_point: entry_point.into(),
      bundled_bin_dir: bundled_bin_dir.into(),
    }
  }

  /// Resolves the host from the current executable.
  ///
  /// A compiled binary is its own entry point. The bundled tool directory
  /// defaults to `node-gyp-bin` next to the executable.
  pub fn current() -> io::Result<Self> {
    let exe = std::env::current_exe()?;
    let exe = dunce::canonicalize(&exe).unwrap_or(exe);
    let bundled = exe
      .parent()
      .map(|dir| dir.join(BUNDLED_BIN_DIR))
      .unwrap_or_else(|| PathBuf::from(BUNDLED_BIN_DIR));
    Ok(Self::new(exe.clone(), exe, bundled))
  }

  pub fn exec_path(&self) -> &Path {
    &self.exec_path
  }

  /// Directory holding the interpreter binary.
  pub fn exec_dir(&self) -> Option<&Path> {
    self.exec_path.parent().filter(|dir| !dir.as_os_str().is_empty())
  }

  pub fn entry_point(&self) -> &Path {
    &self.entry_point
  }

  pub fn bundled_bin_dir(&self) -> &Path {
    &self.bundled_bin_dir
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn current_host_points_at_test_binary() {
    let host = Host::current().unwrap();
    assert!(host.exec_path().is_absolute());
    assert_eq!(host.exec_path(), host.entry_point());
    assert_eq!(host.bundled_bin_dir().parent(), host.exec_dir());
  }

  #[test]
  fn bare_executable_has_no_exec_dir() {
    let host = Host::new("node", "cli.js", "/opt/gyp");
    assert_eq!(host.exec_dir(), None);
  }
}
