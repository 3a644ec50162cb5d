//! Test utilities for pkgrun-lib.
//!
//! Helpers for tests that run real shell commands against a temp directory.

use std::path::Path;

use crate::package::{Object, Package};

/// A small descriptor with a stable `_id`.
pub fn test_package() -> Package {
  Package::new(
    Object::new()
      .with("_id", "demo@1.0.0")
      .with("name", "demo")
      .with("version", "1.0.0")
      .with("description", "demo package"),
  )
}

/// Returns a shell redirect that writes a command's stdout to `path`.
#[cfg(unix)]
pub fn echo_to_file(path: &Path) -> String {
  format!("> '{}'", path.display())
}

#[cfg(windows)]
pub fn echo_to_file(path: &Path) -> String {
  format!("> \"{}\"", path.display())
}

/// Writes an executable hook script at `<root>/.hooks/<stage>`.
#[cfg(unix)]
pub fn write_hook(root: &Path, stage: &str, body: &str) {
  use std::os::unix::fs::PermissionsExt;

  let dir = root.join(crate::consts::HOOKS_DIR);
  std::fs::create_dir_all(&dir).unwrap();
  let hook = dir.join(stage);
  std::fs::write(&hook, format!("#!/bin/sh\n{body}\n")).unwrap();
  std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755)).unwrap();
}
