//! Executable search path assembly.
//!
//! A script running inside a nested dependency tree sees, in order:
//! 1. the bundled native-addon builder directory
//! 2. the directory of the running interpreter
//! 3. `node_modules/.bin` of the package itself, then of each ancestor, innermost first
//! 4. the inherited path

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use crate::consts::{BIN_DIR, DEPENDENCY_DIR};
use crate::platform::Host;

/// Name of the executable search path variable, resolved once per process.
///
/// Windows does not guarantee the casing of `PATH`, so the inherited spelling
/// wins there, defaulting to `Path`.
pub static PATH_VAR: LazyLock<String> = LazyLock::new(resolve_path_var);

#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: &str = ";";

#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: &str = ":";

#[cfg(windows)]
fn resolve_path_var() -> String {
  std::env::vars_os()
    .filter_map(|(key, _)| key.into_string().ok())
    .filter(|key| key.eq_ignore_ascii_case("PATH"))
    .last()
    .unwrap_or_else(|| "Path".to_string())
}

#[cfg(not(windows))]
fn resolve_path_var() -> String {
  "PATH".to_string()
}

/// Splits `dir` on `node_modules` segments.
///
/// Returns the root prefix and the package directory below each marker, which
/// may span several segments (`@scope/name`) or be empty when `dir` ends in
/// `node_modules`.
fn split_dependency_levels(dir: &Path) -> (PathBuf, Vec<PathBuf>) {
  let mut root = PathBuf::new();
  let mut levels: Vec<PathBuf> = Vec::new();

  for component in dir.components() {
    match component {
      Component::Normal(segment) if segment == DEPENDENCY_DIR => levels.push(PathBuf::new()),
      other => match levels.last_mut() {
        Some(level) => level.push(other),
        None => root.push(other),
      },
    }
  }

  (root, levels)
}

/// Computes the ordered binary directories for a script running in `working_dir`.
///
/// `working_dir` is taken lexically; callers pass an absolute path.
pub fn assemble(working_dir: &Path, host: &Host) -> Vec<PathBuf> {
  let (mut acc, levels) = split_dependency_levels(working_dir);
  let mut dirs = VecDeque::with_capacity(levels.len() + 3);

  for level in levels {
    dirs.push_front(acc.join(DEPENDENCY_DIR).join(BIN_DIR));
    acc = acc.join(DEPENDENCY_DIR).join(level);
  }
  dirs.push_front(acc.join(DEPENDENCY_DIR).join(BIN_DIR));

  if let Some(exec_dir) = host.exec_dir() {
    dirs.push_front(exec_dir.to_path_buf());
  }
  dirs.push_front(host.bundled_bin_dir().to_path_buf());

  dirs.into()
}

/// Joins `dirs` with the host separator, appending a non-empty `inherited` path verbatim.
pub fn join_search_path(dirs: &[PathBuf], inherited: Option<&str>) -> String {
  let mut entries: Vec<OsString> = dirs.iter().map(|dir| dir.as_os_str().to_owned()).collect();
  if let Some(inherited) = inherited.filter(|path| !path.is_empty()) {
    entries.push(OsString::from(inherited));
  }
  entries
    .iter()
    .map(|entry| entry.to_string_lossy())
    .collect::<Vec<_>>()
    .join(PATH_LIST_SEPARATOR)
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use super::*;

  fn host() -> Host {
    Host::new("/usr/local/bin/node", "/usr/local/lib/cli.js", "/usr/local/lib/node-gyp-bin")
  }

  fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
  }

  #[test]
  fn nested_tree_orders_innermost_first() {
    let dirs = assemble(Path::new("/a/node_modules/b/node_modules/c"), &host());

    assert_eq!(
      dirs,
      paths(&[
        "/usr/local/lib/node-gyp-bin",
        "/usr/local/bin",
        "/a/node_modules/b/node_modules/c/node_modules/.bin",
        "/a/node_modules/b/node_modules/.bin",
        "/a/node_modules/.bin",
      ])
    );
  }

  #[test]
  fn top_level_package_has_single_bin_dir() {
    let dirs = assemble(Path::new("/work/app"), &host());

    assert_eq!(
      dirs,
      paths(&["/usr/local/lib/node-gyp-bin", "/usr/local/bin", "/work/app/node_modules/.bin"])
    );
  }

  #[test]
  fn scoped_package_levels_span_two_segments() {
    let dirs = assemble(Path::new("/app/node_modules/@scope/pkg"), &host());

    assert_eq!(dirs[2], PathBuf::from("/app/node_modules/@scope/pkg/node_modules/.bin"));
    assert_eq!(dirs[3], PathBuf::from("/app/node_modules/.bin"));
  }

  #[test]
  fn trailing_marker_adds_empty_level() {
    let dirs = assemble(Path::new("/app/node_modules"), &host());

    assert_eq!(dirs[2], PathBuf::from("/app/node_modules/node_modules/.bin"));
    assert_eq!(dirs[3], PathBuf::from("/app/node_modules/.bin"));
  }

  #[test]
  fn inherited_path_goes_last() {
    let dirs = paths(&["/x/.bin", "/y/.bin"]);

    assert_eq!(join_search_path(&dirs, Some("/usr/bin:/bin")), "/x/.bin:/y/.bin:/usr/bin:/bin");
    assert_eq!(join_search_path(&dirs, Some("")), "/x/.bin:/y/.bin");
    assert_eq!(join_search_path(&dirs, None), "/x/.bin:/y/.bin");
  }

  #[test]
  fn path_var_is_uppercase_on_unix() {
    assert_eq!(PATH_VAR.as_str(), "PATH");
  }
}
