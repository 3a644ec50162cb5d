//! Names shared across the crate.

pub const APP_NAME: &str = "pkgrun";

/// Prefix owned by the lifecycle; inherited variables carrying it are never passed through.
pub const LIFECYCLE_NAMESPACE: &str = "npm_";

pub const PACKAGE_PREFIX: &str = "npm_package_";
pub const CONFIG_PREFIX: &str = "npm_config_";
pub const PACKAGE_CONFIG_PREFIX: &str = "npm_package_config_";

pub const LIFECYCLE_EVENT_VAR: &str = "npm_lifecycle_event";
pub const LIFECYCLE_SCRIPT_VAR: &str = "npm_lifecycle_script";
pub const NODE_VAR: &str = "NODE";
pub const NODE_EXECPATH_VAR: &str = "npm_node_execpath";
pub const EXECPATH_VAR: &str = "npm_execpath";

/// Directory segment marking one level of the dependency tree.
pub const DEPENDENCY_DIR: &str = "node_modules";
pub const BIN_DIR: &str = ".bin";
pub const HOOKS_DIR: &str = ".hooks";
pub const BUNDLED_BIN_DIR: &str = "node-gyp-bin";

/// Fields never exported from a descriptor, at any depth.
pub const EXCLUDED_FIELDS: &[&str] = &["readme"];

/// Well-known configuration keys.
pub mod keys {
  pub const UNSAFE_PERM: &str = "unsafe-perm";
  pub const TEST_REPORTING: &str = "npat";
  pub const PRODUCTION: &str = "production";
  pub const SCRIPT_SHELL: &str = "script-shell";
}
