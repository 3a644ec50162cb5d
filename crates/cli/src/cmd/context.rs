//! Loading shared by every command: the package descriptor, layered
//! configuration and the lifecycle runner.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use pkgrun_lib::consts::DEPENDENCY_DIR;
use pkgrun_lib::platform::paths;
use pkgrun_lib::{Config, ConfigValue, EnvSnapshot, Environment, Host, Lifecycle, Object, Package};

use crate::CommonArgs;

const PACKAGE_FILE: &str = "package.json";

/// Everything a command needs to run something in a package.
pub struct RunContext {
  pub package: Package,
  pub working_dir: PathBuf,
  pub lifecycle: Lifecycle<Config>,
  pub extra_env: Environment,
}

impl RunContext {
  /// Loads the package and configuration described by `args`.
  ///
  /// With `require_package` unset a missing `package.json` yields an empty
  /// descriptor.
  pub fn load(args: &CommonArgs, require_package: bool) -> Result<Self> {
    let working_dir = std::path::absolute(&args.cwd)
      .with_context(|| format!("Failed to resolve working directory {}", args.cwd.display()))?;
    let package = load_package(&working_dir, require_package)?;
    let config = load_config(args)?;
    let host = Host::current().context("Failed to resolve the running executable")?;
    let hooks_root = args
      .hooks_root
      .clone()
      .unwrap_or_else(|| working_dir.join(DEPENDENCY_DIR));

    debug!(
      pkgid = %package.id(),
      cwd = %working_dir.display(),
      hooks_root = %hooks_root.display(),
      config_keys = config.len(),
      "loaded run context"
    );

    let extra_env = args.env.iter().cloned().collect();
    Ok(Self {
      package,
      working_dir,
      lifecycle: Lifecycle::new(config, host, EnvSnapshot::capture(), hooks_root),
      extra_env,
    })
  }
}

fn load_package(dir: &Path, required: bool) -> Result<Package> {
  let path = dir.join(PACKAGE_FILE);
  if !required && !path.is_file() {
    debug!(path = %path.display(), "no package.json, using an empty descriptor");
    return Ok(Package::new(Object::new()));
  }
  let text = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
  Package::from_json_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Builds the config store: user config, then `--config`, then `--set`.
fn load_config(args: &CommonArgs) -> Result<Config> {
  let mut config = Config::new();

  if let Some(path) = paths::user_config_file().filter(|path| path.is_file()) {
    merge_config_file(&mut config, &path)?;
  }
  if let Some(path) = &args.config {
    merge_config_file(&mut config, path)?;
  }
  for (key, raw) in &args.set {
    config.set(key.clone(), parse_config_value(raw));
  }
  config.set_continue_on_failure(args.continue_on_failure);

  Ok(config)
}

fn merge_config_file(config: &mut Config, path: &Path) -> Result<()> {
  let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
  let value: Value =
    serde_json::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))?;
  config
    .merge_json(value)
    .with_context(|| format!("Invalid config {}", path.display()))?;
  debug!(path = %path.display(), "merged config file");
  Ok(())
}

/// `true`, `8080` and `{"a":1}` keep their JSON type; anything else is a string.
fn parse_config_value(raw: &str) -> ConfigValue {
  serde_json::from_str::<Value>(raw)
    .map(ConfigValue::from)
    .unwrap_or_else(|_| ConfigValue::from(raw))
}
