//! Stage hook execution.
//!
//! Hooks are opt-in: a stage hook runs only when `<hooks root>/.hooks/<stage>` exists.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::consts::HOOKS_DIR;
use crate::environment::Environment;
use crate::lifecycle::shell::{quote_path, spawn_shell};
use crate::lifecycle::types::LifecycleError;
use crate::lifecycle::RunOptions;
use crate::package::Package;

/// Location of the hook script for `stage`.
pub fn hook_path(hooks_root: &Path, stage: &str) -> PathBuf {
  hooks_root.join(HOOKS_DIR).join(stage)
}

/// Runs the hook for `stage` with the already synthesized `env`.
///
/// Reports success when no hook exists. A failing hook is logged with the
/// stage annotation, then either swallowed (`options.continue_on_failure`) or
/// returned as [`LifecycleError::Hook`].
pub async fn run_hook(
  stage: &str,
  package: &Package,
  env: &Environment,
  working_dir: &Path,
  hooks_root: &Path,
  options: RunOptions<'_>,
) -> Result<(), LifecycleError> {
  let hook = hook_path(hooks_root, stage);

  if tokio::fs::metadata(&hook).await.is_err() {
    debug!(stage, hook = %hook.display(), "no hook script");
    return Ok(());
  }

  let pkgid = package.id();
  info!(pkgid = %pkgid, stage, hook = %hook.display(), "running hook script");

  let line = quote_path(&hook).map_err(|source| LifecycleError::HookPath {
    pkgid: pkgid.clone(),
    stage: stage.to_string(),
    hook: hook.clone(),
    source,
  })?;

  let Err(diagnostic) = spawn_shell(&line, env, working_dir, options.shell).await else {
    return Ok(());
  };

  info!(pkgid = %pkgid, stage, %diagnostic, "Failed to exec {} hook script", stage);

  if options.continue_on_failure {
    error!(pkgid = %pkgid, stage, %diagnostic, "Failed to exec {} hook script", stage);
    error!(pkgid = %pkgid, stage, "{}.{} continuing anyway", pkgid, stage);
    return Ok(());
  }

  Err(LifecycleError::Hook {
    pkgid,
    stage: stage.to_string(),
    hook,
    diagnostic,
    pkgname: package.name(),
  })
}
