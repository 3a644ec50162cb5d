//! Lifecycle script execution.
//!
//! [`Lifecycle::execute`] is the entry point. One call:
//! 1. assembles the executable search path for the working directory
//! 2. synthesizes the environment and overlays caller overrides
//! 3. points the temp directory at the working directory (unless `unsafe-perm`)
//! 4. runs the command through the host shell
//! 5. runs the stage hook when the environment names a stage
//!
//! Exactly one child process is live at a time; the hook never starts before
//! the main command has exited.

pub mod command;
pub mod hook;
pub mod shell;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ConfigSource;
use crate::consts::{EXECPATH_VAR, NODE_EXECPATH_VAR, NODE_VAR};
use crate::environment::{EnvCache, EnvSnapshot, Environment, synthesize};
use crate::package::Package;
use crate::platform::Host;
use crate::search_path::{self, PATH_VAR};

pub use command::run_command;
pub use hook::{hook_path, run_hook};
pub use types::{ErrorCode, ExecContext, ExitDiagnostic, LifecycleError};

/// Variables pointed at the working directory unless `unsafe-perm` is set.
#[cfg(windows)]
const TEMP_VARS: &[&str] = &["TMPDIR", "TEMP", "TMP"];

#[cfg(not(windows))]
const TEMP_VARS: &[&str] = &["TMPDIR"];

/// Per-run policy shared by the command and hook phases.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions<'a> {
  /// Shell override; `None` uses the platform default.
  pub shell: Option<&'a str>,
  /// Log failures and report success instead of failing.
  pub continue_on_failure: bool,
}

/// Runs lifecycle scripts for packages.
///
/// Holds the read-only collaborators every invocation shares: configuration,
/// the process host, the inherited environment snapshot and the hooks root.
/// Invocations do not share mutable state, except through an optional
/// caller-owned [`EnvCache`].
pub struct Lifecycle<C> {
  config: C,
  host: Host,
  snapshot: EnvSnapshot,
  hooks_root: PathBuf,
  cache: Option<Arc<EnvCache>>,
}

impl<C: ConfigSource> Lifecycle<C> {
  pub fn new(config: C, host: Host, snapshot: EnvSnapshot, hooks_root: impl Into<PathBuf>) -> Self {
    Self {
      config,
      host,
      snapshot,
      hooks_root: hooks_root.into(),
      cache: None,
    }
  }

  /// Reuses synthesized environments from `cache`, keyed by package id.
  pub fn with_cache(mut self, cache: Arc<EnvCache>) -> Self {
    self.cache = Some(cache);
    self
  }

  fn run_options(&self) -> RunOptions<'_> {
    RunOptions {
      shell: self.config.script_shell(),
      continue_on_failure: self.config.continue_on_failure(),
    }
  }

  /// Builds the context and the final environment without running anything.
  ///
  /// # Arguments
  ///
  /// * `command` - The shell command to run
  /// * `args` - Arguments appended to the command line
  /// * `package` - The package the script belongs to
  /// * `working_dir` - Directory the script runs in
  /// * `extra_env` - Overrides applied on top of the synthesized variables
  pub fn prepare(
    &self,
    command: &str,
    args: &[String],
    package: &Package,
    working_dir: &Path,
    extra_env: Option<&Environment>,
  ) -> Result<(ExecContext, Environment), LifecycleError> {
    let working_dir = resolve_working_dir(working_dir)?;
    let dirs = search_path::assemble(&working_dir, &self.host);

    let mut env = match &self.cache {
      Some(cache) => {
        let cached = cache.get_or_insert_with(&package.id(), || synthesize(package, &self.config, &self.snapshot));
        (*cached).clone()
      }
      None => synthesize(package, &self.config, &self.snapshot),
    };

    let extra_env = extra_env.cloned().unwrap_or_default();
    env.extend(extra_env.iter().map(|(k, v)| (k.clone(), v.clone())));

    let node = env
      .get(NODE_VAR)
      .filter(|node| !node.is_empty())
      .cloned()
      .unwrap_or_else(|| self.host.exec_path().to_string_lossy().into_owned());
    env.insert(NODE_VAR.to_string(), node.clone());
    env.insert(NODE_EXECPATH_VAR.to_string(), node);
    env.insert(
      EXECPATH_VAR.to_string(),
      self.host.entry_point().to_string_lossy().into_owned(),
    );

    if !self.config.unsafe_perm() {
      let tmp = working_dir.to_string_lossy().into_owned();
      for var in TEMP_VARS {
        env.insert(var.to_string(), tmp.clone());
      }
    }

    let inherited = env.get(PATH_VAR.as_str()).cloned();
    env.insert(
      PATH_VAR.clone(),
      search_path::join_search_path(&dirs, inherited.as_deref()),
    );

    let ctx = ExecContext::new(working_dir, command, args, extra_env, &env);
    debug!(pkgid = %package.id(), stage = ?ctx.stage(), vars = env.len(), "prepared lifecycle environment");
    Ok((ctx, env))
  }

  /// Runs `command` for `package` in `working_dir`, then the stage hook.
  ///
  /// # Returns
  ///
  /// `Ok(())` when the command (and the hook, if any) succeeded or when the
  /// continue policy swallowed the failure. Under the continue policy a
  /// swallowed failure is still logged at error level.
  pub async fn execute(
    &self,
    command: &str,
    args: &[String],
    package: &Package,
    working_dir: &Path,
    extra_env: Option<&Environment>,
  ) -> Result<(), LifecycleError> {
    let (ctx, env) = self.prepare(command, args, package, working_dir, extra_env)?;
    let options = self.run_options();

    run_command(&ctx, &env, package, options).await?;

    let Some(stage) = ctx.stage() else {
      return Ok(());
    };
    info!(pkgid = %package.id(), stage, "checking for stage hook");
    run_hook(stage, package, &env, ctx.working_dir(), &self.hooks_root, options).await
  }
}

fn resolve_working_dir(working_dir: &Path) -> Result<PathBuf, LifecycleError> {
  let absolute = std::path::absolute(working_dir).map_err(|source| LifecycleError::WorkingDir {
    path: working_dir.to_path_buf(),
    source,
  })?;
  Ok(dunce::simplified(&absolute).to_path_buf())
}
