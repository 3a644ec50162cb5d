//! Main command execution.

use tracing::{error, info};

use crate::environment::Environment;
use crate::lifecycle::shell::spawn_shell;
use crate::lifecycle::types::{ExecContext, LifecycleError};
use crate::lifecycle::RunOptions;
use crate::package::Package;

/// Runs the context's command once under `env`.
///
/// A failure is swallowed (logged, then reported as success) when
/// `options.continue_on_failure` is set; otherwise it becomes
/// [`LifecycleError::Script`].
pub async fn run_command(
  ctx: &ExecContext,
  env: &Environment,
  package: &Package,
  options: RunOptions<'_>,
) -> Result<(), LifecycleError> {
  let pkgid = package.id();
  let line = ctx.command_line();
  // The stage names the script when there is one.
  let label = ctx.stage().unwrap_or(ctx.command());

  info!(pkgid = %pkgid, "> {} {} {}", pkgid, label, ctx.working_dir().display());
  info!(pkgid = %pkgid, "> {}", line);

  let Err(diagnostic) = spawn_shell(&line, env, ctx.working_dir(), options.shell).await else {
    return Ok(());
  };

  if options.continue_on_failure {
    error!(pkgid = %pkgid, cmd = label, "{}.{} {}", pkgid, label, diagnostic);
    error!(pkgid = %pkgid, cmd = label, "{}.{} continuing anyway", pkgid, label);
    return Ok(());
  }

  info!(pkgid = %pkgid, "Failed to exec {} script", label);

  Err(LifecycleError::Script {
    code: diagnostic.error_code(),
    pkgid,
    command: label.to_string(),
    line,
    diagnostic,
    script: ctx.stage().map(str::to_string),
    pkgname: package.name(),
  })
}
