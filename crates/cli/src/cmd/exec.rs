//! Implementation of the `pkgrun exec` command.

use anyhow::{Context, Result};

use super::context::RunContext;
use crate::CommonArgs;

/// Runs `command` under the package environment.
///
/// No lifecycle stage is set unless `--env npm_lifecycle_event=<stage>` is
/// passed, so no hook runs by default.
pub fn cmd_exec(command: &str, args: &[String], common: &CommonArgs) -> Result<()> {
  let ctx = RunContext::load(common, false)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(
    ctx
      .lifecycle
      .execute(command, args, &ctx.package, &ctx.working_dir, Some(&ctx.extra_env)),
  )?;

  Ok(())
}
