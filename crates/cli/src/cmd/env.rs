//! Implementation of the `pkgrun env` command.

use anyhow::Result;

use super::context::RunContext;
use crate::CommonArgs;
use crate::output::{OutputFormat, print_json};

/// Prints the final script environment, sorted by name.
pub fn cmd_env(format: OutputFormat, common: &CommonArgs) -> Result<()> {
  let ctx = RunContext::load(common, false)?;
  let (_, env) = ctx
    .lifecycle
    .prepare("", &[], &ctx.package, &ctx.working_dir, Some(&ctx.extra_env))?;

  if format.is_json() {
    return print_json(&env);
  }
  for (key, value) in &env {
    println!("{}={}", key, value);
  }
  Ok(())
}
