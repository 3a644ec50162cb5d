//! Implementation of the `pkgrun run` command.
//!
//! Looks up `scripts.<name>` in the package descriptor and runs it as a
//! lifecycle stage, so the matching `.hooks/<name>` hook runs afterwards.

use std::time::Instant;

use anyhow::{Context, Result, bail};

use pkgrun_lib::consts::{LIFECYCLE_EVENT_VAR, LIFECYCLE_SCRIPT_VAR};

use super::context::RunContext;
use crate::CommonArgs;
use crate::output::{format_duration, print_info, print_stat, print_success, print_warning};

pub fn cmd_run(script: &str, args: &[String], common: &CommonArgs) -> Result<()> {
  let mut ctx = RunContext::load(common, true)?;

  let Some(command) = ctx.package.script(script) else {
    let available = ctx.package.script_names();
    if available.is_empty() {
      print_warning(&format!("{} defines no scripts", ctx.package.id()));
    } else {
      print_info("Available scripts:");
      for name in &available {
        print_stat(name, &ctx.package.script(name).unwrap_or_default());
      }
    }
    bail!("Missing script: {}", script);
  };

  ctx.extra_env.insert(LIFECYCLE_EVENT_VAR.to_string(), script.to_string());
  ctx.extra_env.insert(LIFECYCLE_SCRIPT_VAR.to_string(), command.clone());

  let started = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(
    ctx
      .lifecycle
      .execute(&command, args, &ctx.package, &ctx.working_dir, Some(&ctx.extra_env)),
  )?;

  print_success(&format!(
    "{} {} finished in {}",
    ctx.package.id(),
    script,
    format_duration(started.elapsed())
  ));
  Ok(())
}
