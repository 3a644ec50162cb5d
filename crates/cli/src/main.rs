mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use output::OutputFormat;

/// pkgrun - run package lifecycle scripts
#[derive(Parser)]
#[command(name = "pkgrun")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Flags shared by every command.
#[derive(Debug, Args)]
pub struct CommonArgs {
  /// Package directory containing package.json
  #[arg(long, default_value = ".")]
  pub cwd: PathBuf,

  /// JSON config file merged over the user config
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Set a config value (the value is parsed as JSON when possible)
  #[arg(short = 'c', long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
  pub set: Vec<(String, String)>,

  /// Override an environment variable in the script environment
  #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_value)]
  pub env: Vec<(String, String)>,

  /// Directory holding `.hooks/` (default: <cwd>/node_modules)
  #[arg(long, value_name = "DIR")]
  pub hooks_root: Option<PathBuf>,

  /// Log script and hook failures instead of failing
  #[arg(long)]
  pub continue_on_failure: bool,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a script from package.json
  Run {
    /// Script name under `scripts`
    script: String,

    /// Arguments appended to the script command line
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,

    #[command(flatten)]
    common: CommonArgs,
  },

  /// Run an arbitrary command in the package environment
  Exec {
    /// Command to run through the shell
    command: String,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,

    #[command(flatten)]
    common: CommonArgs,
  },

  /// Print the environment scripts would run with
  Env {
    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,

    #[command(flatten)]
    common: CommonArgs,
  },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
  match raw.split_once('=') {
    Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
    _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Run { script, args, common } => cmd::cmd_run(&script, &args, &common),
    Commands::Exec { command, args, common } => cmd::cmd_exec(&command, &args, &common),
    Commands::Env { format, common } => cmd::cmd_env(format, &common),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      output::report_error(&err);
      ExitCode::FAILURE
    }
  }
}
