//! Host shell selection and spawning.

use std::path::Path;
use std::process::Stdio;

use shlex::QuoteError;
use tokio::process::Command;
use tracing::debug;

use crate::environment::Environment;
use crate::lifecycle::types::ExitDiagnostic;

/// Get the shell command and argument for the current platform.
///
/// # Arguments
///
/// * `override_shell` - Optional shell from the `script-shell` config key
///
/// # Returns
///
/// A tuple of (shell_command, shell_arguments), the arguments ending with the
/// flag that introduces the command line (e.g., "-c" for sh).
pub fn get_shell(override_shell: Option<&str>) -> (String, Vec<String>) {
  if let Some(shell) = override_shell {
    let name = Path::new(shell)
      .file_stem()
      .and_then(|stem| stem.to_str())
      .unwrap_or(shell)
      .to_lowercase();
    let args = if name == "powershell" || name == "pwsh" {
      vec!["-NoProfile".to_string(), "-Command".to_string()]
    } else if name == "cmd" {
      vec!["/d".to_string(), "/s".to_string(), "/c".to_string()]
    } else {
      // Assume Unix-style shell (bash, sh, zsh, etc.)
      vec!["-c".to_string()]
    };
    return (shell.to_string(), args);
  }

  #[cfg(unix)]
  {
    ("/bin/sh".to_string(), vec!["-c".to_string()])
  }

  #[cfg(windows)]
  {
    ("cmd".to_string(), vec!["/c".to_string()])
  }
}

/// Quotes a file path so the shell runs it as a single word.
#[cfg(unix)]
pub fn quote_path(path: &Path) -> Result<String, QuoteError> {
  shlex::try_quote(&path.to_string_lossy()).map(|quoted| quoted.into_owned())
}

#[cfg(windows)]
pub fn quote_path(path: &Path) -> Result<String, QuoteError> {
  Ok(format!("\"{}\"", path.display()))
}

/// Runs `line` through the shell with exactly `env`, inheriting stdio.
///
/// The inherited process environment is cleared; `env` already carries the
/// snapshot it was synthesized from. Output is never captured.
pub async fn spawn_shell(
  line: &str,
  env: &Environment,
  working_dir: &Path,
  override_shell: Option<&str>,
) -> Result<(), ExitDiagnostic> {
  let (shell_cmd, shell_args) = get_shell(override_shell);

  let mut command = Command::new(&shell_cmd);
  command
    .args(&shell_args)
    .arg(line)
    .current_dir(working_dir)
    .env_clear()
    .envs(env)
    .stdin(Stdio::inherit())
    .stdout(Stdio::inherit())
    .stderr(Stdio::inherit());

  debug!(shell = %shell_cmd, working_dir = ?working_dir, "spawning process");

  match command.status().await {
    Ok(status) => ExitDiagnostic::check(status),
    Err(err) => Err(ExitDiagnostic::spawn(&err)),
  }
}
