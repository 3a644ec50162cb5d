//! Types for lifecycle execution.
//!
//! This module defines the execution context, the exit diagnostics and the
//! error type reported to callers.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

use crate::consts::LIFECYCLE_EVENT_VAR;
use crate::environment::Environment;

/// Classified failure kind, as exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
  /// The script ran and failed.
  Lifecycle,
  /// The operating system refused to start it.
  Permission,
}

impl ErrorCode {
  pub fn as_str(&self) -> &'static str {
    match self {
      ErrorCode::Lifecycle => "ELIFECYCLE",
      ErrorCode::Permission => "EPERM",
    }
  }
}

impl fmt::Display for ErrorCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Why a child process did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitDiagnostic {
  /// Exited with a non-zero code.
  Code(i32),
  /// Killed by a signal (Unix only).
  Signal(i32),
  /// Could not be started at all.
  Spawn { kind: io::ErrorKind, message: String },
}

impl ExitDiagnostic {
  /// Maps an exit status; `Ok` for a successful exit.
  pub fn check(status: ExitStatus) -> Result<(), Self> {
    if status.success() {
      return Ok(());
    }
    if let Some(code) = status.code() {
      return Err(ExitDiagnostic::Code(code));
    }
    #[cfg(unix)]
    {
      use std::os::unix::process::ExitStatusExt;
      if let Some(signal) = status.signal() {
        return Err(ExitDiagnostic::Signal(signal));
      }
    }
    Err(ExitDiagnostic::Code(-1))
  }

  pub fn spawn(err: &io::Error) -> Self {
    ExitDiagnostic::Spawn {
      kind: err.kind(),
      message: err.to_string(),
    }
  }

  /// `EPERM` for permission failures, `ELIFECYCLE` otherwise.
  pub fn error_code(&self) -> ErrorCode {
    match self {
      ExitDiagnostic::Spawn {
        kind: io::ErrorKind::PermissionDenied,
        ..
      } => ErrorCode::Permission,
      _ => ErrorCode::Lifecycle,
    }
  }
}

impl fmt::Display for ExitDiagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExitDiagnostic::Code(code) => write!(f, "exited with code {code}"),
      ExitDiagnostic::Signal(signal) => write!(f, "terminated by signal {signal}"),
      ExitDiagnostic::Spawn { message, .. } => write!(f, "could not be started: {message}"),
    }
  }
}

/// Errors reported by the orchestrator.
#[derive(Debug, Error)]
pub enum LifecycleError {
  /// The main command failed.
  #[error("{pkgid} {command}: `{line}` {diagnostic}")]
  Script {
    code: ErrorCode,
    pkgid: String,
    command: String,
    line: String,
    diagnostic: ExitDiagnostic,
    script: Option<String>,
    pkgname: Option<String>,
  },

  /// The stage hook failed after the main command succeeded.
  #[error("{pkgid} {stage} hook `{}` {diagnostic}\nFailed to exec {stage} hook script", hook.display())]
  Hook {
    pkgid: String,
    stage: String,
    hook: PathBuf,
    diagnostic: ExitDiagnostic,
    pkgname: Option<String>,
  },

  /// The hook path cannot be written as a shell word.
  #[error("{pkgid} {stage} hook `{}` cannot be quoted: {source}", hook.display())]
  HookPath {
    pkgid: String,
    stage: String,
    hook: PathBuf,
    #[source]
    source: shlex::QuoteError,
  },

  /// The working directory could not be resolved.
  #[error("invalid working directory {}: {source}", path.display())]
  WorkingDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl LifecycleError {
  pub fn code(&self) -> ErrorCode {
    match self {
      LifecycleError::Script { code, .. } => *code,
      LifecycleError::Hook { diagnostic, .. } => diagnostic.error_code(),
      LifecycleError::WorkingDir { source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
        ErrorCode::Permission
      }
      LifecycleError::HookPath { .. } | LifecycleError::WorkingDir { .. } => ErrorCode::Lifecycle,
    }
  }

  pub fn pkgid(&self) -> Option<&str> {
    match self {
      LifecycleError::Script { pkgid, .. }
      | LifecycleError::Hook { pkgid, .. }
      | LifecycleError::HookPath { pkgid, .. } => Some(pkgid),
      LifecycleError::WorkingDir { .. } => None,
    }
  }

  /// The lifecycle stage (script name) that failed.
  pub fn script(&self) -> Option<&str> {
    match self {
      LifecycleError::Script { script, .. } => script.as_deref(),
      LifecycleError::Hook { stage, .. } | LifecycleError::HookPath { stage, .. } => Some(stage),
      LifecycleError::WorkingDir { .. } => None,
    }
  }

  pub fn pkgname(&self) -> Option<&str> {
    match self {
      LifecycleError::Script { pkgname, .. } | LifecycleError::Hook { pkgname, .. } => pkgname.as_deref(),
      LifecycleError::HookPath { .. } | LifecycleError::WorkingDir { .. } => None,
    }
  }

  /// The command line that failed, for main-command failures.
  pub fn command_line(&self) -> Option<&str> {
    match self {
      LifecycleError::Script { line, .. } => Some(line),
      _ => None,
    }
  }
}

/// Everything one orchestrator call runs with. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecContext {
  working_dir: PathBuf,
  command: String,
  args: Vec<String>,
  extra_env: Environment,
  stage: Option<String>,
}

impl ExecContext {
  /// Builds the context, taking the stage from `env`'s `npm_lifecycle_event`.
  pub fn new(
    working_dir: impl Into<PathBuf>,
    command: impl Into<String>,
    args: &[String],
    extra_env: Environment,
    env: &Environment,
  ) -> Self {
    Self {
      working_dir: working_dir.into(),
      command: command.into(),
      args: args.to_vec(),
      extra_env,
      stage: env.get(LIFECYCLE_EVENT_VAR).filter(|stage| !stage.is_empty()).cloned(),
    }
  }

  pub fn working_dir(&self) -> &Path {
    &self.working_dir
  }

  pub fn command(&self) -> &str {
    &self.command
  }

  pub fn args(&self) -> &[String] {
    &self.args
  }

  pub fn extra_env(&self) -> &Environment {
    &self.extra_env
  }

  pub fn stage(&self) -> Option<&str> {
    self.stage.as_deref()
  }

  /// Command and arguments joined into one shell line.
  pub fn command_line(&self) -> String {
    std::iter::once(self.command.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn permission_spawn_failures_keep_eperm() {
    let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
    assert_eq!(ExitDiagnostic::spawn(&denied).error_code(), ErrorCode::Permission);

    let missing = io::Error::new(io::ErrorKind::NotFound, "missing");
    assert_eq!(ExitDiagnostic::spawn(&missing).error_code(), ErrorCode::Lifecycle);
    assert_eq!(ExitDiagnostic::Code(2).error_code(), ErrorCode::Lifecycle);
  }

  #[test]
  fn script_error_message_names_package_and_command() {
    let err = LifecycleError::Script {
      code: ErrorCode::Lifecycle,
      pkgid: "foo@1.0.0".to_string(),
      command: "make".to_string(),
      line: "make all".to_string(),
      diagnostic: ExitDiagnostic::Code(2),
      script: Some("build".to_string()),
      pkgname: Some("foo".to_string()),
    };

    assert_eq!(err.to_string(), "foo@1.0.0 make: `make all` exited with code 2");
    assert_eq!(err.code().as_str(), "ELIFECYCLE");
    assert_eq!(err.script(), Some("build"));
    assert_eq!(err.pkgname(), Some("foo"));
  }

  #[test]
  fn hook_error_message_has_fixed_suffix() {
    let err = LifecycleError::Hook {
      pkgid: "foo@1.0.0".to_string(),
      stage: "install".to_string(),
      hook: PathBuf::from("/hooks/.hooks/install"),
      diagnostic: ExitDiagnostic::Code(1),
      pkgname: None,
    };

    assert!(err.to_string().ends_with("\nFailed to exec install hook script"));
    assert_eq!(err.pkgid(), Some("foo@1.0.0"));
  }

  #[test]
  fn context_derives_stage_and_command_line() {
    let env = Environment::from([(LIFECYCLE_EVENT_VAR.to_string(), "test".to_string())]);
    let args = vec!["--watch".to_string(), "src".to_string()];
    let ctx = ExecContext::new("/app", "jest", &args, Environment::new(), &env);

    assert_eq!(ctx.stage(), Some("test"));
    assert_eq!(ctx.command_line(), "jest --watch src");

    let ctx = ExecContext::new("/app", "jest", &[], Environment::new(), &Environment::new());
    assert_eq!(ctx.stage(), None);
    assert_eq!(ctx.command_line(), "jest");
  }
}
