//! CLI output formatting utilities.
//!
//! Status lines go to stderr so stdout carries only script output and the
//! `env` listing.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{AnsiColors, OwoColorize, Stream};

use pkgrun_lib::LifecycleError;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Kind of a status line; picks its symbol and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
  Success,
  Error,
  Warning,
  Info,
}

impl Status {
  fn symbol(self) -> &'static str {
    match self {
      Status::Success => "✓",
      Status::Error => "✗",
      Status::Warning => "⚠",
      Status::Info => "•",
    }
  }

  fn color(self) -> AnsiColors {
    match self {
      Status::Success => AnsiColors::Green,
      Status::Error => AnsiColors::Red,
      Status::Warning => AnsiColors::Yellow,
      Status::Info => AnsiColors::Blue,
    }
  }

  /// Errors and warnings tint the whole line, not just the symbol.
  fn tints_message(self) -> bool {
    matches!(self, Status::Error | Status::Warning)
  }
}

/// Writes one status line to stderr.
fn status_line(status: Status, message: &str) {
  let color = status.color();
  let symbol_text = status.symbol();
  let symbol = symbol_text.if_supports_color(Stream::Stderr, |s| s.color(color));
  if status.tints_message() {
    eprintln!("{} {}", symbol, message.if_supports_color(Stream::Stderr, |s| s.color(color)));
  } else {
    eprintln!("{} {}", symbol, message);
  }
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    format!("{}m {}s", secs / 60, secs % 60)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  status_line(Status::Success, message);
}

pub fn print_error(message: &str) {
  status_line(Status::Error, message);
}

pub fn print_warning(message: &str) {
  status_line(Status::Warning, message);
}

pub fn print_info(message: &str) {
  status_line(Status::Info, message);
}

pub fn print_stat(label: &str, value: &str) {
  eprintln!(
    "  {}: {}",
    label.if_supports_color(Stream::Stderr, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

/// Prints a failure, with lifecycle details when the cause is a script or hook.
pub fn report_error(err: &anyhow::Error) {
  let Some(lifecycle) = err.downcast_ref::<LifecycleError>() else {
    print_error(&format!("{:#}", err));
    return;
  };

  print_error(&lifecycle.to_string());
  print_stat("code", lifecycle.code().as_str());
  if let Some(pkgid) = lifecycle.pkgid() {
    print_stat("pkgid", pkgid);
  }
  if let Some(script) = lifecycle.script() {
    print_stat("stage", script);
  }
  if let Some(line) = lifecycle.command_line() {
    print_stat("command", line);
  }
}
