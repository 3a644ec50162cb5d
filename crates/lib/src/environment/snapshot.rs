//! Inherited process environment snapshot.

use std::collections::BTreeMap;

use tracing::debug;

use crate::consts::LIFECYCLE_NAMESPACE;
use crate::environment::Environment;

/// The inherited environment, minus lifecycle-namespaced variables.
///
/// A script that starts another lifecycle script must not leak its own
/// synthesized variables into the child, so every `npm_*` variable is dropped
/// when the snapshot is taken. Synthesis reads only from a snapshot, never
/// from the live process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
  vars: Environment,
}

impl EnvSnapshot {
  /// Captures the current process environment.
  ///
  /// Variables whose name or value is not valid Unicode are skipped.
  pub fn capture() -> Self {
    let mut skipped = 0usize;
    let vars = std::env::vars_os().filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
      (Ok(key), Ok(value)) => Some((key, value)),
      _ => {
        skipped += 1;
        None
      }
    });
    let snapshot = Self::from_vars(vars.collect::<Vec<_>>());
    if skipped > 0 {
      debug!(skipped, "skipped non-unicode environment variables");
    }
    snapshot
  }

  pub fn from_vars<I, K, V>(vars: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let vars: BTreeMap<String, String> = vars
      .into_iter()
      .map(|(k, v)| (k.into(), v.into()))
      .filter(|(k, _)| !k.starts_with(LIFECYCLE_NAMESPACE))
      .collect();
    Self { vars }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.vars.get(key).map(String::as_str)
  }

  pub fn vars(&self) -> &Environment {
    &self.vars
  }

  pub fn len(&self) -> usize {
    self.vars.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vars.is_empty()
  }
}
