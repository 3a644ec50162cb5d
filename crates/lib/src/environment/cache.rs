//! Caller-owned memoization of synthesized environments.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::environment::Environment;

/// Synthesized environments keyed by package identifier.
///
/// Share one cache between invocations (through an `Arc`) to synthesize each
/// package's environment once. Entries are never refreshed automatically; call
/// [`EnvCache::invalidate`] when a descriptor or the configuration changes.
#[derive(Debug, Default)]
pub struct EnvCache {
  entries: Mutex<HashMap<String, Arc<Environment>>>,
}

impl EnvCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, pkgid: &str) -> Option<Arc<Environment>> {
    self.lock().get(pkgid).cloned()
  }

  /// Returns the cached environment for `pkgid`, building it with `build` on a miss.
  pub fn get_or_insert_with(&self, pkgid: &str, build: impl FnOnce() -> Environment) -> Arc<Environment> {
    let mut entries = self.lock();
    if let Some(env) = entries.get(pkgid) {
      debug!(pkgid, "environment cache hit");
      return env.clone();
    }
    let env = Arc::new(build());
    entries.insert(pkgid.to_string(), env.clone());
    env
  }

  pub fn invalidate(&self, pkgid: &str) -> bool {
    self.lock().remove(pkgid).is_some()
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.lock().is_empty()
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Environment>>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
