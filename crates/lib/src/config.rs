//! Configuration store consumed by the synthesizer and the orchestrator.
//!
//! The store is an ordered mapping from key to [`ConfigValue`]. Keys are either
//! global (`loglevel`), package scoped (`<name>:key`), or package and version
//! scoped (`<name>@<version>:key`). A leading underscore marks a private key.

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::consts::keys;

/// A configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
  Null,
  Bool(bool),
  Number(Number),
  String(String),
  List(Vec<Value>),
  Object(Map<String, Value>),
  /// A handle-typed value such as an open log stream. Never exported.
  Stream,
}

impl ConfigValue {
  pub fn is_truthy(&self) -> bool {
    match self {
      ConfigValue::Null => false,
      ConfigValue::Bool(b) => *b,
      ConfigValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
      ConfigValue::String(s) => !s.is_empty(),
      ConfigValue::List(_) | ConfigValue::Object(_) | ConfigValue::Stream => true,
    }
  }

  /// Renders the value for an environment variable.
  ///
  /// Returns `None` for streams and lists, which have no scalar form. Falsy
  /// values render as the empty string and other non-strings as JSON.
  pub fn to_env_value(&self) -> Option<String> {
    match self {
      ConfigValue::Stream | ConfigValue::List(_) => None,
      value if !value.is_truthy() => Some(String::new()),
      ConfigValue::String(s) => Some(s.clone()),
      ConfigValue::Bool(b) => Some(b.to_string()),
      ConfigValue::Number(n) => Some(n.to_string()),
      ConfigValue::Object(map) => Some(Value::Object(map.clone()).to_string()),
      ConfigValue::Null => Some(String::new()),
    }
  }
}

impl From<Value> for ConfigValue {
  fn from(value: Value) -> Self {
    match value {
      Value::Null => ConfigValue::Null,
      Value::Bool(b) => ConfigValue::Bool(b),
      Value::Number(n) => ConfigValue::Number(n),
      Value::String(s) => ConfigValue::String(s),
      Value::Array(items) => ConfigValue::List(items),
      Value::Object(map) => ConfigValue::Object(map),
    }
  }
}

impl From<&str> for ConfigValue {
  fn from(value: &str) -> Self {
    ConfigValue::String(value.to_string())
  }
}

impl From<String> for ConfigValue {
  fn from(value: String) -> Self {
    ConfigValue::String(value)
  }
}

impl From<bool> for ConfigValue {
  fn from(value: bool) -> Self {
    ConfigValue::Bool(value)
  }
}

impl From<i64> for ConfigValue {
  fn from(value: i64) -> Self {
    ConfigValue::Number(Number::from(value))
  }
}

/// Read access to configuration.
///
/// Only `keys`, `get` and `continue_on_failure` are required; the flag lookups
/// are derived from well-known keys.
pub trait ConfigSource {
  /// All keys, in store order.
  fn keys(&self) -> Vec<&str>;

  fn get(&self, key: &str) -> Option<&ConfigValue>;

  /// Whether script and hook failures are logged and then ignored.
  fn continue_on_failure(&self) -> bool;

  fn flag(&self, key: &str) -> bool {
    self.get(key).is_some_and(ConfigValue::is_truthy)
  }

  /// Skip pointing the temp directory at the working directory.
  fn unsafe_perm(&self) -> bool {
    self.flag(keys::UNSAFE_PERM)
  }

  /// Ask child scripts for TAP output.
  fn test_reporting(&self) -> bool {
    self.flag(keys::TEST_REPORTING)
  }

  fn production(&self) -> bool {
    self.flag(keys::PRODUCTION)
  }

  /// Shell override for running scripts.
  fn script_shell(&self) -> Option<&str> {
    match self.get(keys::SCRIPT_SHELL) {
      Some(ConfigValue::String(shell)) if !shell.is_empty() => Some(shell),
      _ => None,
    }
  }
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("configuration must be a JSON object")]
  NotAnObject,
}

/// In-memory configuration store.
#[derive(Debug, Clone, Default)]
pub struct Config {
  entries: Vec<(String, ConfigValue)>,
  continue_on_failure: bool,
}

impl Config {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets `key`, replacing an existing entry in place.
  pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
    let key = key.into();
    let value = value.into();
    match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
      Some((_, slot)) => *slot = value,
      None => self.entries.push((key, value)),
    }
  }

  pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
    self.set(key, value);
    self
  }

  pub fn set_continue_on_failure(&mut self, enabled: bool) {
    self.continue_on_failure = enabled;
  }

  pub fn with_continue_on_failure(mut self, enabled: bool) -> Self {
    self.continue_on_failure = enabled;
    self
  }

  /// Merges every member of a JSON object into the store.
  pub fn merge_json(&mut self, value: Value) -> Result<(), ConfigError> {
    let Value::Object(map) = value else {
      return Err(ConfigError::NotAnObject);
    };
    for (key, value) in map {
      self.set(key, ConfigValue::from(value));
    }
    Ok(())
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl ConfigSource for Config {
  fn keys(&self) -> Vec<&str> {
    self.entries.iter().map(|(key, _)| key.as_str()).collect()
  }

  fn get(&self, key: &str) -> Option<&ConfigValue> {
    self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
  }

  fn continue_on_failure(&self) -> bool {
    self.continue_on_failure
  }
}
