//! Package descriptors.
//!
//! A descriptor is a tree of [`Meta`] values rooted at an [`Object`]. Objects are
//! shared handles, so a descriptor can point back at its parent or at one of its
//! dependencies and form a cycle. Consumers that walk a descriptor use a
//! [`CycleProbe`] to find those cycles before descending.
//!
//! Note: a cyclic descriptor keeps itself alive; it is never freed.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Number, Value};
use thiserror::Error;

/// A single metadata value.
#[derive(Debug, Clone)]
pub enum Meta {
  Null,
  Bool(bool),
  Number(Number),
  String(String),
  List(Vec<Meta>),
  Object(Object),
}

impl Meta {
  /// Returns true for lists and objects.
  pub fn is_container(&self) -> bool {
    matches!(self, Meta::List(_) | Meta::Object(_))
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Meta::String(s) => Some(s),
      _ => None,
    }
  }

  /// Renders a scalar the way it appears in an environment variable.
  ///
  /// Returns `None` for containers.
  pub fn scalar_string(&self) -> Option<String> {
    match self {
      Meta::Null => Some("null".to_string()),
      Meta::Bool(b) => Some(b.to_string()),
      Meta::Number(n) => Some(n.to_string()),
      Meta::String(s) => Some(s.clone()),
      Meta::List(_) | Meta::Object(_) => None,
    }
  }

  /// Returns the named children of a container, lists keyed by index.
  pub fn children(&self) -> Vec<(String, Meta)> {
    match self {
      Meta::List(items) => items
        .iter()
        .enumerate()
        .map(|(index, item)| (index.to_string(), item.clone()))
        .collect(),
      Meta::Object(object) => object.entries(),
      _ => Vec::new(),
    }
  }

  /// Returns true when the graph reachable from this value contains a cycle.
  pub fn is_cyclic(&self) -> bool {
    CycleProbe::default().is_cyclic(self)
  }
}

impl From<Value> for Meta {
  fn from(value: Value) -> Self {
    match value {
      Value::Null => Meta::Null,
      Value::Bool(b) => Meta::Bool(b),
      Value::Number(n) => Meta::Number(n),
      Value::String(s) => Meta::String(s),
      Value::Array(items) => Meta::List(items.into_iter().map(Meta::from).collect()),
      Value::Object(map) => {
        let object = Object::new();
        for (key, value) in map {
          object.insert(key, Meta::from(value));
        }
        Meta::Object(object)
      }
    }
  }
}

impl From<&str> for Meta {
  fn from(value: &str) -> Self {
    Meta::String(value.to_string())
  }
}

impl From<String> for Meta {
  fn from(value: String) -> Self {
    Meta::String(value)
  }
}

impl From<bool> for Meta {
  fn from(value: bool) -> Self {
    Meta::Bool(value)
  }
}

impl From<i64> for Meta {
  fn from(value: i64) -> Self {
    Meta::Number(Number::from(value))
  }
}

impl From<Object> for Meta {
  fn from(value: Object) -> Self {
    Meta::Object(value)
  }
}

impl From<Vec<Meta>> for Meta {
  fn from(value: Vec<Meta>) -> Self {
    Meta::List(value)
  }
}

/// A shared, insertion-ordered metadata object.
///
/// Cloning an `Object` clones the handle, not the entries. Two handles are the
/// same object when their [`Object::identity`] matches.
#[derive(Clone, Default)]
pub struct Object(Arc<RwLock<Vec<(String, Meta)>>>);

impl Object {
  pub fn new() -> Self {
    Self::default()
  }

  /// Sets `key`, replacing an existing entry in place.
  pub fn insert(&self, key: impl Into<String>, value: impl Into<Meta>) {
    let key = key.into();
    let value = value.into();
    let mut entries = self.0.write().unwrap_or_else(PoisonError::into_inner);
    match entries.iter_mut().find(|(existing, _)| *existing == key) {
      Some((_, slot)) => *slot = value,
      None => entries.push((key, value)),
    }
  }

  pub fn with(self, key: impl Into<String>, value: impl Into<Meta>) -> Self {
    self.insert(key, value);
    self
  }

  pub fn get(&self, key: &str) -> Option<Meta> {
    let entries = self.0.read().unwrap_or_else(PoisonError::into_inner);
    entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
  }

  /// Snapshot of the entries in insertion order.
  pub fn entries(&self) -> Vec<(String, Meta)> {
    self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn len(&self) -> usize {
    self.0.read().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Identity of the underlying object.
  pub fn identity(&self) -> usize {
    Arc::as_ptr(&self.0) as *const () as usize
  }
}

// Entries may refer back to this object, so Debug must not recurse.
impl fmt::Debug for Object {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Object({:#x}, {} entries)", self.identity(), self.len())
  }
}

/// Detects cycles by identity.
///
/// A value is cyclic when a walk over its reachable graph meets an object that
/// is still on the walk's descent path. Objects proven acyclic are remembered,
/// so one probe can answer repeated questions about a shared graph in linear
/// time.
#[derive(Debug, Default)]
pub struct CycleProbe {
  on_path: HashSet<usize>,
  acyclic: HashSet<usize>,
}

impl CycleProbe {
  pub fn is_cyclic(&mut self, value: &Meta) -> bool {
    match value {
      Meta::List(items) => items.iter().any(|item| self.is_cyclic(item)),
      Meta::Object(object) => {
        let id = object.identity();
        if self.acyclic.contains(&id) {
          return false;
        }
        if !self.on_path.insert(id) {
          return true;
        }
        let cyclic = object.entries().iter().any(|(_, child)| self.is_cyclic(child));
        self.on_path.remove(&id);
        if !cyclic {
          self.acyclic.insert(id);
        }
        cyclic
      }
      _ => false,
    }
  }
}

#[derive(Debug, Error)]
pub enum PackageError {
  #[error("package descriptor must be a JSON object, got {0}")]
  NotAnObject(&'static str),

  #[error("invalid package descriptor: {0}")]
  Json(#[from] serde_json::Error),
}

/// One package: identity fields plus arbitrary nested metadata.
#[derive(Debug, Clone)]
pub struct Package {
  root: Object,
}

impl Package {
  pub fn new(root: Object) -> Self {
    Self { root }
  }

  /// Parses a descriptor from JSON text (typically a `package.json`).
  pub fn from_json_str(text: &str) -> Result<Self, PackageError> {
    let value: Value = serde_json::from_str(text)?;
    Self::try_from(value)
  }

  pub fn root(&self) -> &Object {
    &self.root
  }

  pub fn name(&self) -> Option<String> {
    self.string_field("name")
  }

  pub fn version(&self) -> Option<String> {
    self.string_field("version")
  }

  pub fn path(&self) -> Option<String> {
    self.string_field("path")
  }

  /// The package identifier: `_id` when present, otherwise `name@version`.
  pub fn id(&self) -> String {
    if let Some(id) = self.string_field("_id") {
      return id;
    }
    match (self.name(), self.version()) {
      (Some(name), Some(version)) => format!("{name}@{version}"),
      (Some(name), None) => name,
      (None, _) => "(unnamed)".to_string(),
    }
  }

  /// Looks up `scripts.<name>`.
  pub fn script(&self, name: &str) -> Option<String> {
    match self.root.get("scripts")? {
      Meta::Object(scripts) => scripts.get(name)?.as_str().map(str::to_string),
      _ => None,
    }
  }

  pub fn script_names(&self) -> Vec<String> {
    match self.root.get("scripts") {
      Some(Meta::Object(scripts)) => scripts.entries().into_iter().map(|(name, _)| name).collect(),
      _ => Vec::new(),
    }
  }

  fn string_field(&self, key: &str) -> Option<String> {
    self.root.get(key)?.as_str().map(str::to_string)
  }
}

impl TryFrom<Value> for Package {
  type Error = PackageError;

  fn try_from(value: Value) -> Result<Self, Self::Error> {
    let kind = match &value {
      Value::Object(_) => None,
      Value::Null => Some("null"),
      Value::Bool(_) => Some("a boolean"),
      Value::Number(_) => Some("a number"),
      Value::String(_) => Some("a string"),
      Value::Array(_) => Some("an array"),
    };
    if let Some(kind) = kind {
      return Err(PackageError::NotAnObject(kind));
    }
    match Meta::from(value) {
      Meta::Object(root) => Ok(Self::new(root)),
      _ => Err(PackageError::NotAnObject("a non-object value")),
    }
  }
}
