//! Flattening of package metadata and configuration into variables.
//!
//! Variable families produced:
//! - `npm_package_<field>[_<field>...]` for every exported descriptor field
//! - `npm_config_<key>` for every exported configuration key
//! - `npm_package_config_<key>` for keys scoped to the current package
//! - `TAP` and `NODE_ENV` when the matching mode flags are set

use tracing::debug;

use crate::config::ConfigSource;
use crate::consts::{CONFIG_PREFIX, EXCLUDED_FIELDS, PACKAGE_CONFIG_PREFIX, PACKAGE_PREFIX};
use crate::environment::sanitize::{escape_newlines, sanitize_key};
use crate::environment::{EnvSnapshot, Environment};
use crate::package::{CycleProbe, Meta, Package};

/// Fields carried by the stand-in for a cyclic object.
const SURROGATE_FIELDS: &[&str] = &["name", "version", "path"];

/// Builds the environment for one package.
///
/// Pure: the result depends only on the descriptor, the configuration and the
/// snapshot.
pub fn synthesize(package: &Package, config: &impl ConfigSource, snapshot: &EnvSnapshot) -> Environment {
  let mut env = snapshot.vars().clone();

  if config.test_reporting() {
    env.insert("TAP".to_string(), "1".to_string());
  }
  if config.production() {
    env.insert("NODE_ENV".to_string(), "production".to_string());
  }

  let mut probe = CycleProbe::default();
  flatten(package.root().entries(), PACKAGE_PREFIX, &mut env, &mut probe);
  export_config(package, config, &mut env);

  debug!(pkgid = %package.id(), vars = env.len(), "synthesized environment");
  env
}

fn flatten(entries: Vec<(String, Meta)>, prefix: &str, env: &mut Environment, probe: &mut CycleProbe) {
  for (field, value) in entries {
    if field.starts_with('_') || EXCLUDED_FIELDS.contains(&field.as_str()) {
      continue;
    }
    let key = sanitize_key(&format!("{prefix}{field}"));

    if value.is_container() {
      let children = if probe.is_cyclic(&value) {
        surrogate(&value)
      } else {
        value.children()
      };
      flatten(children, &format!("{key}_"), env, probe);
    } else if let Some(scalar) = value.scalar_string() {
      env.insert(key, escape_newlines(scalar));
    }
  }
}

/// `{name, version, path}` of a cyclic object, scalars only.
///
/// Carrying no containers bounds the recursion no matter where the cycle is.
fn surrogate(value: &Meta) -> Vec<(String, Meta)> {
  let Meta::Object(object) = value else {
    return Vec::new();
  };
  SURROGATE_FIELDS
    .iter()
    .filter_map(|field| {
      let value = object.get(field)?;
      (!value.is_container()).then(|| (field.to_string(), value))
    })
    .collect()
}

fn export_config(package: &Package, config: &impl ConfigSource, env: &mut Environment) {
  let name = package.name();
  let name_scope = name.as_ref().map(|name| format!("{name}:"));
  let private_scope = name_scope.as_ref().map(|scope| format!("_{scope}"));
  let version_scope = name
    .as_ref()
    .zip(package.version())
    .map(|(name, version)| format!("{name}@{version}:"));

  let mut scoped = Vec::new();
  let mut version_scoped = Vec::new();

  for key in config.keys() {
    if key.starts_with('_') && !private_scope.as_ref().is_some_and(|scope| key.starts_with(scope.as_str())) {
      continue;
    }

    let value = match config.get(key) {
      Some(value) => match value.to_env_value() {
        Some(value) => value,
        None => continue,
      },
      None => String::new(),
    };
    let value = escape_newlines(value);
    let key = key.trim_start_matches('_');

    if let Some(rest) = name_scope.as_ref().and_then(|scope| key.strip_prefix(scope.as_str())) {
      scoped.push((sanitize_key(rest), value.clone()));
    } else if let Some(rest) = version_scope.as_ref().and_then(|scope| key.strip_prefix(scope.as_str())) {
      version_scoped.push((sanitize_key(rest), value.clone()));
    }

    env.insert(sanitize_key(&format!("{CONFIG_PREFIX}{key}")), value);
  }

  for (key, value) in scoped.into_iter().chain(version_scoped) {
    env.insert(format!("{PACKAGE_CONFIG_PREFIX}{key}"), value);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{Config, ConfigValue};
  use crate::package::Object;
  use serde_json::json;

  fn package(value: serde_json::Value) -> Package {
    Package::try_from(value).unwrap()
  }

  fn synth(pkg: &Package, config: &Config) -> Environment {
    synthesize(pkg, config, &EnvSnapshot::default())
  }

  #[test]
  fn flattens_nested_metadata() {
    let pkg = package(json!({
      "name": "foo",
      "version": "1.2.3",
      "private": true,
      "dependencies": {"bar": {"version": "2.0.0"}},
      "files": ["lib", "bin"],
      "homepage": null,
    }));

    let env = synth(&pkg, &Config::new());

    assert_eq!(env["npm_package_name"], "foo");
    assert_eq!(env["npm_package_version"], "1.2.3");
    assert_eq!(env["npm_package_private"], "true");
    assert_eq!(env["npm_package_dependencies_bar_version"], "2.0.0");
    assert_eq!(env["npm_package_files_0"], "lib");
    assert_eq!(env["npm_package_files_1"], "bin");
    assert_eq!(env["npm_package_homepage"], "null");
  }

  #[test]
  fn skips_private_fields_and_readme_at_every_depth() {
    let pkg = package(json!({
      "name": "foo",
      "_id": "foo@1.0.0",
      "readme": "# Foo\n\nLong text",
      "nested": {"readme": "inner", "_resolved": "x", "kept": "y"},
    }));

    let env = synth(&pkg, &Config::new());

    assert!(!env.contains_key("npm_package__id"));
    assert!(!env.contains_key("npm_package_readme"));
    assert!(!env.contains_key("npm_package_nested_readme"));
    assert!(!env.contains_key("npm_package_nested__resolved"));
    assert_eq!(env["npm_package_nested_kept"], "y");
  }

  #[test]
  fn newline_values_become_single_line() {
    let pkg = package(json!({"name": "foo", "description": "line one\nline two"}));

    let env = synth(&pkg, &Config::new());

    assert_eq!(env["npm_package_description"], r#""line one\nline two""#);
    assert!(env.values().all(|v| !v.contains('\n')));
  }

  #[test]
  fn keys_are_sanitized_and_may_collide() {
    let first = package(json!({"name": "foo", "dependencies": {"@scope/a-b": "1"}}));
    let second = package(json!({"name": "foo", "dependencies": {"@scope/a.b": "1"}}));

    let first_env = synth(&first, &Config::new());
    let second_env = synth(&second, &Config::new());

    assert_eq!(first_env["npm_package_dependencies__scope_a_b"], "1");
    let first_keys: Vec<_> = first_env.keys().collect();
    let second_keys: Vec<_> = second_env.keys().collect();
    assert_eq!(first_keys, second_keys);
    assert!(
      first_env
        .keys()
        .all(|k| k.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
    );
  }

  #[test]
  fn cyclic_objects_are_replaced_by_surrogate() {
    let root = Object::new().with("name", "app").with("version", "1.0.0");
    let dep = Object::new()
      .with("name", "dep")
      .with("version", "2.0.0")
      .with("path", "/app/node_modules/dep")
      .with("description", "should not be exported")
      .with("parent", root.clone());
    let deps = Object::new().with("dep", dep);
    root.insert("parentOf", Object::new().with("dep", deps.get("dep").unwrap()));
    let link = Object::new().with("name", "link").with("version", "0.1.0");
    link.insert("self", link.clone());
    root.insert("link", link);

    let env = synth(&Package::new(root), &Config::new());

    assert_eq!(env["npm_package_link_name"], "link");
    assert_eq!(env["npm_package_link_version"], "0.1.0");
    assert!(!env.keys().any(|k| k.starts_with("npm_package_link_self")));
    // `parentOf` reaches the root again, so only its own surrogate survives.
    assert!(!env.keys().any(|k| k.starts_with("npm_package_parentOf_")));
    assert!(!env.values().any(|v| v == "should not be exported"));
  }

  #[test]
  fn acyclic_shared_objects_are_flattened_each_time() {
    let shared = Object::new().with("version", "3.0.0");
    let root = Object::new()
      .with("name", "app")
      .with("dependencies", Object::new().with("a", shared.clone()))
      .with("devDependencies", Object::new().with("a", shared));

    let env = synth(&Package::new(root), &Config::new());

    assert_eq!(env["npm_package_dependencies_a_version"], "3.0.0");
    assert_eq!(env["npm_package_devDependencies_a_version"], "3.0.0");
  }

  #[test]
  fn exports_configuration() {
    let pkg = package(json!({"name": "foo", "version": "1.0.0"}));
    let config = Config::new()
      .with("registry", "https://registry.example.test/")
      .with("save-exact", true)
      .with("depth", 0i64)
      .with("init.author.name", "someone")
      .with("tags", ConfigValue::from(json!(["a"])))
      .with("logstream", ConfigValue::Stream)
      .with("message", "a\nb");

    let env = synth(&pkg, &config);

    assert_eq!(env["npm_config_registry"], "https://registry.example.test/");
    assert_eq!(env["npm_config_save_exact"], "true");
    assert_eq!(env["npm_config_depth"], "");
    assert_eq!(env["npm_config_init_author_name"], "someone");
    assert_eq!(env["npm_config_message"], r#""a\nb""#);
    assert!(!env.contains_key("npm_config_tags"));
    assert!(!env.contains_key("npm_config_logstream"));
  }

  #[test]
  fn private_keys_need_package_scope() {
    let pkg = package(json!({"name": "foo", "version": "1.0.0"}));
    let config = Config::new()
      .with("_authToken", "secret")
      .with("_bar:token", "other-package")
      .with("_foo:token", "mine");

    let env = synth(&pkg, &config);

    assert!(!env.values().any(|v| v == "secret" || v == "other-package"));
    assert_eq!(env["npm_config_foo_token"], "mine");
    assert_eq!(env["npm_package_config_token"], "mine");
  }

  #[test]
  fn colliding_fields_keep_the_later_one() {
    let dotted_first = Package::from_json_str(r#"{"name": "foo", "a.b": "first", "a-b": "second"}"#).unwrap();
    let dashed_first = Package::from_json_str(r#"{"name": "foo", "a-b": "first", "a.b": "second"}"#).unwrap();

    assert_eq!(synth(&dotted_first, &Config::new())["npm_package_a_b"], "second");
    assert_eq!(synth(&dashed_first, &Config::new())["npm_package_a_b"], "second");
  }

  #[test]
  fn scoped_keys_are_reexported_for_the_package() {
    let pkg = package(json!({"name": "foo", "version": "1.0.0"}));
    let config = Config::new()
      .with("port", "80")
      .with("foo@1.0.0:port", "9090")
      .with("foo:port", "8080")
      .with("foo:log-level", "debug")
      .with("other:port", "1");

    let env = synth(&pkg, &config);

    assert_eq!(env["npm_config_port"], "80");
    assert_eq!(env["npm_config_foo_port"], "8080");
    assert_eq!(env["npm_config_foo_1_0_0_port"], "9090");
    assert_eq!(env["npm_package_config_port"], "9090");
    assert_eq!(env["npm_package_config_log_level"], "debug");
    assert_eq!(env["npm_config_other_port"], "1");
  }

  #[test]
  fn mode_flags_set_derived_variables() {
    let pkg = package(json!({"name": "foo"}));

    let env = synth(&pkg, &Config::new());
    assert!(!env.contains_key("TAP"));
    assert!(!env.contains_key("NODE_ENV"));

    let env = synth(&pkg, &Config::new().with("npat", true).with("production", true));
    assert_eq!(env["TAP"], "1");
    assert_eq!(env["NODE_ENV"], "production");
  }

  #[test]
  fn starts_from_snapshot() {
    let pkg = package(json!({"name": "foo"}));
    let snapshot = EnvSnapshot::from_vars([("HOME", "/home/user"), ("npm_package_name", "parent")]);

    let env = synthesize(&pkg, &Config::new(), &snapshot);

    assert_eq!(env["HOME"], "/home/user");
    assert_eq!(env["npm_package_name"], "foo");
  }

  #[test]
  fn synthesis_is_deterministic() {
    let pkg = package(json!({"name": "foo", "version": "1.0.0", "bin": {"foo": "./cli.js"}}));
    let config = Config::new().with("foo:port", "8080");
    let snapshot = EnvSnapshot::from_vars([("PATH", "/usr/bin")]);

    assert_eq!(synthesize(&pkg, &config, &snapshot), synthesize(&pkg, &config, &snapshot));
  }
}
