//! Variable name and value normalization.

use serde_json::Value;

/// Replaces every character outside `[A-Za-z0-9_]` with `_`.
///
/// Distinct keys can collide after sanitizing (`a-b` and `a.b` both become
/// `a_b`); the later write wins.
pub fn sanitize_key(key: &str) -> String {
  key
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
    .collect()
}

/// JSON-quotes values containing a newline so every entry stays on one line.
pub fn escape_newlines(value: String) -> String {
  if value.contains('\n') {
    Value::String(value).to_string()
  } else {
    value
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sanitize_replaces_disallowed_characters() {
    assert_eq!(sanitize_key("npm_package_dependencies_@scope/pkg"), "npm_package_dependencies__scope_pkg");
    assert_eq!(sanitize_key("npm_config_foo@1.0.0:bar"), "npm_config_foo_1_0_0_bar");
    assert_eq!(sanitize_key("caf\u{e9}"), "caf_");
  }

  #[test]
  fn sanitize_collides_on_equivalent_keys() {
    assert_eq!(sanitize_key("a-b"), sanitize_key("a.b"));
  }

  #[test]
  fn newline_values_are_json_quoted() {
    assert_eq!(escape_newlines("one\ntwo".to_string()), r#""one\ntwo""#);
    assert_eq!(escape_newlines("plain \"quoted\"".to_string()), "plain \"quoted\"");
  }
}
