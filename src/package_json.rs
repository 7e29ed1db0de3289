// Copyright 2018-2024 the Deno authors. MIT license.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const DEPENDENCY_KEYS: [&str; 3] =
  ["dependencies", "devDependencies", "peerDependencies"];

#[derive(Debug, Error, deno_error::JsError)]
pub enum PackageJsonError {
  #[class(type)]
  #[error("Invalid version requirement \"{0}\" for the migrated package.")]
  InvalidVersionReq(String),
  #[class(type)]
  #[error("Failed parsing package.json.")]
  Parse(#[source] serde_json::Error),
  #[class(type)]
  #[error("Expected package.json to contain an object.")]
  NotAnObject,
}

/// Pins `package_name` to `version` in every dependency table that lists
/// it. Returns `None` when nothing had to change.
///
/// Key order, indentation and a trailing newline are kept.
pub fn update_package_json(
  text: &str,
  package_name: &str,
  version: &str,
) -> Result<Option<String>, PackageJsonError> {
  if deno_semver::VersionReq::parse_from_npm(version).is_err() {
    return Err(PackageJsonError::InvalidVersionReq(version.to_string()));
  }
  let mut value: Value =
    serde_json::from_str(text).map_err(PackageJsonError::Parse)?;
  let Some(object) = value.as_object_mut() else {
    return Err(PackageJsonError::NotAnObject);
  };

  let mut changed = false;
  for key in DEPENDENCY_KEYS {
    let Some(Value::Object(dependencies)) = object.get_mut(key) else {
      continue;
    };
    if let Some(current) = dependencies.get_mut(package_name) {
      if current.as_str() != Some(version) {
        log::debug!("Updating {} in {} to {}", package_name, key, version);
        *current = Value::String(version.to_string());
        changed = true;
      }
    }
  }
  if !changed {
    return Ok(None);
  }

  let indent = detect_indent(text);
  let mut output = Vec::with_capacity(text.len());
  let formatter =
    serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
  let mut serializer =
    serde_json::Serializer::with_formatter(&mut output, formatter);
  value
    .serialize(&mut serializer)
    .map_err(PackageJsonError::Parse)?;
  let mut new_text = String::from_utf8_lossy(&output).into_owned();
  if text.ends_with('\n') {
    new_text.push('\n');
  }
  Ok(Some(new_text))
}

fn detect_indent(text: &str) -> &str {
  text
    .lines()
    .skip(1)
    .find_map(|line| {
      let indent_len = line.len() - line.trim_start().len();
      if indent_len > 0 {
        Some(&line[..indent_len])
      } else {
        None
      }
    })
    .unwrap_or("  ")
}
