// Copyright 2018-2024 the Deno authors. MIT license.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// The npm package name of the legacy Teams client SDK.
pub const TEAMS_JS_MODULE: &str = "@microsoft/teams-js";
/// The global name the legacy SDK is conventionally bound to.
pub const TEAMS_JS_DEFAULT_ALIAS: &str = "microsoftTeams";
/// Version requirement the migrated code is written against.
pub const TEAMS_JS_V2_VERSION_REQ: &str = "^2.0.0";

static TEAMS_JS_V2: Lazy<Arc<MappingTable>> = Lazy::new(|| {
  Arc::new(
    MappingTable::from_json_str(include_str!("teams_js_v2.json")).unwrap(),
  )
});

#[derive(Debug, Error, deno_error::JsError)]
pub enum MappingError {
  #[class(type)]
  #[error("Invalid {group} mapping path \"{path}\". Expected at least a module name and one member separated by a dot.")]
  InvalidPath { group: RuleGroup, path: String },
  #[class(type)]
  #[error("Failed parsing mapping table.")]
  Json(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleGroup {
  Functions,
  Interfaces,
  Enums,
}

impl fmt::Display for RuleGroup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RuleGroup::Functions => write!(f, "function"),
      RuleGroup::Interfaces => write!(f, "interface"),
      RuleGroup::Enums => write!(f, "enum"),
    }
  }
}

/// A single `{ source, target }` entry as it appears in a mapping file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
  pub source: String,
  pub target: String,
  #[serde(default, skip_serializing_if = "is_false")]
  pub callback_to_promise: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub callback_position: Option<usize>,
}

fn is_false(value: &bool) -> bool {
  !value
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingFile {
  #[serde(default)]
  pub functions: Vec<MappingEntry>,
  #[serde(default)]
  pub interfaces: Vec<MappingEntry>,
  #[serde(default)]
  pub enums: Vec<MappingEntry>,
}

/// Marks a function whose callback parameter became a returned promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackConversion {
  /// Zero-based index of the callback argument. A call is flagged when it
  /// passes more arguments than this index.
  pub position: usize,
}

/// A mapping entry with the module-root segment removed from both paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRule {
  pub source_tokens: Vec<String>,
  pub target_tokens: Vec<String>,
  pub callback: Option<CallbackConversion>,
}

impl ReplacementRule {
  pub fn from_entry(
    entry: &MappingEntry,
    group: RuleGroup,
  ) -> Result<Self, MappingError> {
    let source_tokens = strip_module_root(&entry.source, group)?;
    let target_tokens = strip_module_root(&entry.target, group)?;
    let callback = if entry.callback_to_promise {
      Some(CallbackConversion {
        position: entry.callback_position.unwrap_or(0),
      })
    } else {
      None
    };
    Ok(Self {
      source_tokens,
      target_tokens,
      callback,
    })
  }
}

fn strip_module_root(
  path: &str,
  group: RuleGroup,
) -> Result<Vec<String>, MappingError> {
  let segments = path.split('.').collect::<Vec<_>>();
  if segments.len() < 2 || segments.iter().any(|s| s.trim().is_empty()) {
    return Err(MappingError::InvalidPath {
      group,
      path: path.to_string(),
    });
  }
  Ok(
    segments[1..]
      .iter()
      .map(|s| s.trim().to_string())
      .collect(),
  )
}

/// The full rule set used by a migration run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MappingTable {
  pub functions: Vec<ReplacementRule>,
  pub interfaces: Vec<ReplacementRule>,
  pub enums: Vec<ReplacementRule>,
}

impl MappingTable {
  /// The embedded teams-js v1 to v2 mapping.
  pub fn teams_js_v2() -> Arc<MappingTable> {
    TEAMS_JS_V2.clone()
  }

  pub fn from_json_str(text: &str) -> Result<Self, MappingError> {
    let file: MappingFile =
      serde_json::from_str(text).map_err(MappingError::Json)?;
    Self::from_file(&file)
  }

  /// Validates every entry of the file. The first malformed entry fails the
  /// whole table.
  pub fn from_file(file: &MappingFile) -> Result<Self, MappingError> {
    fn convert(
      entries: &[MappingEntry],
      group: RuleGroup,
    ) -> Result<Vec<ReplacementRule>, MappingError> {
      entries
        .iter()
        .map(|entry| ReplacementRule::from_entry(entry, group))
        .collect()
    }

    Ok(Self {
      functions: convert(&file.functions, RuleGroup::Functions)?,
      interfaces: convert(&file.interfaces, RuleGroup::Interfaces)?,
      enums: convert(&file.enums, RuleGroup::Enums)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn embedded_table_loads() {
    let table = MappingTable::teams_js_v2();
    assert!(!table.functions.is_empty());
    assert!(!table.interfaces.is_empty());
    assert_eq!(table.enums.len(), 2);
    let get_context = table
      .functions
      .iter()
      .find(|r| r.source_tokens == vec!["getContext".to_string()])
      .unwrap();
    assert_eq!(get_context.target_tokens, vec!["app", "getContext"]);
    assert_eq!(
      get_context.callback,
      Some(CallbackConversion { position: 0 })
    );
  }

  #[test]
  fn strips_module_root() {
    let table = MappingTable::from_json_str(
      r#"{
        "functions": [
          { "source": "legacy.settings.getSettings", "target": "legacy.pages.getConfig", "callbackToPromise": true, "callbackPosition": 1 },
          { "source": "legacy.print", "target": "legacy.teamsCore.print" }
        ],
        "enums": [
          { "source": "legacy.SomeEnum", "target": "legacy.renamedNs.SomeEnum" }
        ]
      }"#,
    )
    .unwrap();
    assert_eq!(
      table.functions,
      vec![
        ReplacementRule {
          source_tokens: vec!["settings".into(), "getSettings".into()],
          target_tokens: vec!["pages".into(), "getConfig".into()],
          callback: Some(CallbackConversion { position: 1 }),
        },
        ReplacementRule {
          source_tokens: vec!["print".into()],
          target_tokens: vec!["teamsCore".into(), "print".into()],
          callback: None,
        },
      ]
    );
    assert!(table.interfaces.is_empty());
    assert_eq!(table.enums[0].target_tokens, vec!["renamedNs", "SomeEnum"]);
  }

  #[test]
  fn callback_position_defaults_to_zero() {
    let rule = ReplacementRule::from_entry(
      &MappingEntry {
        source: "legacy.getContext".into(),
        target: "legacy.app.getContext".into(),
        callback_to_promise: true,
        callback_position: None,
      },
      RuleGroup::Functions,
    )
    .unwrap();
    assert_eq!(rule.callback, Some(CallbackConversion { position: 0 }));
  }

  #[test]
  fn rejects_paths_without_module_root() {
    let err = MappingTable::from_json_str(
      r#"{ "interfaces": [{ "source": "Context", "target": "legacy.app.Context" }] }"#,
    )
    .unwrap_err();
    assert_eq!(
      err.to_string(),
      "Invalid interface mapping path \"Context\". Expected at least a module name and one member separated by a dot."
    );

    let err = MappingTable::from_json_str(
      r#"{ "enums": [{ "source": "legacy.A", "target": "legacy..A" }] }"#,
    )
    .unwrap_err();
    assert!(matches!(
      err,
      MappingError::InvalidPath {
        group: RuleGroup::Enums,
        ..
      }
    ));
  }

  #[test]
  fn rejects_invalid_json() {
    let err = MappingTable::from_json_str("{").unwrap_err();
    assert!(matches!(err, MappingError::Json(_)));
  }
}
