// Copyright 2018-2024 the Deno authors. MIT license.

use indexmap::IndexMap;

use crate::imports::ImportInfo;
use crate::imports::ImportOrigin;
use crate::mappings::ReplacementRule;

/// A rule expressed in terms of one local binding of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReplacement<'r> {
  /// The path as written in the file, starting at the local binding.
  pub source_tokens: Vec<String>,
  /// What the path is rewritten to.
  pub target_tokens: Vec<String>,
  pub rule: &'r ReplacementRule,
  pub origin: ImportOrigin,
}

impl TargetReplacement<'_> {
  /// Whether applying the replacement leaves the text unchanged.
  pub fn is_noop(&self) -> bool {
    self.source_tokens == self.target_tokens
  }
}

/// Per-file lookup tables from a dotted path to its replacement.
///
/// Paths of a single identifier go through `direct` and longer ones through
/// `namespace`. When several rules produce the same key the first one wins.
#[derive(Debug, Default)]
pub struct ReplacementLookups<'r> {
  pub direct: IndexMap<String, TargetReplacement<'r>>,
  pub namespace: IndexMap<String, TargetReplacement<'r>>,
}

impl<'r> ReplacementLookups<'r> {
  pub fn build(info: &ImportInfo, rules: &'r [ReplacementRule]) -> Self {
    let mut lookups = Self::default();
    for rule in rules {
      for (index, import) in info.single_export_imports.iter().enumerate() {
        if import.source != rule.source_tokens[0] {
          continue;
        }
        let mut source_tokens = rule.source_tokens.clone();
        source_tokens[0] = import.local_name().to_string();
        lookups.add(TargetReplacement {
          source_tokens,
          target_tokens: rule.target_tokens.clone(),
          rule,
          origin: ImportOrigin::SingleExport(index),
        });
      }
      for (index, import) in info.whole_module_imports.iter().enumerate() {
        lookups.add(TargetReplacement {
          source_tokens: prefixed(&import.alias, &rule.source_tokens),
          target_tokens: prefixed(&import.alias, &rule.target_tokens),
          rule,
          origin: ImportOrigin::WholeModule(index),
        });
      }
    }
    lookups
  }

  fn add(&mut self, replacement: TargetReplacement<'r>) {
    let map = if replacement.source_tokens.len() == 1 {
      &mut self.direct
    } else {
      &mut self.namespace
    };
    let key = replacement.source_tokens.join(".");
    if let Some(existing) = map.get(&key) {
      log::debug!(
        "Ignoring rule {:?} for {}, already mapped to {:?}",
        replacement.target_tokens,
        key,
        existing.target_tokens
      );
      return;
    }
    map.insert(key, replacement);
  }

  pub fn find(&self, path: &[&str]) -> Option<&TargetReplacement<'r>> {
    let key = path.join(".");
    if path.len() == 1 {
      self.direct.get(&key)
    } else {
      self.namespace.get(&key)
    }
  }
}

fn prefixed(first: &str, rest: &[String]) -> Vec<String> {
  std::iter::once(first.to_string())
    .chain(rest.iter().cloned())
    .collect()
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::imports::SingleExportImport;
  use crate::imports::WholeModuleImport;
  use crate::imports::WholeModuleImportStyle;
  use crate::mappings::MappingTable;

  fn table() -> MappingTable {
    MappingTable::from_json_str(
      r#"{
        "functions": [
          { "source": "legacy.getContext", "target": "legacy.app.getContext" },
          { "source": "legacy.settings.getSettings", "target": "legacy.pages.getConfig" },
          { "source": "legacy.getContext", "target": "legacy.other.getContext" }
        ]
      }"#,
    )
    .unwrap()
  }

  #[test]
  fn maps_single_export_imports_by_local_name() {
    let table = table();
    let mut info = ImportInfo::default();
    info
      .single_export_imports
      .push(SingleExportImport::new("getContext", None));
    info
      .single_export_imports
      .push(SingleExportImport::new("settings", Some("s".to_string())));
    let lookups = ReplacementLookups::build(&info, &table.functions);

    assert_eq!(lookups.direct.len(), 1);
    let get_context = lookups.find(&["getContext"]).unwrap();
    assert_eq!(get_context.target_tokens, vec!["app", "getContext"]);
    assert_eq!(get_context.origin, ImportOrigin::SingleExport(0));

    let get_settings = lookups.find(&["s", "getSettings"]).unwrap();
    assert_eq!(get_settings.target_tokens, vec!["pages", "getConfig"]);
    assert_eq!(get_settings.origin, ImportOrigin::SingleExport(1));
    assert!(lookups.find(&["settings", "getSettings"]).is_none());
  }

  #[test]
  fn maps_whole_module_aliases_with_prefix() {
    let table = table();
    let mut info = ImportInfo::default();
    info.whole_module_imports.push(WholeModuleImport::new(
      "teams",
      WholeModuleImportStyle::Default,
    ));
    let lookups = ReplacementLookups::build(&info, &table.functions);

    assert!(lookups.direct.is_empty());
    // first rule for a path wins
    assert_eq!(
      lookups.find(&["teams", "getContext"]).unwrap().target_tokens,
      vec!["teams", "app", "getContext"]
    );
    assert_eq!(
      lookups
        .find(&["teams", "settings", "getSettings"])
        .unwrap()
        .target_tokens,
      vec!["teams", "pages", "getConfig"]
    );
  }

  #[test]
  fn empty_without_imports() {
    let table = table();
    let lookups =
      ReplacementLookups::build(&ImportInfo::default(), &table.functions);
    assert!(lookups.direct.is_empty());
    assert!(lookups.namespace.is_empty());
  }
}
