// Copyright 2018-2024 the Deno authors. MIT license.

use serde::Serialize;

/// What a transform did to one file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
  pub rewritten_calls: usize,
  /// Calls that received an advisory comment.
  pub flagged_calls: usize,
  pub rewritten_types: usize,
  pub rewritten_enums: usize,
  /// `require()` and `import()` loads of the legacy module.
  pub opaque_sites: usize,
  /// References through a legacy binding that no rule covers.
  pub unmatched_references: usize,
  /// References through a retargeted named import left as they were.
  pub flagged_references: usize,
  pub rewritten_imports: bool,
}

impl FileReport {
  pub fn add(&mut self, other: &FileReport) {
    self.rewritten_calls += other.rewritten_calls;
    self.flagged_calls += other.flagged_calls;
    self.rewritten_types += other.rewritten_types;
    self.rewritten_enums += other.rewritten_enums;
    self.opaque_sites += other.opaque_sites;
    self.unmatched_references += other.unmatched_references;
    self.flagged_references += other.flagged_references;
    self.rewritten_imports |= other.rewritten_imports;
  }
}
