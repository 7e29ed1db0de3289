// Copyright 2018-2024 the Deno authors. MIT license.

use crate::swc_helpers::SourceFile;
use crate::text_changes::TextChanges;

pub const CALLBACK_TO_PROMISE: &str = "// TODO (Teams JS migration): This API has been converted from a callback-based API to a promise-based API. Please review the call site.";
pub const CONTEXT_SCHEMA_CHANGED: &str = "// TODO (Teams JS migration): The schema of the context object returned by app.getContext() has changed. Please review how its properties are used.";
pub const REQUIRE_NOT_HANDLED: &str = "// TODO (Teams JS migration): require() of the legacy module is not handled. Please migrate the usages below manually.";
pub const DYNAMIC_IMPORT_NOT_HANDLED: &str = "// TODO (Teams JS migration): Dynamic import() of the legacy module is not handled. Please migrate the usages manually.";
pub const UNMIGRATED_REFERENCE: &str = "// TODO (Teams JS migration): This reference to a legacy import could not be migrated. Please migrate it manually.";

const ALL: [&str; 5] = [
  CALLBACK_TO_PROMISE,
  CONTEXT_SCHEMA_CHANGED,
  REQUIRE_NOT_HANDLED,
  DYNAMIC_IMPORT_NOT_HANDLED,
  UNMIGRATED_REFERENCE,
];

/// Name of the legacy function whose result changed shape.
pub const CONTEXT_FUNCTION_NAME: &str = "getContext";

/// Inserts each comment on its own line before `pos`, indented like the
/// line holding `pos`.
///
/// A comment already present on the lines directly above is not inserted
/// again. Returns whether anything was inserted.
pub fn insert_comment_lines(
  changes: &mut TextChanges,
  file: &SourceFile,
  pos: usize,
  comments: &[&str],
) -> bool {
  let existing = comments_directly_above(file, pos);
  let indent = file.line_indent(pos);
  let mut inserted = false;
  for comment in comments {
    if existing.iter().any(|e| e == comment) {
      continue;
    }
    inserted |= changes.insert(pos, format!("{}\n{}", comment, indent));
  }
  inserted
}

fn comments_directly_above(
  file: &SourceFile,
  pos: usize,
) -> Vec<&'static str> {
  let text = file.text();
  let line_start = file.line_start(pos);
  let mut found = Vec::new();
  // a comment always ends its line, so code before `pos` means there's
  // nothing above to reuse
  if !text[line_start..pos].trim().is_empty() {
    return found;
  }
  for line in text[..line_start].lines().rev() {
    let line = line.trim_end();
    match ALL.iter().find(|c| line.ends_with(**c)) {
      Some(comment) => found.push(*comment),
      None => break,
    }
  }
  found
}
