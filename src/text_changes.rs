// Copyright 2018-2024 the Deno authors. MIT license.

use std::ops::Range;

use deno_ast::apply_text_changes;
use deno_ast::TextChange;

fn is_insertion(change: &TextChange) -> bool {
  change.range.start == change.range.end
}

fn conflicts(a: &TextChange, b: &TextChange) -> bool {
  match (is_insertion(a), is_insertion(b)) {
    (true, true) => false,
    (true, false) => {
      b.range.start < a.range.start && a.range.start < b.range.end
    }
    (false, true) => conflicts(b, a),
    (false, false) => {
      a.range.start < b.range.end && b.range.start < a.range.end
    }
  }
}

/// Collects edits against one source text.
///
/// Edits that would overlap an already collected edit are rejected, so the
/// first stage to touch a node owns it.
#[derive(Debug, Default)]
pub struct TextChanges {
  changes: Vec<TextChange>,
}

impl TextChanges {
  pub fn replace(&mut self, range: Range<usize>, new_text: String) -> bool {
    self.push(TextChange { range, new_text })
  }

  /// Whether a collected replacement covers `pos`.
  pub fn replaces(&self, pos: usize) -> bool {
    self.changes.iter().any(|c| {
      !is_insertion(c) && c.range.start <= pos && pos < c.range.end
    })
  }

  pub fn insert(&mut self, pos: usize, new_text: String) -> bool {
    self.push(TextChange {
      range: pos..pos,
      new_text,
    })
  }

  /// Like `insert`, but the text goes before every other insertion at the
  /// same position.
  pub fn prepend(&mut self, pos: usize, new_text: String) -> bool {
    let change = TextChange {
      range: pos..pos,
      new_text,
    };
    if self.conflicting(&change).is_some() {
      return false;
    }
    self.changes.insert(0, change);
    true
  }

  pub fn remove(&mut self, range: Range<usize>) -> bool {
    self.push(TextChange {
      range,
      new_text: String::new(),
    })
  }

  fn push(&mut self, change: TextChange) -> bool {
    if self.conflicting(&change).is_some() {
      return false;
    }
    self.changes.push(change);
    true
  }

  fn conflicting(&self, change: &TextChange) -> Option<&TextChange> {
    let existing = self.changes.iter().find(|c| conflicts(c, change))?;
    log::debug!(
      "Skipping edit at {:?} overlapping edit at {:?}",
      change.range,
      existing.range
    );
    Some(existing)
  }

  /// Applies the edits. Insertions at the same position keep the order they
  /// were added in and come before a replacement starting there.
  pub fn apply(self, text: &str) -> String {
    apply_text_changes(text, self.changes)
  }
}
