// Copyright 2018-2024 the Deno authors. MIT license.

mod enums;
mod function;
mod imports;
mod interface;
mod references;

pub use enums::rewrite_enum_references;
pub use function::rewrite_function_calls;
pub use imports::render_import_declarations;
pub use imports::rewrite_imports;
pub use interface::rewrite_type_references;
pub use references::flag_unmigrated_references;

use crate::imports::ImportInfo;
use crate::report::FileReport;
use crate::swc_helpers::SourceFile;
use crate::text_changes::TextChanges;

/// State threaded through the rewrite stages of one file.
pub struct RewriteContext<'a> {
  pub file: &'a SourceFile<'a>,
  pub info: ImportInfo,
  pub changes: TextChanges,
  pub report: FileReport,
}

impl<'a> RewriteContext<'a> {
  pub fn new(file: &'a SourceFile<'a>, info: ImportInfo) -> Self {
    Self {
      file,
      info,
      changes: Default::default(),
      report: Default::default(),
    }
  }

  pub fn source_text(&self, range: std::ops::Range<usize>) -> &'a str {
    &self.file.text()[range]
  }
}
