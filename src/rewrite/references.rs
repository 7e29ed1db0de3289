// Copyright 2018-2024 the Deno authors. MIT license.

use std::collections::HashSet;

use deno_ast::swc::ast::Ident;
use deno_ast::ProgramRef;

use super::RewriteContext;
use crate::advisory;
use crate::swc_helpers::visit_program;
use crate::swc_helpers::AnchorStack;
use crate::swc_helpers::CallSite;
use crate::swc_helpers::CallSiteHandler;
use crate::swc_helpers::CallWalker;

/// Flags references through a named import that was retargeted to a new
/// namespace but that no rewrite covered. The import keeps its original
/// specifier so those references still resolve.
pub fn flag_unmigrated_references(
  program: ProgramRef<'_>,
  ctx: &mut RewriteContext<'_>,
) {
  let retargeted = ctx
    .info
    .single_export_imports
    .iter()
    .enumerate()
    .filter(|(_, import)| import.drops_local_binding())
    .map(|(index, import)| (import.local_name().to_string(), index))
    .collect::<Vec<_>>();
  if retargeted.is_empty() {
    return;
  }
  let file = ctx.file;
  let mut walker = CallWalker::new(
    file,
    LeftoverReferenceFlagger {
      ctx,
      retargeted,
      comment_positions: HashSet::new(),
    },
  );
  visit_program(program, &mut walker);
}

struct LeftoverReferenceFlagger<'c, 'a> {
  ctx: &'c mut RewriteContext<'a>,
  /// local name -> index of its single export import
  retargeted: Vec<(String, usize)>,
  comment_positions: HashSet<usize>,
}

impl CallSiteHandler for LeftoverReferenceFlagger<'_, '_> {
  fn handle_call(&mut self, _site: CallSite<'_>, _anchors: &AnchorStack)
    -> bool {
    false
  }

  fn handle_ident(&mut self, ident: &Ident, anchors: &AnchorStack) {
    let Some(index) = self
      .retargeted
      .iter()
      .find(|(name, _)| *name == *ident.sym)
      .map(|(_, index)| *index)
    else {
      return;
    };
    let file = self.ctx.file;
    let start = file.byte_range(ident).start;
    if self.ctx.changes.replaces(start) {
      return;
    }
    log::debug!("Unmigrated reference to {} at {}", ident.sym, start);
    self.ctx.report.flagged_references += 1;
    self.ctx.info.single_export_imports[index].keeps_local_binding = true;
    let pos = anchors.insertion_point(start, file);
    if self.comment_positions.insert(pos) {
      advisory::insert_comment_lines(
        &mut self.ctx.changes,
        file,
        pos,
        &[advisory::UNMIGRATED_REFERENCE],
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::imports::resolve_imports;
  use crate::mappings::MappingTable;
  use crate::rewrite::rewrite_function_calls;
  use crate::rewrite::rewrite_imports;
  use crate::rewrite::test_util::parse;
  use crate::swc_helpers::SourceFile;

  struct Output {
    text: String,
    flagged: usize,
  }

  fn migrate(text: &str) -> Output {
    let table = MappingTable::teams_js_v2();
    let parsed_source = parse(text);
    let file = SourceFile::new(&parsed_source);
    let program = parsed_source.program_ref();
    let resolved = resolve_imports(
      program,
      &file,
      "@microsoft/teams-js",
      "microsoftTeams",
    );
    let mut ctx = RewriteContext::new(&file, resolved.info);
    rewrite_function_calls(program, &mut ctx, &table.functions);
    flag_unmigrated_references(program, &mut ctx);
    rewrite_imports(&mut ctx, &resolved.sites, "@microsoft/teams-js");
    let RewriteContext {
      changes, report, ..
    } = ctx;
    Output {
      text: changes.apply(file.text()),
      flagged: report.flagged_references,
    }
  }

  #[test]
  fn keeps_binding_for_reference_outside_call() {
    let output = migrate(
      r#"import { getContext } from "@microsoft/teams-js";
app.getContext();
getContext();
const f = getContext;
"#,
    );
    assert_eq!(
      output.text,
      format!(
        r#"import {{ app, getContext }} from "@microsoft/teams-js";
app.getContext();
app.getContext();
{}
const f = getContext;
"#,
        advisory::UNMIGRATED_REFERENCE
      )
    );
    assert_eq!(output.flagged, 1);
  }

  #[test]
  fn flags_unmapped_member_on_retargeted_namespace() {
    let output = migrate(
      r#"import { settings } from "@microsoft/teams-js";
function save() {
  settings.setValidityState(true);
  settings.unknown(settings);
}
"#,
    );
    assert_eq!(
      output.text,
      format!(
        r#"import {{ pages, settings }} from "@microsoft/teams-js";
function save() {{
  pages.config.setValidityState(true);
  {}
  settings.unknown(settings);
}}
"#,
        advisory::UNMIGRATED_REFERENCE
      )
    );
    assert_eq!(output.flagged, 2);
  }

  #[test]
  fn ignores_shadowing_bindings_and_untouched_imports() {
    let text = r#"import { getContext, unknown } from "@microsoft/teams-js";
getContext();
function f(getContext: number) {}
unknown();
"#;
    let output = migrate(text);
    assert_eq!(
      output.text,
      r#"import { app, unknown } from "@microsoft/teams-js";
app.getContext();
function f(getContext: number) {}
unknown();
"#
    );
    assert_eq!(output.flagged, 0);
  }
}
