// Copyright 2018-2024 the Deno authors. MIT license.

use std::ops::Range;

use capacity_builder::StringBuilder;
use indexmap::IndexMap;
use indexmap::IndexSet;

use super::RewriteContext;
use crate::advisory;
use crate::imports::ImportInfo;
use crate::imports::ImportSites;
use crate::imports::OpaqueSiteKind;
use crate::imports::WholeModuleImportStyle;

/// Replaces the legacy import declarations with ones matching the rewritten
/// references and flags `require()`/`import()` loads of the module.
///
/// Reads the import targets recorded by the earlier stages; mutates nothing
/// but the text changes and the report.
pub fn rewrite_imports(
  ctx: &mut RewriteContext<'_>,
  sites: &ImportSites,
  module_name: &str,
) {
  let declarations = render_import_declarations(
    &ctx.info,
    module_name,
    sites.has_side_effect_import,
  );
  let new_text = declarations.join("\n");

  if let Some((first, rest)) = sites.declarations.split_first() {
    if !rest.is_empty() || ctx.source_text(first.clone()) != new_text {
      ctx.report.rewritten_imports = true;
    }
    if new_text.is_empty() {
      let range = expand_to_full_lines(ctx, first.clone());
      ctx.changes.remove(range);
    } else {
      ctx.changes.replace(first.clone(), new_text);
    }
    for range in rest {
      let range = expand_to_full_lines(ctx, range.clone());
      ctx.changes.remove(range);
    }
  } else if !new_text.is_empty() {
    // only the implicit global alias can produce imports for a file
    // without legacy import declarations
    if let Some(pos) = sites.first_item_start {
      ctx.changes.prepend(pos, format!("{}\n", new_text));
      ctx.report.rewritten_imports = true;
    }
  }

  for site in &sites.opaque {
    let comment = match site.kind {
      OpaqueSiteKind::Require => advisory::REQUIRE_NOT_HANDLED,
      OpaqueSiteKind::DynamicImport => advisory::DYNAMIC_IMPORT_NOT_HANDLED,
    };
    ctx.report.opaque_sites += 1;
    advisory::insert_comment_lines(
      &mut ctx.changes,
      ctx.file,
      site.comment_pos,
      &[comment],
    );
  }
}

/// Widens a removed declaration's range to its whole line when nothing
/// else is on that line.
fn expand_to_full_lines(
  ctx: &RewriteContext<'_>,
  range: Range<usize>,
) -> Range<usize> {
  let file = ctx.file;
  let text = file.text();
  let line_start = file.line_start(range.start);
  let line_end = file
    .next_line_start(range.end)
    .unwrap_or(text.len());
  if text[line_start..range.start].trim().is_empty()
    && text[range.end..line_end].trim().is_empty()
  {
    line_start..line_end
  } else {
    range
  }
}

/// Builds the import declarations for the legacy module: one named import
/// for every single export, then one declaration per whole-module alias.
pub fn render_import_declarations(
  info: &ImportInfo,
  module_name: &str,
  has_side_effect_import: bool,
) -> Vec<String> {
  let module_specifier = quote(module_name);
  let mut declarations = Vec::new();

  // rendered specifier -> whether every import behind it is type only
  let mut specifiers: IndexMap<String, bool> = IndexMap::new();
  let mut add_specifier = |specifier: String, is_type_only: bool| {
    specifiers
      .entry(specifier)
      .and_modify(|type_only| *type_only &= is_type_only)
      .or_insert(is_type_only);
  };
  for import in &info.single_export_imports {
    let original = match &import.alias {
      Some(alias) => format!("{} as {}", export_name(&import.source), alias),
      None => export_name(&import.source),
    };
    match &import.target {
      Some(target) => {
        add_specifier(target.clone(), import.is_type_only);
        if import.keeps_local_binding {
          add_specifier(original, import.is_type_only);
        }
      }
      None => add_specifier(original, import.is_type_only),
    }
  }
  if !specifiers.is_empty() {
    let all_type_only = specifiers.values().all(|type_only| *type_only);
    declarations.push(
      StringBuilder::<String>::build(|builder| {
        builder.append("import ");
        if all_type_only {
          builder.append("type ");
        }
        builder.append("{ ");
        for (i, (specifier, type_only)) in specifiers.iter().enumerate() {
          if i > 0 {
            builder.append(", ");
          }
          if *type_only && !all_type_only {
            builder.append("type ");
          }
          builder.append(specifier.as_str());
        }
        builder.append(" } from ");
        builder.append(module_specifier.as_str());
        builder.append(';');
      })
      .unwrap(),
    );
  }

  let mut seen_aliases = IndexSet::new();
  for import in &info.whole_module_imports {
    if !seen_aliases.insert(import.alias.as_str()) {
      continue;
    }
    declarations.push(
      StringBuilder::<String>::build(|builder| {
        builder.append("import ");
        match import.style {
          WholeModuleImportStyle::Default => {
            builder.append(import.alias.as_str());
            builder.append(" from ");
            builder.append(module_specifier.as_str());
          }
          WholeModuleImportStyle::Namespace => {
            builder.append("* as ");
            builder.append(import.alias.as_str());
            builder.append(" from ");
            builder.append(module_specifier.as_str());
          }
          WholeModuleImportStyle::RequireEquals => {
            builder.append(import.alias.as_str());
            builder.append(" = require(");
            builder.append(module_specifier.as_str());
            builder.append(')');
          }
        }
        builder.append(';');
      })
      .unwrap(),
    );
  }

  if declarations.is_empty() && has_side_effect_import {
    declarations.push(format!("import {};", module_specifier));
  }
  declarations
}

fn export_name(name: &str) -> String {
  if deno_ast::swc::ast::Ident::verify_symbol(name).is_ok() {
    name.to_string()
  } else {
    quote(name)
  }
}

fn quote(text: &str) -> String {
  format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
