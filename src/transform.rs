// Copyright 2018-2024 the Deno authors. MIT license.

use std::sync::Arc;

use deno_ast::MediaType;
use deno_ast::ModuleSpecifier;
use deno_ast::ParseDiagnostic;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::imports::resolve_imports;
use crate::mappings::MappingTable;
use crate::mappings::TEAMS_JS_DEFAULT_ALIAS;
use crate::mappings::TEAMS_JS_MODULE;
use crate::report::FileReport;
use crate::rewrite::flag_unmigrated_references;
use crate::rewrite::rewrite_enum_references;
use crate::rewrite::rewrite_function_calls;
use crate::rewrite::rewrite_imports;
use crate::rewrite::rewrite_type_references;
use crate::rewrite::RewriteContext;
use crate::swc_helpers::SourceFile;

static JS_SPECIFIER: Lazy<ModuleSpecifier> =
  Lazy::new(|| ModuleSpecifier::parse("file:///input.js").unwrap());
static TS_SPECIFIER: Lazy<ModuleSpecifier> =
  Lazy::new(|| ModuleSpecifier::parse("file:///input.ts").unwrap());

#[derive(Debug, Error, deno_error::JsError)]
pub enum TransformError {
  #[class(syntax)]
  #[error(transparent)]
  Parse(#[from] ParseDiagnostic),
  #[class(type)]
  #[error("Expected a JavaScript or TypeScript module, but identified a {media_type} module.\n  Specifier: {specifier}")]
  UnsupportedMediaType {
    specifier: ModuleSpecifier,
    media_type: MediaType,
  },
}

/// What to migrate away from and how.
#[derive(Debug, Clone)]
pub struct TransformOptions {
  /// Specifier of the legacy module as written in imports.
  pub module_name: String,
  /// Global name scripts used for the module without importing it.
  pub default_alias: String,
  pub mappings: Arc<MappingTable>,
}

impl Default for TransformOptions {
  fn default() -> Self {
    Self {
      module_name: TEAMS_JS_MODULE.to_string(),
      default_alias: TEAMS_JS_DEFAULT_ALIAS.to_string(),
      mappings: MappingTable::teams_js_v2(),
    }
  }
}

pub struct TransformParams<'a> {
  pub specifier: &'a ModuleSpecifier,
  pub text: Arc<str>,
  pub media_type: MediaType,
  pub options: &'a TransformOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
  pub text: String,
  pub report: FileReport,
}

/// Migrates JavaScript source text using the built-in teams-js mapping.
pub fn transform_js(text: &str) -> Result<String, TransformError> {
  transform(TransformParams {
    specifier: &JS_SPECIFIER,
    text: text.into(),
    media_type: MediaType::JavaScript,
    options: &TransformOptions::default(),
  })
  .map(|output| output.text)
}

/// Migrates TypeScript source text using the built-in teams-js mapping.
pub fn transform_ts(text: &str) -> Result<String, TransformError> {
  transform(TransformParams {
    specifier: &TS_SPECIFIER,
    text: text.into(),
    media_type: MediaType::TypeScript,
    options: &TransformOptions::default(),
  })
  .map(|output| output.text)
}

/// Runs the migration pipeline over one file.
///
/// Each call is independent: nothing learned about one file's imports
/// is visible when transforming another.
pub fn transform(
  params: TransformParams,
) -> Result<TransformOutput, TransformError> {
  let has_types = match params.media_type {
    MediaType::JavaScript
    | MediaType::Jsx
    | MediaType::Mjs
    | MediaType::Cjs => false,
    MediaType::TypeScript
    | MediaType::Mts
    | MediaType::Cts
    | MediaType::Dts
    | MediaType::Dmts
    | MediaType::Dcts
    | MediaType::Tsx => true,
    media_type => {
      return Err(TransformError::UnsupportedMediaType {
        specifier: params.specifier.clone(),
        media_type,
      })
    }
  };
  let options = params.options;
  let parsed_source = deno_ast::parse_program(deno_ast::ParseParams {
    specifier: params.specifier.clone(),
    text: params.text,
    media_type: params.media_type,
    capture_tokens: false,
    scope_analysis: false,
    maybe_syntax: None,
  })?;
  let file = SourceFile::new(&parsed_source);
  let program = parsed_source.program_ref();

  let resolved = resolve_imports(
    program,
    &file,
    &options.module_name,
    &options.default_alias,
  );
  let sites = resolved.sites;
  let mut ctx = RewriteContext::new(&file, resolved.info);
  let uses_implicit_alias = sites.uses_implicit_alias();
  if uses_implicit_alias {
    log::debug!(
      "{} references {} without importing it",
      params.specifier,
      options.default_alias
    );
    ctx.info.add_tentative_alias(&options.default_alias);
  }

  rewrite_function_calls(program, &mut ctx, &options.mappings.functions);
  // the legacy JavaScript surface only needs calls and imports migrated
  if has_types {
    rewrite_type_references(program, &mut ctx, &options.mappings.interfaces);
    rewrite_enum_references(program, &mut ctx, &options.mappings.enums);
  }

  if uses_implicit_alias && !ctx.info.settle_tentative_aliases() {
    log::debug!(
      "Dropped implicit {} import for {}",
      options.default_alias,
      params.specifier
    );
  }
  flag_unmigrated_references(program, &mut ctx);
  rewrite_imports(&mut ctx, &sites, &options.module_name);

  let RewriteContext {
    changes, report, ..
  } = ctx;
  Ok(TransformOutput {
    text: changes.apply(file.text()),
    report,
  })
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::advisory;

  #[test]
  fn migrates_single_export_call() {
    let output = transform_js(
      r#"import { getContext } from "@microsoft/teams-js";
getContext(cb);
"#,
    )
    .unwrap();
    assert_eq!(
      output,
      format!(
        r#"import {{ app }} from "@microsoft/teams-js";
{}
{}
app.getContext(cb);
"#,
        advisory::CALLBACK_TO_PROMISE,
        advisory::CONTEXT_SCHEMA_CHANGED
      )
    );
  }

  #[test]
  fn returns_parse_errors() {
    let err =
      transform_ts("import { from \"@microsoft/teams-js\";").unwrap_err();
    assert!(matches!(err, TransformError::Parse(_)));
  }

  #[test]
  fn rejects_unsupported_media_types() {
    let specifier = ModuleSpecifier::parse("file:///data.json").unwrap();
    let err = transform(TransformParams {
      specifier: &specifier,
      text: "{}".into(),
      media_type: MediaType::Json,
      options: &TransformOptions::default(),
    })
    .unwrap_err();
    assert_eq!(
      err.to_string(),
      "Expected a JavaScript or TypeScript module, but identified a Json module.\n  Specifier: file:///data.json"
    );
  }

  #[test]
  fn skips_type_and_enum_stages_for_javascript() {
    let text = r#"import * as teams from "@microsoft/teams-js";
log(teams.appInitialization.FailedReason.Timeout);
"#;
    assert_eq!(transform_js(text).unwrap(), text);
    assert_eq!(
      transform_ts(text).unwrap(),
      r#"import * as teams from "@microsoft/teams-js";
log(teams.app.FailedReason.Timeout);
"#
    );
  }

  #[test]
  fn leaves_files_without_legacy_references_untouched() {
    let text = "import { a } from \"./a.js\";\n\nexport const b = a + 1;\n";
    let output = transform(TransformParams {
      specifier: &JS_SPECIFIER,
      text: text.into(),
      media_type: MediaType::JavaScript,
      options: &TransformOptions::default(),
    })
    .unwrap();
    assert_eq!(output.text, text);
    assert_eq!(output.report, FileReport::default());
  }
}
