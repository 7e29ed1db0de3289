// Copyright 2018-2024 the Deno authors. MIT license.

#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

mod advisory;
mod imports;
mod mappings;
mod package_json;
mod project;
mod replacement;
mod report;
mod rewrite;
mod swc_helpers;
mod text_changes;
mod transform;

pub use advisory::CALLBACK_TO_PROMISE;
pub use advisory::CONTEXT_SCHEMA_CHANGED;
pub use advisory::DYNAMIC_IMPORT_NOT_HANDLED;
pub use advisory::REQUIRE_NOT_HANDLED;
pub use advisory::UNMIGRATED_REFERENCE;
pub use deno_ast::MediaType;
pub use deno_ast::ModuleSpecifier;
pub use imports::ImportInfo;
pub use imports::SingleExportImport;
pub use imports::WholeModuleImport;
pub use imports::WholeModuleImportStyle;
pub use mappings::CallbackConversion;
pub use mappings::MappingEntry;
pub use mappings::MappingError;
pub use mappings::MappingFile;
pub use mappings::MappingTable;
pub use mappings::ReplacementRule;
pub use mappings::RuleGroup;
pub use mappings::TEAMS_JS_DEFAULT_ALIAS;
pub use mappings::TEAMS_JS_MODULE;
pub use mappings::TEAMS_JS_V2_VERSION_REQ;
pub use package_json::update_package_json;
pub use package_json::PackageJsonError;
pub use project::migrate_project;
pub use project::FileEntry;
pub use project::FileFailure;
pub use project::MigrateFileError;
pub use project::MigrateProjectError;
pub use project::MigrateProjectOptions;
pub use project::MigrationConfig;
pub use project::ProjectReport;
pub use report::FileReport;
pub use rewrite::render_import_declarations;
pub use transform::transform;
pub use transform::transform_js;
pub use transform::transform_ts;
pub use transform::TransformError;
pub use transform::TransformOptions;
pub use transform::TransformOutput;
pub use transform::TransformParams;
