// Copyright 2018-2024 the Deno authors. MIT license.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use deno_ast::MediaType;
use serde::Deserialize;
use serde::Serialize;
use sys_traits::FsDirEntry;
use sys_traits::FsRead;
use sys_traits::FsReadDir;
use sys_traits::FsWrite;
use thiserror::Error;

use crate::mappings::MappingError;
use crate::mappings::MappingTable;
use crate::mappings::TEAMS_JS_V2_VERSION_REQ;
use crate::package_json::update_package_json;
use crate::package_json::PackageJsonError;
use crate::report::FileReport;
use crate::transform::transform;
use crate::transform::TransformError;
use crate::transform::TransformOptions;
use crate::transform::TransformParams;

const PACKAGE_JSON: &str = "package.json";

#[derive(Debug, Error, deno_error::JsError)]
pub enum MigrateProjectError {
  #[class(generic)]
  #[error("Failed reading {}.", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[class(type)]
  #[error("Failed parsing migration config {}.", path.display())]
  Config {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
  #[class(inherit)]
  #[error(transparent)]
  Mapping(#[from] MappingError),
  #[class(inherit)]
  #[error(transparent)]
  PackageJson(#[from] PackageJsonError),
}

/// Why a single file couldn't be migrated. Recorded in the report instead
/// of stopping the run.
#[derive(Debug, Error, deno_error::JsError)]
pub enum MigrateFileError {
  #[class(generic)]
  #[error("Failed reading file")]
  Read(#[source] std::io::Error),
  #[class(inherit)]
  #[error(transparent)]
  Specifier(#[from] deno_path_util::PathToUrlError),
  #[class(inherit)]
  #[error(transparent)]
  Transform(#[from] TransformError),
  #[class(generic)]
  #[error("Failed writing file")]
  Write(#[source] std::io::Error),
}

/// The JSON configuration file of a migration run. Every field is optional
/// and falls back to migrating teams-js v1 to v2.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MigrationConfig {
  pub module_name: Option<String>,
  pub default_alias: Option<String>,
  /// Mapping table to use instead of the built-in one, relative to the
  /// config file.
  pub mappings_file: Option<PathBuf>,
  pub package_version: Option<String>,
  /// Directory or file names that are skipped while walking the project.
  #[serde(default)]
  pub exclude: Vec<String>,
}

impl MigrationConfig {
  pub fn load(
    sys: &impl FsRead,
    path: &Path,
  ) -> Result<Self, MigrateProjectError> {
    let text = read_to_string(sys, path)?;
    serde_json::from_str(&text).map_err(|source| MigrateProjectError::Config {
      path: path.to_path_buf(),
      source,
    })
  }
}

#[derive(Debug, Clone)]
pub struct MigrateProjectOptions {
  pub transform: TransformOptions,
  /// Version requirement written to the package.json dependency tables.
  pub package_version: String,
  pub exclude: Vec<String>,
  /// Report what would change without writing anything.
  pub dry_run: bool,
}

impl Default for MigrateProjectOptions {
  fn default() -> Self {
    Self {
      transform: TransformOptions::default(),
      package_version: TEAMS_JS_V2_VERSION_REQ.to_string(),
      exclude: Vec::new(),
      dry_run: false,
    }
  }
}

impl MigrateProjectOptions {
  /// Resolves a config, loading its mapping file relative to `config_dir`.
  pub fn from_config(
    sys: &impl FsRead,
    config_dir: &Path,
    config: MigrationConfig,
  ) -> Result<Self, MigrateProjectError> {
    let mut options = Self::default();
    if let Some(module_name) = config.module_name {
      options.transform.module_name = module_name;
    }
    if let Some(default_alias) = config.default_alias {
      options.transform.default_alias = default_alias;
    }
    if let Some(mappings_file) = config.mappings_file {
      let path = config_dir.join(mappings_file);
      let text = read_to_string(sys, &path)?;
      options.transform.mappings =
        Arc::new(MappingTable::from_json_str(&text)?);
    }
    if let Some(package_version) = config.package_version {
      options.package_version = package_version;
    }
    options.exclude = config.exclude;
    Ok(options)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
  pub path: PathBuf,
  pub changed: bool,
  pub report: FileReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
  pub path: PathBuf,
  pub message: String,
}

/// Summary of a migration run for a human reviewer.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReport {
  pub files: Vec<FileEntry>,
  pub failures: Vec<FileFailure>,
  pub package_json_updated: bool,
  pub totals: FileReport,
}

impl ProjectReport {
  pub fn changed_files(&self) -> impl Iterator<Item = &FileEntry> {
    self.files.iter().filter(|file| file.changed)
  }
}

/// Migrates every JavaScript and TypeScript file below `root` and pins the
/// new SDK version in `root/package.json`.
///
/// A file that fails to read, parse or write is recorded in the report and
/// doesn't stop the run.
pub fn migrate_project<TSys: FsRead + FsWrite + FsReadDir>(
  sys: &TSys,
  root: &Path,
  options: &MigrateProjectOptions,
) -> Result<ProjectReport, MigrateProjectError> {
  let mut paths = Vec::new();
  collect_source_files(sys, root, &options.exclude, &mut paths)?;
  paths.sort();

  let mut report = ProjectReport::default();
  for path in paths {
    match migrate_file(sys, &path, options) {
      Ok(entry) => {
        report.totals.add(&entry.report);
        report.files.push(entry);
      }
      Err(err) => {
        log::warn!("Skipped {}: {:#}", path.display(), err);
        report.failures.push(FileFailure {
          path,
          message: failure_message(&err),
        });
      }
    }
  }

  let package_json_path = root.join(PACKAGE_JSON);
  match sys.fs_read_to_string(&package_json_path) {
    Ok(text) => {
      let updated = update_package_json(
        &text,
        &options.transform.module_name,
        &options.package_version,
      )?;
      if let Some(updated) = updated {
        if !options.dry_run {
          sys.fs_write(&package_json_path, updated).map_err(|source| {
            MigrateProjectError::Io {
              path: package_json_path.clone(),
              source,
            }
          })?;
        }
        report.package_json_updated = true;
      }
    }
    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
      log::debug!("No package.json in {}", root.display());
    }
    Err(source) => {
      return Err(MigrateProjectError::Io {
        path: package_json_path,
        source,
      })
    }
  }

  Ok(report)
}

fn read_to_string(
  sys: &impl FsRead,
  path: &Path,
) -> Result<String, MigrateProjectError> {
  sys
    .fs_read_to_string(path)
    .map(|text| text.to_string())
    .map_err(|source| MigrateProjectError::Io {
      path: path.to_path_buf(),
      source,
    })
}

/// Joins an error with its sources into one line for the report.
fn failure_message(err: &MigrateFileError) -> String {
  let mut message = err.to_string();
  let mut source = std::error::Error::source(err);
  while let Some(err) = source {
    message.push_str(": ");
    message.push_str(&err.to_string());
    source = err.source();
  }
  message
}

fn migrate_file<TSys: FsRead + FsWrite>(
  sys: &TSys,
  path: &Path,
  options: &MigrateProjectOptions,
) -> Result<FileEntry, MigrateFileError> {
  let text: String = sys
    .fs_read_to_string(path)
    .map(|text| text.to_string())
    .map_err(MigrateFileError::Read)?;
  let specifier = deno_path_util::url_from_file_path(path)?;
  let output = transform(TransformParams {
    specifier: &specifier,
    text: Arc::from(text.as_str()),
    media_type: MediaType::from_path(path),
    options: &options.transform,
  })?;

  let changed = output.text != text;
  if changed && !options.dry_run {
    sys
      .fs_write(path, &output.text)
      .map_err(MigrateFileError::Write)?;
  }
  if changed {
    log::info!("Migrated {}", path.display());
  } else {
    log::debug!("Nothing to migrate in {}", path.display());
  }
  Ok(FileEntry {
    path: path.to_path_buf(),
    changed,
    report: output.report,
  })
}

fn collect_source_files<TSys: FsReadDir>(
  sys: &TSys,
  dir: &Path,
  exclude: &[String],
  paths: &mut Vec<PathBuf>,
) -> Result<(), MigrateProjectError> {
  let entries = match sys.fs_read_dir(dir) {
    Ok(entries) => entries,
    Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
      log::warn!("Skipping unreadable directory {}", dir.display());
      return Ok(());
    }
    Err(source) => {
      return Err(MigrateProjectError::Io {
        path: dir.to_path_buf(),
        source,
      })
    }
  };
  for entry in entries {
    let entry = match entry {
      Ok(entry) => entry,
      Err(err) => {
        log::warn!("Failed reading entry in {}: {:#}", dir.display(), err);
        continue;
      }
    };
    let file_name = entry.file_name();
    let file_name = file_name.to_string_lossy();
    if exclude.iter().any(|name| name.as_str() == file_name) {
      continue;
    }
    let file_type = match entry.file_type() {
      Ok(file_type) => file_type,
      Err(err) => {
        log::warn!(
          "Failed reading file type in {}: {:#}",
          dir.display(),
          err
        );
        continue;
      }
    };
    if file_type.is_dir() {
      if file_name.starts_with('.') || file_name == "node_modules" {
        continue;
      }
      collect_source_files(sys, &entry.path(), exclude, paths)?;
    } else if file_type.is_file() {
      let path = entry.path().into_owned();
      if is_migratable(&path) {
        paths.push(path);
      }
    }
  }
  Ok(())
}

fn is_migratable(path: &Path) -> bool {
  matches!(
    MediaType::from_path(path),
    MediaType::JavaScript
      | MediaType::Jsx
      | MediaType::Mjs
      | MediaType::Cjs
      | MediaType::TypeScript
      | MediaType::Mts
      | MediaType::Cts
      | MediaType::Tsx
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_source_files_are_migrated() {
    assert!(is_migratable(Path::new("/a/b.js")));
    assert!(is_migratable(Path::new("/a/b.tsx")));
    assert!(is_migratable(Path::new("/a/b.mts")));
    assert!(!is_migratable(Path::new("/a/b.d.ts")));
    assert!(!is_migratable(Path::new("/a/b.json")));
    assert!(!is_migratable(Path::new("/a/b.css")));
  }

  #[test]
  fn failure_message_includes_sources() {
    let err = MigrateFileError::Read(std::io::Error::new(
      std::io::ErrorKind::NotFound,
      "entry not found",
    ));
    assert_eq!(failure_message(&err), "Failed reading file: entry not found");
    let err = MigrateFileError::from(deno_path_util::PathToUrlError(
      PathBuf::from("relative.ts"),
    ));
    assert_eq!(
      failure_message(&err),
      "Could not convert path to URL.\n  Path: relative.ts"
    );
  }

  #[test]
  fn config_rejects_unknown_fields() {
    let err = serde_json::from_str::<MigrationConfig>(r#"{ "modules": [] }"#)
      .unwrap_err();
    assert!(err.to_string().contains("unknown field `modules`"));
    let config: MigrationConfig = serde_json::from_str(
      r#"{ "moduleName": "legacy", "exclude": ["dist"] }"#,
    )
    .unwrap();
    assert_eq!(
      config,
      MigrationConfig {
        module_name: Some("legacy".to_string()),
        exclude: vec!["dist".to_string()],
        ..Default::default()
      }
    );
  }
}
