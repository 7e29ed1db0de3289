// Copyright 2018-2024 the Deno authors. MIT license.

// remove this after https://github.com/rustwasm/wasm-bindgen/issues/2774 is released
#![allow(clippy::unused_unit)]

use std::sync::Arc;

use serde::Serialize;
use teamsjs_migrate::MediaType;
use teamsjs_migrate::ModuleSpecifier;
use teamsjs_migrate::TransformOptions;
use teamsjs_migrate::TransformParams;
use teamsjs_migrate::TEAMS_JS_MODULE;
use teamsjs_migrate::TEAMS_JS_V2_VERSION_REQ;
use wasm_bindgen::prelude::*;

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
  JsValue::from(js_sys::Error::new(&err.to_string()))
}

#[wasm_bindgen(js_name = transformJs)]
pub fn js_transform_js(text: String) -> Result<String, JsValue> {
  console_error_panic_hook::set_once();
  teamsjs_migrate::transform_js(&text).map_err(to_js_error)
}

#[wasm_bindgen(js_name = transformTs)]
pub fn js_transform_ts(text: String) -> Result<String, JsValue> {
  console_error_panic_hook::set_once();
  teamsjs_migrate::transform_ts(&text).map_err(to_js_error)
}

/// Migrates a file, picking the syntax from the specifier's extension, and
/// returns `{ text, report }`.
#[wasm_bindgen(js_name = transformFile)]
pub fn js_transform_file(
  specifier: String,
  text: String,
) -> Result<JsValue, JsValue> {
  console_error_panic_hook::set_once();
  let specifier = ModuleSpecifier::parse(&specifier).map_err(to_js_error)?;
  let output = transform_file(&specifier, text).map_err(to_js_error)?;
  let serializer =
    serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
  output.serialize(&serializer).map_err(to_js_error)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileOutput {
  text: String,
  report: teamsjs_migrate::FileReport,
}

fn transform_file(
  specifier: &ModuleSpecifier,
  text: String,
) -> Result<FileOutput, teamsjs_migrate::TransformError> {
  let output = teamsjs_migrate::transform(TransformParams {
    specifier,
    text: Arc::from(text),
    media_type: MediaType::from_specifier(specifier),
    options: &TransformOptions::default(),
  })?;
  Ok(FileOutput {
    text: output.text,
    report: output.report,
  })
}

/// Returns the updated package.json text, or `undefined` when the SDK
/// dependency is absent or already current.
#[wasm_bindgen(js_name = updatePackageJson)]
pub fn js_update_package_json(
  text: String,
  maybe_version: Option<String>,
) -> Result<Option<String>, JsValue> {
  console_error_panic_hook::set_once();
  let version = maybe_version.as_deref().unwrap_or(TEAMS_JS_V2_VERSION_REQ);
  teamsjs_migrate::update_package_json(&text, TEAMS_JS_MODULE, version)
    .map_err(to_js_error)
}
