// Copyright 2018-2024 the Deno authors. MIT license.

use std::panic::AssertUnwindSafe;

use file_test_runner::collect_and_run_tests;
use file_test_runner::collection::strategies::TestPerFileCollectionStrategy;
use file_test_runner::collection::CollectOptions;
use file_test_runner::collection::CollectedTest;
use file_test_runner::RunOptions;
use file_test_runner::TestResult;
use pretty_assertions::assert_eq;
use teamsjs_migrate::transform;
use teamsjs_migrate::FileReport;
use teamsjs_migrate::MediaType;
use teamsjs_migrate::TransformOptions;
use teamsjs_migrate::TransformOutput;
use teamsjs_migrate::TransformParams;
use url::Url;

fn main() {
  // RUST_LOG=debug shows why a rewrite was skipped
  let _ = env_logger::try_init();
  collect_and_run_tests(
    CollectOptions {
      base: "tests/specs".into(),
      strategy: Box::new(TestPerFileCollectionStrategy {
        file_pattern: Some(
          "^*.[/\\\\]specs[/\\\\](:?transform)[/\\\\].*$".to_owned(),
        ),
      }),
      filter_override: None,
    },
    RunOptions { parallel: true },
    |test: &CollectedTest| {
      if test.name.starts_with("specs::transform") {
        TestResult::from_maybe_panic(AssertUnwindSafe(|| {
          run_transform_test(test);
        }))
      } else {
        TestResult::Failed {
          output: format!("Unknown test kind: {}", test.name).into_bytes(),
        }
      }
    },
  )
}

fn run_transform_test(test: &CollectedTest) {
  let file_text = test.read_to_string().unwrap();
  let spec = parse_spec(file_text);
  let options = TransformOptions::default();
  let output = run_transform(&spec.input, &spec.input.text, &options);

  let update = std::env::var("UPDATE").as_deref() == Ok("1");
  let spec = if update {
    let mut spec = spec;
    spec.output_file.text = output.text.clone();
    if spec.report.is_some() {
      spec.report = Some(output.report.clone());
    }
    std::fs::write(&test.path, spec.emit()).unwrap();
    spec
  } else {
    spec
  };
  assert_eq!(
    output.text,
    spec.output_file.text,
    "Should be same for {}",
    test.path.display()
  );
  if let Some(report) = &spec.report {
    assert_eq!(
      &output.report,
      report,
      "Should be same for {}",
      test.path.display()
    );
  }

  // migrating the migrated text again must not change it
  let second = run_transform(&spec.input, &output.text, &options);
  assert_eq!(
    second.text,
    output.text,
    "Should be idempotent for {}",
    test.path.display()
  );
}

fn run_transform(
  file: &SpecFile,
  text: &str,
  options: &TransformOptions,
) -> TransformOutput {
  let specifier = file.url();
  transform(TransformParams {
    specifier: &specifier,
    text: text.into(),
    media_type: MediaType::from_specifier(&specifier),
    options,
  })
  .unwrap()
}

pub struct Spec {
  pub input: SpecFile,
  pub output_file: SpecFile,
  pub report: Option<FileReport>,
}

impl Spec {
  pub fn emit(&self) -> String {
    let mut text = self.input.emit();
    text.push('\n');
    if let Some(report) = &self.report {
      text.push_str("# report\n");
      text.push_str(&serde_json::to_string_pretty(report).unwrap());
      text.push_str("\n\n");
    }
    text.push_str(&self.output_file.emit());
    text
  }
}

#[derive(Debug)]
pub struct SpecFile {
  pub specifier: String,
  pub text: String,
}

impl SpecFile {
  pub fn emit(&self) -> String {
    format!("# {}\n{}", self.specifier, self.text)
  }

  pub fn url(&self) -> Url {
    Url::parse(&format!("file:///{}", self.specifier)).unwrap()
  }
}

pub fn parse_spec(text: String) -> Spec {
  let mut files = Vec::new();
  let mut current_file = None;
  for line in text.split('\n') {
    if let Some(specifier) = line.strip_prefix("# ") {
      if let Some(file) = current_file.take() {
        files.push(file);
      }
      current_file = Some(SpecFile {
        specifier: specifier.to_string(),
        text: String::new(),
      });
    } else {
      let current_file = current_file.as_mut().unwrap();
      if !current_file.text.is_empty() {
        current_file.text.push('\n');
      }
      current_file.text.push_str(line);
    }
  }
  files.push(current_file.unwrap());
  let output_file =
    files.remove(files.iter().position(|f| f.specifier == "output").unwrap());
  let report = files
    .iter()
    .position(|f| f.specifier == "report")
    .map(|index| files.remove(index))
    .map(|file| serde_json::from_str::<ReportSection>(&file.text).unwrap())
    .map(FileReport::from);
  assert_eq!(files.len(), 1, "Expected a single input file.");
  Spec {
    input: files.remove(0),
    output_file,
    report,
  }
}

/// Mirror of the serialized report, which the library only serializes.
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ReportSection {
  rewritten_calls: usize,
  flagged_calls: usize,
  rewritten_types: usize,
  rewritten_enums: usize,
  opaque_sites: usize,
  unmatched_references: usize,
  flagged_references: usize,
  rewritten_imports: bool,
}

impl From<ReportSection> for FileReport {
  fn from(section: ReportSection) -> Self {
    FileReport {
      rewritten_calls: section.rewritten_calls,
      flagged_calls: section.flagged_calls,
      rewritten_types: section.rewritten_types,
      rewritten_enums: section.rewritten_enums,
      opaque_sites: section.opaque_sites,
      unmatched_references: section.unmatched_references,
      flagged_references: section.flagged_references,
      rewritten_imports: section.rewritten_imports,
    }
  }
}
