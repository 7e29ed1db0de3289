// Copyright 2018-2024 the Deno authors. MIT license.

use std::ops::Range;

use deno_ast::swc::ast::BindingIdent;
use deno_ast::swc::ast::ClassDecl;
use deno_ast::swc::ast::FnDecl;
use deno_ast::swc::ast::Ident;
use deno_ast::swc::ast::ImportDecl;
use deno_ast::swc::ast::ImportSpecifier;
use deno_ast::swc::ast::ModuleDecl;
use deno_ast::swc::ast::ModuleExportName;
use deno_ast::swc::ast::ModuleItem;
use deno_ast::swc::ast::TsEnumDecl;
use deno_ast::swc::ast::TsImportEqualsDecl;
use deno_ast::swc::ast::TsModuleRef;
use deno_ast::swc::ecma_visit::Visit;
use deno_ast::swc::ecma_visit::VisitWith;
use deno_ast::ProgramRef;

use crate::swc_helpers::first_arg_str;
use crate::swc_helpers::str_value;
use crate::swc_helpers::visit_program;
use crate::swc_helpers::AnchorStack;
use crate::swc_helpers::CallSite;
use crate::swc_helpers::CallSiteHandler;
use crate::swc_helpers::CallWalker;
use crate::swc_helpers::CalleeRef;
use crate::swc_helpers::SourceFile;

/// A named import such as `{ getContext }` or `{ settings as s }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleExportImport {
  /// The exported name in the legacy module.
  pub source: String,
  /// The local name when it differs from `source`.
  pub alias: Option<String>,
  /// The first target namespace a reference through this binding was
  /// rewritten to.
  pub target: Option<String>,
  /// Set when references through the local name remain after a rewrite,
  /// so the original specifier has to stay next to the target.
  pub keeps_local_binding: bool,
  pub is_type_only: bool,
}

impl SingleExportImport {
  pub fn new(source: impl Into<String>, alias: Option<String>) -> Self {
    Self {
      source: source.into(),
      alias,
      target: None,
      keeps_local_binding: false,
      is_type_only: false,
    }
  }

  pub fn local_name(&self) -> &str {
    self.alias.as_deref().unwrap_or(&self.source)
  }

  /// Whether the rendered import no longer binds the local name.
  pub fn drops_local_binding(&self) -> bool {
    self
      .target
      .as_deref()
      .is_some_and(|target| target != self.local_name())
  }

  fn set_target(&mut self, target: &str) {
    match &self.target {
      Some(existing) if existing != target => {
        log::debug!(
          "Import of {} already retargeted to {}, ignoring {}",
          self.source,
          existing,
          target
        );
      }
      Some(_) => {}
      None => self.target = Some(target.to_string()),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WholeModuleImportStyle {
  /// `import alias from "module"`
  Default,
  /// `import * as alias from "module"`
  Namespace,
  /// `import alias = require("module")`
  RequireEquals,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WholeModuleImport {
  pub alias: String,
  pub style: WholeModuleImportStyle,
  tentative: bool,
  matched: bool,
}

impl WholeModuleImport {
  pub fn new(alias: impl Into<String>, style: WholeModuleImportStyle) -> Self {
    Self {
      alias: alias.into(),
      style,
      tentative: false,
      matched: false,
    }
  }
}

/// Identifies the import a rewritten reference went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOrigin {
  SingleExport(usize),
  WholeModule(usize),
}

/// Every binding the file gets from the legacy module.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportInfo {
  pub single_export_imports: Vec<SingleExportImport>,
  pub whole_module_imports: Vec<WholeModuleImport>,
}

impl ImportInfo {
  pub fn is_empty(&self) -> bool {
    self.single_export_imports.is_empty()
      && self.whole_module_imports.is_empty()
  }

  pub fn is_tracked_name(&self, name: &str) -> bool {
    self.is_whole_module_alias(name)
      || self.single_export_by_local(name).is_some()
  }

  pub fn is_whole_module_alias(&self, name: &str) -> bool {
    self.whole_module_index(name).is_some()
  }

  pub fn whole_module_index(&self, alias: &str) -> Option<usize> {
    self
      .whole_module_imports
      .iter()
      .position(|import| import.alias == alias)
  }

  pub fn single_export_by_local(
    &self,
    local_name: &str,
  ) -> Option<(usize, &SingleExportImport)> {
    self
      .single_export_imports
      .iter()
      .enumerate()
      .find(|(_, import)| import.local_name() == local_name)
  }

  /// Records that a reference through `origin` was rewritten to a path
  /// starting with `target_tokens`.
  pub fn record_match(
    &mut self,
    origin: ImportOrigin,
    target_tokens: &[String],
  ) {
    match origin {
      ImportOrigin::SingleExport(index) => {
        if let (Some(import), Some(target)) = (
          self.single_export_imports.get_mut(index),
          target_tokens.first(),
        ) {
          import.set_target(target);
        }
      }
      ImportOrigin::WholeModule(index) => {
        if let Some(import) = self.whole_module_imports.get_mut(index) {
          import.matched = true;
        }
      }
    }
  }

  /// Registers the conventional global alias as a namespace import that is
  /// only kept when a reference through it gets rewritten.
  pub fn add_tentative_alias(&mut self, alias: &str) {
    if self.is_tracked_name(alias) {
      return;
    }
    let mut import =
      WholeModuleImport::new(alias, WholeModuleImportStyle::Namespace);
    import.tentative = true;
    self.whole_module_imports.push(import);
  }

  /// Drops tentative aliases nothing was rewritten through. Returns whether
  /// a tentative alias was kept.
  pub fn settle_tentative_aliases(&mut self) -> bool {
    self
      .whole_module_imports
      .retain(|import| !import.tentative || import.matched);
    self
      .whole_module_imports
      .iter()
      .any(|import| import.tentative)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueSiteKind {
  Require,
  DynamicImport,
}

/// A load of the legacy module that can't be rewritten automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueSite {
  pub kind: OpaqueSiteKind,
  /// Where the advisory comment for the site goes.
  pub comment_pos: usize,
}

/// How the conventional global alias is used by the file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultAliasUsage {
  pub referenced: bool,
  pub declared: bool,
}

#[derive(Debug, Default)]
pub struct ImportSites {
  /// Ranges of every declaration importing the legacy module.
  pub declarations: Vec<Range<usize>>,
  pub has_side_effect_import: bool,
  pub opaque: Vec<OpaqueSite>,
  pub default_alias: DefaultAliasUsage,
  /// Start of the first module item, where a synthesized import goes.
  pub first_item_start: Option<usize>,
}

impl ImportSites {
  /// Whether references to the conventional global alias should be treated
  /// as references to the legacy module.
  pub fn uses_implicit_alias(&self) -> bool {
    let usage = self.default_alias;
    if !usage.referenced || usage.declared {
      return false;
    }
    self.has_side_effect_import || self.declarations.is_empty()
  }
}

#[derive(Debug)]
pub struct ResolvedImports {
  pub info: ImportInfo,
  pub sites: ImportSites,
}

pub fn resolve_imports(
  program: ProgramRef<'_>,
  file: &SourceFile,
  module_name: &str,
  default_alias: &str,
) -> ResolvedImports {
  let mut info = ImportInfo::default();
  let mut sites = ImportSites::default();

  if let ProgramRef::Module(module) = program {
    sites.first_item_start =
      module.body.first().map(|item| file.byte_range(item).start);
    for item in &module.body {
      let ModuleItem::ModuleDecl(decl) = item else {
        continue;
      };
      match decl {
        ModuleDecl::Import(import_decl)
          if str_value(&import_decl.src) == module_name =>
        {
          if import_decl.specifiers.is_empty() {
            sites.has_side_effect_import = true;
          }
          collect_import_decl(import_decl, &mut info);
          sites.declarations.push(file.byte_range(import_decl));
        }
        ModuleDecl::TsImportEquals(import_equals)
          if is_legacy_import_equals(import_equals, module_name) =>
        {
          info.whole_module_imports.push(WholeModuleImport::new(
            import_equals.id.sym.to_string(),
            WholeModuleImportStyle::RequireEquals,
          ));
          sites.declarations.push(file.byte_range(import_equals));
        }
        _ => {}
      }
    }
  } else if let ProgramRef::Script(script) = program {
    sites.first_item_start =
      script.body.first().map(|stmt| file.byte_range(stmt).start);
  }

  let mut walker = CallWalker::new(
    file,
    OpaqueSiteCollector {
      file,
      module_name,
      sites: Vec::new(),
    },
  );
  visit_program(program, &mut walker);
  sites.opaque = walker.handler.sites;

  let mut scanner = AliasUsageScanner {
    alias: default_alias,
    usage: DefaultAliasUsage::default(),
  };
  visit_program(program, &mut scanner);
  sites.default_alias = scanner.usage;

  ResolvedImports { info, sites }
}

fn is_legacy_import_equals(
  import_equals: &TsImportEqualsDecl,
  module_name: &str,
) -> bool {
  if import_equals.is_export {
    return false;
  }
  match &import_equals.module_ref {
    TsModuleRef::TsExternalModuleRef(module_ref) => {
      str_value(&module_ref.expr) == module_name
    }
    TsModuleRef::TsEntityName(_) => false,
  }
}

fn collect_import_decl(import_decl: &ImportDecl, info: &mut ImportInfo) {
  for specifier in &import_decl.specifiers {
    match specifier {
      ImportSpecifier::Named(named) => {
        let local = named.local.sym.to_string();
        let source = match &named.imported {
          Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
          Some(ModuleExportName::Str(lit)) => str_value(lit).to_string(),
          None => local.clone(),
        };
        let alias = if local != source { Some(local) } else { None };
        let mut import = SingleExportImport::new(source, alias);
        import.is_type_only = import_decl.type_only || named.is_type_only;
        info.single_export_imports.push(import);
      }
      ImportSpecifier::Default(default) => {
        info.whole_module_imports.push(WholeModuleImport::new(
          default.local.sym.to_string(),
          WholeModuleImportStyle::Default,
        ));
      }
      ImportSpecifier::Namespace(namespace) => {
        info.whole_module_imports.push(WholeModuleImport::new(
          namespace.local.sym.to_string(),
          WholeModuleImportStyle::Namespace,
        ));
      }
    }
  }
}

struct OpaqueSiteCollector<'a> {
  file: &'a SourceFile<'a>,
  module_name: &'a str,
  sites: Vec<OpaqueSite>,
}

impl CallSiteHandler for OpaqueSiteCollector<'_> {
  fn handle_call(
    &mut self,
    site: CallSite<'_>,
    anchors: &AnchorStack,
  ) -> bool {
    let kind = match site.callee {
      CalleeRef::Expr(expr) => match expr.as_ident() {
        Some(ident) if &*ident.sym == "require" => OpaqueSiteKind::Require,
        _ => return false,
      },
      CalleeRef::DynamicImport => OpaqueSiteKind::DynamicImport,
      CalleeRef::Super => return false,
    };
    if first_arg_str(site.args) == Some(self.module_name) {
      log::debug!("Found {:?} of the legacy module", kind);
      self.sites.push(OpaqueSite {
        kind,
        comment_pos: anchors.insertion_point(site.start, self.file),
      });
    }
    false
  }
}

/// Finds out whether the conventional global alias is referenced as a free
/// identifier and whether the file declares something with that name.
struct AliasUsageScanner<'a> {
  alias: &'a str,
  usage: DefaultAliasUsage,
}

impl AliasUsageScanner<'_> {
  fn mark_declared(&mut self, ident: &Ident) {
    if &*ident.sym == self.alias {
      self.usage.declared = true;
    }
  }
}

impl Visit for AliasUsageScanner<'_> {
  fn visit_ident(&mut self, n: &Ident) {
    if &*n.sym == self.alias {
      self.usage.referenced = true;
    }
  }

  fn visit_binding_ident(&mut self, n: &BindingIdent) {
    self.mark_declared(&n.id);
    n.type_ann.visit_with(self);
  }

  fn visit_fn_decl(&mut self, n: &FnDecl) {
    self.mark_declared(&n.ident);
    n.function.visit_with(self);
  }

  fn visit_class_decl(&mut self, n: &ClassDecl) {
    self.mark_declared(&n.ident);
    n.class.visit_with(self);
  }

  fn visit_ts_enum_decl(&mut self, n: &TsEnumDecl) {
    self.mark_declared(&n.id);
    n.members.visit_with(self);
  }

  fn visit_import_decl(&mut self, n: &ImportDecl) {
    for specifier in &n.specifiers {
      let local = match specifier {
        ImportSpecifier::Named(named) => &named.local,
        ImportSpecifier::Default(default) => &default.local,
        ImportSpecifier::Namespace(namespace) => &namespace.local,
      };
      self.mark_declared(local);
    }
  }

  fn visit_ts_import_equals_decl(&mut self, n: &TsImportEqualsDecl) {
    self.mark_declared(&n.id);
  }
}
