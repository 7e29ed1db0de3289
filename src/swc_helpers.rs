// Copyright 2018-2024 the Deno authors. MIT license.

use std::ops::Range;

use deno_ast::swc::ast::BindingIdent;
use deno_ast::swc::ast::CallExpr;
use deno_ast::swc::ast::Callee;
use deno_ast::swc::ast::ClassMember;
use deno_ast::swc::ast::Expr;
use deno_ast::swc::ast::ExprOrSpread;
use deno_ast::swc::ast::Ident;
use deno_ast::swc::ast::ImportDecl;
use deno_ast::swc::ast::Lit;
use deno_ast::swc::ast::MemberExpr;
use deno_ast::swc::ast::MemberProp;
use deno_ast::swc::ast::ModuleItem;
use deno_ast::swc::ast::OptCall;
use deno_ast::swc::ast::OptChainBase;
use deno_ast::swc::ast::PropOrSpread;
use deno_ast::swc::ast::Stmt;
use deno_ast::swc::ast::Str;
use deno_ast::swc::ast::TsEntityName;
use deno_ast::swc::ast::TsImportEqualsDecl;
use deno_ast::swc::ast::VarDeclarator;
use deno_ast::swc::common::Spanned;
use deno_ast::swc::ecma_visit::Visit;
use deno_ast::swc::ecma_visit::VisitWith;
use deno_ast::ParsedSource;
use deno_ast::ProgramRef;
use deno_ast::SourceRangedForSpanned;
use deno_ast::SourceTextInfo;
use deno_ast::StartSourcePos;

/// Byte offsets and line lookups for the text of a parsed source.
pub struct SourceFile<'a> {
  text_info: &'a SourceTextInfo,
  start: StartSourcePos,
}

impl<'a> SourceFile<'a> {
  pub fn new(parsed_source: &'a ParsedSource) -> Self {
    let text_info = parsed_source.text_info_lazy();
    Self {
      text_info,
      start: text_info.range().start,
    }
  }

  pub fn text(&self) -> &'a str {
    self.text_info.text_str()
  }

  pub fn byte_range<T: Spanned>(&self, node: &T) -> Range<usize> {
    node.range().as_byte_range(self.start)
  }

  pub fn line_index(&self, byte_index: usize) -> usize {
    self.text_info.line_index(self.start + byte_index)
  }

  pub fn line_start(&self, byte_index: usize) -> usize {
    self
      .text_info
      .line_start(self.line_index(byte_index))
      .as_byte_index(self.start)
  }

  /// Start of the line after the one containing `byte_index`.
  pub fn next_line_start(&self, byte_index: usize) -> Option<usize> {
    let next_line = self.line_index(byte_index) + 1;
    if next_line < self.text_info.lines_count() {
      Some(
        self
          .text_info
          .line_start(next_line)
          .as_byte_index(self.start),
      )
    } else {
      None
    }
  }

  /// Leading whitespace of the line containing `byte_index`.
  pub fn line_indent(&self, byte_index: usize) -> &'a str {
    let line = self.text_info.line_text(self.line_index(byte_index));
    &line[..line.len() - line.trim_start().len()]
  }
}

pub fn visit_program<V: Visit>(program: ProgramRef<'_>, visitor: &mut V) {
  match program {
    ProgramRef::Module(module) => module.visit_with(visitor),
    ProgramRef::Script(script) => script.visit_with(visitor),
  }
}

pub fn str_value(lit: &Str) -> &str {
  lit.value.as_str()
}

/// Gets the value of a call's first argument when it's a string literal.
pub fn first_arg_str(args: &[ExprOrSpread]) -> Option<&str> {
  let arg = args.first()?;
  if arg.spread.is_some() {
    return None;
  }
  match &*arg.expr {
    Expr::Lit(Lit::Str(lit)) => Some(str_value(lit)),
    _ => None,
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSegment {
  pub name: String,
  pub range: Range<usize>,
  /// Whether this segment is reached through an optional hop (`?.name`).
  pub optional: bool,
}

/// A dotted reference such as `a`, `a.b.c` or `a?.b` made only of
/// identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
  pub segments: Vec<ChainSegment>,
  pub range: Range<usize>,
}

impl Chain {
  pub fn names(&self) -> Vec<&str> {
    self.segments.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn root(&self) -> &str {
    &self.segments[0].name
  }

  /// Renders replacement tokens for the whole chain.
  ///
  /// An optional hop stays where it was while the object it guards and
  /// everything before it are unchanged. Any other optional hop moves to the
  /// last hop of the replacement, so the final access stays guarded.
  pub fn render(&self, tokens: &[String]) -> String {
    let kept_prefix = self
      .segments
      .iter()
      .zip(tokens)
      .take_while(|(segment, token)| segment.name == **token)
      .count();
    let mut optional_hops = vec![false; tokens.len()];
    for (index, segment) in self.segments.iter().enumerate() {
      if !segment.optional {
        continue;
      }
      if index <= kept_prefix && index < tokens.len() {
        optional_hops[index] = true;
      } else if tokens.len() > 1 {
        optional_hops[tokens.len() - 1] = true;
      }
    }
    let mut text = String::new();
    for (index, token) in tokens.iter().enumerate() {
      if index > 0 {
        text.push_str(if optional_hops[index] { "?." } else { "." });
      }
      text.push_str(token);
    }
    text
  }
}

pub fn expr_chain(expr: &Expr, file: &SourceFile) -> Option<Chain> {
  let mut segments = Vec::new();
  fill_expr_segments(expr, file, &mut segments)?;
  Some(Chain {
    segments,
    range: file.byte_range(expr),
  })
}

/// Flattens a member expression, including its final property.
pub fn member_expr_chain(
  member: &MemberExpr,
  file: &SourceFile,
) -> Option<Chain> {
  let mut segments = Vec::new();
  fill_member_segments(member, file, &mut segments, false)?;
  Some(Chain {
    segments,
    range: file.byte_range(member),
  })
}

fn fill_expr_segments(
  expr: &Expr,
  file: &SourceFile,
  segments: &mut Vec<ChainSegment>,
) -> Option<()> {
  match expr {
    Expr::Ident(ident) => {
      segments.push(ChainSegment {
        name: ident.sym.to_string(),
        range: file.byte_range(ident),
        optional: false,
      });
      Some(())
    }
    Expr::Member(member) => {
      fill_member_segments(member, file, segments, false)
    }
    Expr::OptChain(opt_chain) => match &*opt_chain.base {
      OptChainBase::Member(member) => {
        fill_member_segments(member, file, segments, opt_chain.optional)
      }
      OptChainBase::Call(_) => None,
    },
    _ => None,
  }
}

fn fill_member_segments(
  member: &MemberExpr,
  file: &SourceFile,
  segments: &mut Vec<ChainSegment>,
  optional: bool,
) -> Option<()> {
  fill_expr_segments(&member.obj, file, segments)?;
  match &member.prop {
    MemberProp::Ident(ident) => {
      segments.push(ChainSegment {
        name: ident.sym.to_string(),
        range: file.byte_range(ident),
        optional,
      });
      Some(())
    }
    MemberProp::PrivateName(_) | MemberProp::Computed(_) => None,
  }
}

pub fn entity_name_chain(
  entity_name: &TsEntityName,
  file: &SourceFile,
) -> Chain {
  let range = file.byte_range(entity_name);
  let mut segments = Vec::new();
  let mut current = entity_name;
  loop {
    match current {
      TsEntityName::TsQualifiedName(qualified_name) => {
        segments.push(ChainSegment {
          name: qualified_name.right.sym.to_string(),
          range: file.byte_range(&qualified_name.right),
          optional: false,
        });
        current = &qualified_name.left;
      }
      TsEntityName::Ident(ident) => {
        segments.push(ChainSegment {
          name: ident.sym.to_string(),
          range: file.byte_range(ident),
          optional: false,
        });
        break;
      }
    }
  }
  segments.reverse();
  Chain { segments, range }
}

/// Starts of the nodes enclosing the node currently being visited.
#[derive(Debug, Default)]
pub struct AnchorStack {
  starts: Vec<usize>,
}

impl AnchorStack {
  /// Where a comment line for the node starting at `node_start` goes: the
  /// start of the outermost enclosing node that begins on the same line.
  pub fn insertion_point(
    &self,
    node_start: usize,
    file: &SourceFile,
  ) -> usize {
    let line = file.line_index(node_start);
    let mut pos = node_start;
    for start in self.starts.iter().rev() {
      if file.line_index(*start) != line {
        break;
      }
      pos = pos.min(*start);
    }
    pos
  }
}

#[derive(Debug, Clone, Copy)]
pub enum CalleeRef<'a> {
  Expr(&'a Expr),
  DynamicImport,
  Super,
}

#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
  pub callee: CalleeRef<'a>,
  pub args: &'a [ExprOrSpread],
  pub start: usize,
}

pub trait CallSiteHandler {
  /// Returns `true` when the callee was consumed and shouldn't be visited.
  fn handle_call(&mut self, site: CallSite<'_>, anchors: &AnchorStack)
    -> bool;

  /// Called for every identifier in a reference position.
  fn handle_ident(&mut self, _ident: &Ident, _anchors: &AnchorStack) {}
}

/// Visits every call expression and referenced identifier while tracking the
/// enclosing nodes, so handlers can place comments before the statement
/// holding them. Import declarations and declared bindings are skipped.
pub struct CallWalker<'a, H: CallSiteHandler> {
  file: &'a SourceFile<'a>,
  anchors: AnchorStack,
  pub handler: H,
}

impl<'a, H: CallSiteHandler> CallWalker<'a, H> {
  pub fn new(file: &'a SourceFile<'a>, handler: H) -> Self {
    Self {
      file,
      anchors: Default::default(),
      handler,
    }
  }

  fn anchored<T: Spanned>(
    &mut self,
    node: &T,
    visit: impl FnOnce(&mut Self),
  ) {
    let start = self.file.byte_range(node).start;
    self.anchors.starts.push(start);
    visit(self);
    self.anchors.starts.pop();
  }
}

impl<H: CallSiteHandler> Visit for CallWalker<'_, H> {
  fn visit_module_item(&mut self, n: &ModuleItem) {
    self.anchored(n, |v| n.visit_children_with(v));
  }

  fn visit_stmt(&mut self, n: &Stmt) {
    self.anchored(n, |v| n.visit_children_with(v));
  }

  fn visit_expr(&mut self, n: &Expr) {
    self.anchored(n, |v| n.visit_children_with(v));
  }

  fn visit_var_declarator(&mut self, n: &VarDeclarator) {
    self.anchored(n, |v| n.visit_children_with(v));
  }

  fn visit_class_member(&mut self, n: &ClassMember) {
    self.anchored(n, |v| n.visit_children_with(v));
  }

  fn visit_prop_or_spread(&mut self, n: &PropOrSpread) {
    self.anchored(n, |v| n.visit_children_with(v));
  }

  fn visit_call_expr(&mut self, n: &CallExpr) {
    let callee = match &n.callee {
      Callee::Expr(expr) => CalleeRef::Expr(expr),
      Callee::Import(_) => CalleeRef::DynamicImport,
      Callee::Super(_) => CalleeRef::Super,
    };
    let site = CallSite {
      callee,
      args: &n.args,
      start: self.file.byte_range(n).start,
    };
    if !self.handler.handle_call(site, &self.anchors) {
      n.callee.visit_with(self);
    }
    n.args.visit_with(self);
    n.type_args.visit_with(self);
  }

  fn visit_import_decl(&mut self, _n: &ImportDecl) {}

  fn visit_ts_import_equals_decl(&mut self, _n: &TsImportEqualsDecl) {}

  fn visit_binding_ident(&mut self, n: &BindingIdent) {
    n.type_ann.visit_with(self);
  }

  fn visit_ident(&mut self, n: &Ident) {
    self.handler.handle_ident(n, &self.anchors);
  }

  fn visit_opt_call(&mut self, n: &OptCall) {
    let site = CallSite {
      callee: CalleeRef::Expr(&n.callee),
      args: &n.args,
      start: self.file.byte_range(n).start,
    };
    if !self.handler.handle_call(site, &self.anchors) {
      n.callee.visit_with(self);
    }
    n.args.visit_with(self);
    n.type_args.visit_with(self);
  }
}
