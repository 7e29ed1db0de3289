// Copyright 2018-2024 the Deno authors. MIT license.

use deno_ast::swc::ast::MemberExpr;
use deno_ast::swc::ast::MemberProp;
use deno_ast::swc::ast::TsQualifiedName;
use deno_ast::swc::ast::TsTypeRef;
use deno_ast::swc::ecma_visit::Visit;
use deno_ast::swc::ecma_visit::VisitWith;
use deno_ast::ProgramRef;

use super::RewriteContext;
use crate::imports::ImportOrigin;
use crate::mappings::ReplacementRule;
use crate::replacement::ReplacementLookups;
use crate::swc_helpers::entity_name_chain;
use crate::swc_helpers::expr_chain;
use crate::swc_helpers::member_expr_chain;
use crate::swc_helpers::visit_program;
use crate::swc_helpers::Chain;

/// Rewrites references to legacy enums, whether used directly, through one
/// of their members or as a type.
pub fn rewrite_enum_references(
  program: ProgramRef<'_>,
  ctx: &mut RewriteContext<'_>,
  rules: &[ReplacementRule],
) {
  if ctx.info.is_empty() {
    return;
  }
  let lookups = ReplacementLookups::build(&ctx.info, rules);
  let mut rewriter = EnumRewriter {
    ctx,
    lookups: &lookups,
    rules,
  };
  visit_program(program, &mut rewriter);
}

struct EnumRewriter<'c, 'a, 'r> {
  ctx: &'c mut RewriteContext<'a>,
  lookups: &'c ReplacementLookups<'r>,
  rules: &'r [ReplacementRule],
}

impl EnumRewriter<'_, '_, '_> {
  /// Rewrites `chain` when it's exactly the legacy path of an enum.
  fn rewrite_exact(&mut self, chain: &Chain) -> bool {
    if !self.ctx.info.is_tracked_name(chain.root()) {
      return false;
    }
    let Some(replacement) = self.lookups.find(&chain.names()) else {
      return false;
    };
    if replacement.is_noop() {
      return true;
    }
    let origin = replacement.origin;
    let target_tokens = replacement.target_tokens.clone();
    self.apply(chain, 0, &target_tokens, origin)
  }

  /// Rewrites the enum part of `chain`: the object of a member access, the
  /// left side of a qualified name or a whole type name.
  fn rewrite_enum_object(&mut self, chain: &Chain) -> bool {
    let root = chain.root();
    if !self.ctx.info.is_tracked_name(root) {
      return false;
    }
    if self.rewrite_exact(chain) {
      return true;
    }
    let names = chain.names();
    let last = names[names.len() - 1];

    if let Some(index) = self.ctx.info.whole_module_index(root) {
      if names.len() < 2 {
        return false;
      }
      let Some(rule) = rule_ending_with(self.rules, last) else {
        return false;
      };
      if names[1..].ends_with(&as_strs(&rule.target_tokens)) {
        return false;
      }
      let start = names
        .len()
        .saturating_sub(rule.source_tokens.len())
        .max(1);
      return self.apply(
        chain,
        start,
        &rule.target_tokens,
        ImportOrigin::WholeModule(index),
      );
    }

    if names.len() != 1 {
      return false;
    }
    let Some((index, import)) = self.ctx.info.single_export_by_local(root)
    else {
      return false;
    };
    let source = import.source.clone();
    let Some(rule) = rule_ending_with(self.rules, &source)
      .filter(|rule| rule.source_tokens.len() > 1)
    else {
      return false;
    };
    self.apply(
      chain,
      0,
      &rule.target_tokens,
      ImportOrigin::SingleExport(index),
    )
  }

  /// Replaces the segments of `chain` from `start_segment` on with
  /// `target_tokens`.
  fn apply(
    &mut self,
    chain: &Chain,
    start_segment: usize,
    target_tokens: &[String],
    origin: ImportOrigin,
  ) -> bool {
    let range = if start_segment == 0 {
      chain.range.clone()
    } else {
      chain.segments[start_segment].range.start..chain.range.end
    };
    let new_text = if start_segment == 0 {
      chain.render(target_tokens)
    } else {
      target_tokens.join(".")
    };
    if self.ctx.source_text(range.clone()) == new_text {
      return true;
    }
    if !self.ctx.changes.replace(range, new_text) {
      return false;
    }
    self.ctx.report.rewritten_enums += 1;
    self.ctx.info.record_match(origin, target_tokens);
    true
  }
}

fn rule_ending_with<'r>(
  rules: &'r [ReplacementRule],
  name: &str,
) -> Option<&'r ReplacementRule> {
  rules
    .iter()
    .find(|rule| rule.source_tokens.last().is_some_and(|n| n == name))
}

fn as_strs(tokens: &[String]) -> Vec<&str> {
  tokens.iter().map(|t| t.as_str()).collect()
}

impl Visit for EnumRewriter<'_, '_, '_> {
  fn visit_member_expr(&mut self, n: &MemberExpr) {
    if let Some(chain) = member_expr_chain(n, self.ctx.file) {
      if self.rewrite_exact(&chain) {
        return;
      }
    }
    if let MemberProp::Ident(_) = &n.prop {
      if let Some(object) = expr_chain(&n.obj, self.ctx.file) {
        if self.rewrite_enum_object(&object) {
          return;
        }
      }
    }
    n.visit_children_with(self);
  }

  fn visit_ts_qualified_name(&mut self, n: &TsQualifiedName) {
    let left = entity_name_chain(&n.left, self.ctx.file);
    if self.rewrite_enum_object(&left) {
      return;
    }
    n.visit_children_with(self);
  }

  fn visit_ts_type_ref(&mut self, n: &TsTypeRef) {
    let chain = entity_name_chain(&n.type_name, self.ctx.file);
    if !self.rewrite_enum_object(&chain) {
      n.type_name.visit_with(self);
    }
    n.type_params.visit_with(self);
  }
}
