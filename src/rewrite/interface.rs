// Copyright 2018-2024 the Deno authors. MIT license.

use deno_ast::swc::ast::TsExprWithTypeArgs;
use deno_ast::swc::ast::TsTypeRef;
use deno_ast::swc::ecma_visit::Visit;
use deno_ast::swc::ecma_visit::VisitWith;
use deno_ast::ProgramRef;

use super::RewriteContext;
use crate::mappings::ReplacementRule;
use crate::replacement::ReplacementLookups;
use crate::swc_helpers::entity_name_chain;
use crate::swc_helpers::expr_chain;
use crate::swc_helpers::visit_program;
use crate::swc_helpers::Chain;

/// Rewrites type references and `extends`/`implements` clauses naming a
/// legacy interface.
pub fn rewrite_type_references(
  program: ProgramRef<'_>,
  ctx: &mut RewriteContext<'_>,
  rules: &[ReplacementRule],
) {
  if ctx.info.is_empty() {
    return;
  }
  let lookups = ReplacementLookups::build(&ctx.info, rules);
  let mut rewriter = TypeReferenceRewriter {
    ctx,
    lookups: &lookups,
  };
  visit_program(program, &mut rewriter);
}

struct TypeReferenceRewriter<'c, 'a, 'r> {
  ctx: &'c mut RewriteContext<'a>,
  lookups: &'c ReplacementLookups<'r>,
}

impl TypeReferenceRewriter<'_, '_, '_> {
  fn rewrite(&mut self, chain: &Chain) -> bool {
    let Some(replacement) = self.lookups.find(&chain.names()) else {
      return false;
    };
    if !replacement.is_noop() {
      let new_text = replacement.target_tokens.join(".");
      if !self.ctx.changes.replace(chain.range.clone(), new_text) {
        return false;
      }
      self.ctx.report.rewritten_types += 1;
    }
    self
      .ctx
      .info
      .record_match(replacement.origin, &replacement.target_tokens);
    true
  }
}

impl Visit for TypeReferenceRewriter<'_, '_, '_> {
  fn visit_ts_type_ref(&mut self, n: &TsTypeRef) {
    let chain = entity_name_chain(&n.type_name, self.ctx.file);
    if !self.rewrite(&chain) {
      n.type_name.visit_with(self);
    }
    n.type_params.visit_with(self);
  }

  fn visit_ts_expr_with_type_args(&mut self, n: &TsExprWithTypeArgs) {
    let rewritten = match expr_chain(&n.expr, self.ctx.file) {
      Some(chain) => self.rewrite(&chain),
      None => false,
    };
    if !rewritten {
      n.expr.visit_with(self);
    }
    n.type_args.visit_with(self);
  }
}
