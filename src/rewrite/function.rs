// Copyright 2018-2024 the Deno authors. MIT license.

use deno_ast::ProgramRef;

use super::RewriteContext;
use crate::advisory;
use crate::mappings::ReplacementRule;
use crate::replacement::ReplacementLookups;
use crate::swc_helpers::expr_chain;
use crate::swc_helpers::visit_program;
use crate::swc_helpers::AnchorStack;
use crate::swc_helpers::CallSite;
use crate::swc_helpers::CallSiteHandler;
use crate::swc_helpers::CallWalker;
use crate::swc_helpers::CalleeRef;

/// Rewrites the callee of every call that goes through a legacy binding and
/// flags calls still passing a callback to an API that now returns a
/// promise.
pub fn rewrite_function_calls(
  program: ProgramRef<'_>,
  ctx: &mut RewriteContext<'_>,
  rules: &[ReplacementRule],
) {
  if ctx.info.is_empty() {
    return;
  }
  let lookups = ReplacementLookups::build(&ctx.info, rules);
  let file = ctx.file;
  let mut walker = CallWalker::new(
    file,
    FunctionCallRewriter {
      ctx,
      lookups: &lookups,
    },
  );
  visit_program(program, &mut walker);
}

struct FunctionCallRewriter<'c, 'a, 'r> {
  ctx: &'c mut RewriteContext<'a>,
  lookups: &'c ReplacementLookups<'r>,
}

impl CallSiteHandler for FunctionCallRewriter<'_, '_, '_> {
  fn handle_call(
    &mut self,
    site: CallSite<'_>,
    anchors: &AnchorStack,
  ) -> bool {
    let CalleeRef::Expr(callee) = site.callee else {
      return false;
    };
    let Some(chain) = expr_chain(callee, self.ctx.file) else {
      return false;
    };
    let names = chain.names();
    let Some(replacement) = self.lookups.find(&names) else {
      if self.ctx.info.is_tracked_name(chain.root()) {
        log::debug!("No function rule for {}", names.join("."));
        self.ctx.report.unmatched_references += 1;
      }
      return false;
    };

    if let Some(callback) = replacement.rule.callback {
      if site.args.len() > callback.position {
        let mut comments = vec![advisory::CALLBACK_TO_PROMISE];
        let is_get_context = replacement
          .rule
          .source_tokens
          .last()
          .is_some_and(|name| name == advisory::CONTEXT_FUNCTION_NAME);
        if is_get_context {
          comments.push(advisory::CONTEXT_SCHEMA_CHANGED);
        }
        let pos = anchors.insertion_point(site.start, self.ctx.file);
        if advisory::insert_comment_lines(
          &mut self.ctx.changes,
          self.ctx.file,
          pos,
          &comments,
        ) {
          self.ctx.report.flagged_calls += 1;
        }
      }
    }

    if replacement.is_noop() {
      self
        .ctx
        .info
        .record_match(replacement.origin, &replacement.target_tokens);
      return true;
    }
    let new_text = chain.render(&replacement.target_tokens);
    if self.ctx.changes.replace(chain.range.clone(), new_text) {
      self.ctx.report.rewritten_calls += 1;
      self
        .ctx
        .info
        .record_match(replacement.origin, &replacement.target_tokens);
    }
    true
  }
}
