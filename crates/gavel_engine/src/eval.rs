//! The proof search.
//!
//! `evaluate` walks a body's expressions left to right. The invariant at
//! each step: every expression before the current index is satisfied
//! under the context's bindings. When the index reaches the end and all
//! bindings are ground, the success continuation receives the context.
//!
//! The search is single-threaded cooperative recursion with
//! continuation passing; the continuation may cancel the whole query by
//! returning an error, which unwinds without further emission.

use gavel_foundation::{Body, Error, Expr, ExprTerms, Result, Value};

use crate::context::Ctx;
use crate::plug::plug_expr;
use crate::terms::eval_terms;
use crate::trace::TraceOp;

/// Runs the proof search, calling `iter` for each context whose bindings
/// satisfy every expression of the body.
///
/// # Errors
/// Propagates storage errors, safety violations, and any error returned
/// by `iter`.
pub fn evaluate<'s>(
    ctx: &Ctx<'s>,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    ctx.trace(TraceOp::Enter, None);
    eval_context(ctx, iter)
}

pub(crate) fn eval_context<'s>(
    ctx: &Ctx<'s>,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    if ctx.index >= ctx.query.len() {
        // A proof with non-ground bindings is incomplete: some variable
        // was never solved (e.g. a trailing "x = y" with both free), so
        // nothing is emitted.
        if !ctx.bindings_ground() {
            return Ok(());
        }
        ctx.trace(TraceOp::Exit, None);
        return iter(ctx);
    }

    let expr = ctx.current();
    ctx.trace(TraceOp::Eval, Some(expr));

    if expr.negated {
        return eval_context_negated(ctx, iter);
    }

    let mut successes = 0usize;
    eval_terms(ctx, &mut |prepared| {
        eval_expr(prepared, &mut |satisfied| {
            if successes > 0 {
                satisfied.trace(TraceOp::Redo, Some(satisfied.current()));
            }
            successes += 1;
            eval_context(&satisfied.step(), iter)
        })
    })?;

    if successes == 0 {
        ctx.trace(TraceOp::Fail, Some(ctx.current()));
    }
    Ok(())
}

/// Negation as failure: the expression holds iff its complement has no
/// satisfying grounding under the current bindings.
fn eval_context_negated<'s>(
    ctx: &Ctx<'s>,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let complement = ctx.current().complement();
    let mut negation = ctx.clone();
    negation.query = std::sync::Arc::new(Body::new(vec![complement]));
    negation.index = 0;
    negation.previous = Some(std::rc::Rc::new(ctx.clone()));

    let mut defined = false;
    eval_context(&negation, &mut |_| {
        defined = true;
        Ok(())
    })?;

    if defined {
        ctx.trace(TraceOp::Fail, Some(ctx.current()));
        Ok(())
    } else {
        eval_context(&ctx.step(), iter)
    }
}

fn eval_expr<'s>(
    ctx: &Ctx<'s>,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let plugged = plug_expr(ctx.current(), &ctx.bindings);
    match &plugged.terms {
        ExprTerms::Call(_) => {
            let op = operator(&plugged);
            // Operator validity is a compile-time guarantee.
            let Some(builtin) = ctx.builtins.get(op) else {
                panic!("unknown built-in: {op}")
            };
            builtin(ctx, &plugged, iter)
        }
        ExprTerms::Single(term) => match &term.value {
            Value::Bool(true) => iter(ctx),
            Value::Bool(false) => Ok(()),
            // A reference here already resolved during term
            // preparation, so the expression is satisfied.
            Value::Ref(_) => iter(ctx),
            other => Err(Error::implicit_cast(other.to_string())),
        },
    }
}

fn operator(expr: &Expr) -> &str {
    let ExprTerms::Call(ts) = &expr.terms else {
        unreachable!("operator of a non-call expression")
    };
    match &ts[0].value {
        Value::Var(v) => v.name(),
        other => panic!("illegal operator term: {other}"),
    }
}
