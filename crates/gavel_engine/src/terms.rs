//! Term preparation for expression evaluation.
//!
//! Before an expression is evaluated, every reference inside its terms
//! is resolved: base-document references by enumerating storage, virtual
//! references by dereferencing rules. Each combination of candidate
//! bindings reaches the expression evaluator once.
//!
//! Equality expressions with a non-ground reference into a base document
//! take a fast path: an index over the reference is built on first use
//! and probed with the other side's value.

use gavel_foundation::{value_from_json, Error, ExprTerms, Ref, Result, Term, Value};
use gavel_storage::{terms_to_path, Document};

use crate::builtins::EQUALITY;
use crate::context::Ctx;
use crate::convert::value_to_json;
use crate::plug::plug_term;
use crate::refs::eval_ref;

/// Resolves the references of the current expression's terms, calling
/// `iter` once per candidate context.
///
/// # Errors
/// Propagates storage and rule-dereference errors; index build failures
/// are wrapped with the offending reference.
pub fn eval_terms<'s>(
    ctx: &Ctx<'s>,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let expr = ctx.current();

    if ctx.indexing {
        if let Some((indexed, non_indexed)) = index_candidate(ctx, &expr.terms)? {
            return eval_terms_indexed(ctx, &indexed, &non_indexed, iter);
        }
    }

    let terms: &[Term] = match &expr.terms {
        ExprTerms::Call(ts) => ts,
        ExprTerms::Single(t) => std::slice::from_ref(t),
    };
    eval_terms_rec(ctx, terms, iter)
}

/// Decides whether the indexed fast path applies to this expression.
///
/// Indexing is used on equality expressions where one side is a
/// non-ground reference into a base document and the other side is
/// ground or also such a reference.
fn index_candidate<'s>(
    ctx: &Ctx<'s>,
    terms: &ExprTerms,
) -> Result<Option<(Ref, Term)>> {
    let ExprTerms::Call(ts) = terms else {
        return Ok(None);
    };
    if ts.len() != 3 {
        return Ok(None);
    }
    match &ts[0].value {
        Value::Var(op) if op.name() == EQUALITY => {}
        _ => return Ok(None),
    }

    let a = plug_term(&ts[1], &ctx.bindings);
    let b = plug_term(&ts[2], &ctx.bindings);

    if let Value::Ref(r) = &a.value {
        if !r.is_ground()
            && (b.is_ground() || matches!(b.value, Value::Ref(_)))
            && index_build_lazy(ctx, r)?
        {
            return Ok(Some((r.clone(), ts[2].clone())));
        }
    }
    if let Value::Ref(r) = &b.value {
        if !r.is_ground()
            && (a.is_ground() || matches!(a.value, Value::Ref(_)))
            && index_build_lazy(ctx, r)?
        {
            return Ok(Some((r.clone(), ts[1].clone())));
        }
    }
    Ok(None)
}

/// Returns true if an index exists (or was just built) for `reference`.
///
/// References that are ground, rooted at a bound variable, reach into a
/// virtual subtree, use composite selectors, or start at a missing path
/// are not indexable; those cases fall back to plain enumeration.
fn index_build_lazy(ctx: &Ctx<'_>, reference: &Ref) -> Result<bool> {
    if reference.is_ground() {
        return Ok(false);
    }
    if ctx.store.index(reference).is_some() {
        return Ok(true);
    }
    if ctx.bindings.get(&reference.head().value).is_some() {
        return Ok(false);
    }

    let mut prefix = vec![reference.head().clone()];
    for term in &reference.terms()[1..] {
        let Ok(segs) = terms_to_path(&prefix) else {
            return Ok(false);
        };
        match ctx.store.get(&segs) {
            Ok(Document::Rules(_)) => return Ok(false),
            Ok(Document::Data(_)) => {}
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        }
        if !term.is_ground() {
            break;
        }
        match &term.value {
            Value::String(_) | Value::Int(_) | Value::Float(_) => {}
            _ => return Ok(false),
        }
        prefix.push(term.clone());
    }

    ctx.store
        .build_index(reference)
        .map_err(|e| e.with_frame(format!("index build failed on {reference}")))?;
    Ok(true)
}

/// Probes the index on `indexed` with each resolution of `non_indexed`.
fn eval_terms_indexed<'s>(
    ctx: &Ctx<'s>,
    indexed: &Ref,
    non_indexed: &Term,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    eval_terms_rec(ctx, std::slice::from_ref(non_indexed), &mut |resolved| {
        let plugged = plug_term(non_indexed, &resolved.bindings);
        let probe_json = value_to_json(&plugged.value, resolved.store)?;
        let probe = value_from_json(&probe_json);

        let index = resolved
            .store
            .index(indexed)
            .ok_or_else(|| Error::internal(format!("missing index: {indexed}")))?;

        index.iter(&probe, &mut |delta| {
            let merged = resolved.with_bindings(resolved.bindings.update(delta));
            iter(&merged)
        })
    })
}

/// Resolves references inside `terms` left to right, pre-order.
fn eval_terms_rec<'s>(
    ctx: &Ctx<'s>,
    terms: &[Term],
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let Some((head, tail)) = terms.split_first() else {
        return iter(ctx);
    };
    resolve_value(ctx, &head.value, &mut |resolved| {
        eval_terms_rec(resolved, tail, iter)
    })
}

fn resolve_value<'s>(
    ctx: &Ctx<'s>,
    value: &Value,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    match value {
        Value::Ref(r) => eval_ref(ctx, r, iter),
        Value::Array(elems) => eval_terms_rec(ctx, elems, iter),
        Value::Object(pairs) => resolve_pairs(ctx, pairs, iter),
        _ => iter(ctx),
    }
}

fn resolve_pairs<'s>(
    ctx: &Ctx<'s>,
    pairs: &[(Term, Term)],
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let Some(((key, value), rest)) = pairs.split_first() else {
        return iter(ctx);
    };
    resolve_value(ctx, &key.value, &mut |with_key| {
        resolve_value(with_key, &value.value, &mut |with_value| {
            resolve_pairs(with_value, rest, iter)
        })
    })
}
