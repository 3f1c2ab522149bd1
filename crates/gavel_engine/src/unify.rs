//! Two-sided unification.
//!
//! Equality expressions bottom out here. Variables unify with anything
//! (subject to the occurs check); composites unify position-wise,
//! threading the evolving context; references unify against composites
//! by descending through child references; everything else compares as
//! ground values.

use std::cmp::Ordering;

use gavel_foundation::{Error, Expr, ExprTerms, Ref, Result, Term, Value, Var};
use gavel_storage::{ref_to_path, Document};

use crate::context::Ctx;
use crate::convert::{compare, value_to_json};
use crate::plug::plug_value;

/// The equality built-in: unifies the two operands.
///
/// # Errors
/// Propagates unification errors; a failed unification is silent.
pub fn eval_eq<'s>(
    ctx: &Ctx<'s>,
    expr: &Expr,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let ExprTerms::Call(ts) = &expr.terms else {
        return Err(Error::internal("equality requires operands"));
    };
    unify(ctx, &ts[1].value, &ts[2].value, iter)
}

/// Unifies two values under the context's bindings, calling `iter` with
/// the extended context on success.
///
/// Both sides are plugged first; unification recurses through composites
/// and may be called with bindings made by an enclosing step.
///
/// # Errors
/// Object unification with a non-ground key and storage failures
/// propagate; shape mismatches fail silently.
pub fn unify<'s>(
    ctx: &Ctx<'s>,
    a: &Value,
    b: &Value,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let a = plug_value(a, &ctx.bindings);
    let b = plug_value(b, &ctx.bindings);

    match &a {
        Value::Var(v) => unify_var(ctx, v, &b, iter),
        Value::Object(_) => unify_object(ctx, &a, &b, iter),
        Value::Array(_) => unify_array(ctx, &a, &b, iter),
        _ => match &b {
            Value::Var(v) => unify_var(ctx, v, &a, iter),
            Value::Array(_) => unify_array(ctx, &b, &a, iter),
            Value::Object(_) => unify_object(ctx, &b, &a, iter),
            _ => unify_ground(ctx, &a, &b, iter),
        },
    }
}

fn unify_var<'s>(
    ctx: &Ctx<'s>,
    var: &Var,
    value: &Value,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    match ctx.bind_var(var, value) {
        Some(bound) => iter(&bound),
        None => Ok(()),
    }
}

fn unify_array<'s>(
    ctx: &Ctx<'s>,
    array: &Value,
    other: &Value,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let Value::Array(elems) = array else {
        return Err(Error::internal("unify_array requires an array"));
    };
    match other {
        Value::Var(v) => unify_var(ctx, v, array, iter),
        Value::Ref(r) => unify_array_ref(ctx, elems, r, iter),
        Value::Array(others) => unify_arrays(ctx, elems, others, iter),
        _ => Ok(()),
    }
}

fn unify_array_ref<'s>(
    ctx: &Ctx<'s>,
    elems: &[Term],
    r: &Ref,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let Document::Data(json) = ctx.store.get(&ref_to_path(r)?)? else {
        return Ok(());
    };
    let serde_json::Value::Array(slice) = json else {
        return Ok(());
    };
    if slice.len() != elems.len() {
        return Ok(());
    }

    let mut current = ctx.clone();
    for (i, elem) in elems.iter().enumerate() {
        #[allow(clippy::cast_possible_wrap)]
        let child = Value::Ref(r.child(Term::int(i as i64)));
        let mut next: Option<Ctx<'s>> = None;
        unify(&current, &elem.value, &child, &mut |c| {
            next = Some(c.clone());
            Ok(())
        })?;
        match next {
            Some(c) => current = c,
            None => return Ok(()),
        }
    }
    iter(&current)
}

fn unify_arrays<'s>(
    ctx: &Ctx<'s>,
    a: &[Term],
    b: &[Term],
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    if a.len() != b.len() {
        return Ok(());
    }
    let mut current = ctx.clone();
    for (ae, be) in a.iter().zip(b.iter()) {
        let mut next: Option<Ctx<'s>> = None;
        unify(&current, &ae.value, &be.value, &mut |c| {
            next = Some(c.clone());
            Ok(())
        })?;
        match next {
            Some(c) => current = c,
            None => return Ok(()),
        }
    }
    iter(&current)
}

// Unification of object keys (or unordered sets in general) is not
// supported; keys must be ground on both sides.
fn unify_object<'s>(
    ctx: &Ctx<'s>,
    object: &Value,
    other: &Value,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let Value::Object(pairs) = object else {
        return Err(Error::internal("unify_object requires an object"));
    };
    match other {
        Value::Var(v) => unify_var(ctx, v, object, iter),
        Value::Ref(r) => unify_object_ref(ctx, pairs, r, iter),
        Value::Object(others) => unify_objects(ctx, pairs, others, iter),
        _ => Ok(()),
    }
}

fn require_ground_keys(pairs: &[(Term, Term)]) -> Result<()> {
    for (k, _) in pairs {
        if !k.is_ground() {
            return Err(Error::variable_key(k.to_string()));
        }
    }
    Ok(())
}

fn unify_object_ref<'s>(
    ctx: &Ctx<'s>,
    pairs: &[(Term, Term)],
    r: &Ref,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    require_ground_keys(pairs)?;

    let Document::Data(json) = ctx.store.get(&ref_to_path(r)?)? else {
        return Ok(());
    };
    let serde_json::Value::Object(map) = json else {
        return Ok(());
    };
    if map.len() != pairs.len() {
        return Ok(());
    }

    let mut current = ctx.clone();
    for (k, v) in pairs {
        let Value::String(key) = &k.value else {
            return Err(Error::non_string_key(k.to_string()));
        };
        if !map.contains_key(key.as_ref()) {
            return Ok(());
        }
        let child = Value::Ref(r.child(k.clone()));
        let mut next: Option<Ctx<'s>> = None;
        unify(&current, &v.value, &child, &mut |c| {
            next = Some(c.clone());
            Ok(())
        })?;
        match next {
            Some(c) => current = c,
            None => return Ok(()),
        }
    }
    iter(&current)
}

fn unify_objects<'s>(
    ctx: &Ctx<'s>,
    a: &[(Term, Term)],
    b: &[(Term, Term)],
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    if a.len() != b.len() {
        return Ok(());
    }
    require_ground_keys(a)?;
    require_ground_keys(b)?;

    let mut current = ctx.clone();
    for (ak, av) in a {
        let Some((_, bv)) = b.iter().find(|(bk, _)| bk.value == ak.value) else {
            return Ok(());
        };
        let mut next: Option<Ctx<'s>> = None;
        unify(&current, &av.value, &bv.value, &mut |c| {
            next = Some(c.clone());
            Ok(())
        })?;
        match next {
            Some(c) => current = c,
            None => return Ok(()),
        }
    }
    iter(&current)
}

fn unify_ground<'s>(
    ctx: &Ctx<'s>,
    a: &Value,
    b: &Value,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let av = value_to_json(a, ctx.store)?;
    let bv = value_to_json(b, ctx.store)?;
    if compare(&av, &bv) == Ordering::Equal {
        iter(ctx)
    } else {
        Ok(())
    }
}
