//! Reference resolution and rule dereference.
//!
//! `eval_ref` walks a reference prefix through storage, enumerating
//! collections to bind iteration variables. When the walk reaches a rule
//! set, the rules are evaluated in child contexts and the remaining
//! suffix is projected through their results.

use gavel_foundation::{Bindings, Error, Ref, Result, Rule, RuleHead, Term, Value};
use gavel_storage::{format_path, terms_to_path, Document};

use crate::context::Ctx;
use crate::eval::evaluate;
use crate::plug::{plug_term, plug_value};

/// Resolves a reference, calling `iter` once per candidate context.
///
/// Each candidate binds the reference's iteration variables (and, for
/// virtual documents, the reference itself) so a later `plug` yields the
/// resolved value.
///
/// # Errors
/// Storage failures other than not-found propagate, as do safety
/// violations inside rule dereference; missing documents yield no
/// candidates.
pub fn eval_ref<'s>(
    ctx: &Ctx<'s>,
    reference: &Ref,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    eval_ref_rec(ctx, reference, Vec::new(), iter)
}

/// Walks `full`, with `path` holding the already-resolved prefix (bound
/// variables replaced by their values). `path.len()` is the number of
/// reference terms consumed.
fn eval_ref_rec<'s>(
    ctx: &Ctx<'s>,
    full: &Ref,
    path: Vec<Term>,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let pos = path.len();

    if pos == full.len() {
        // Prefix fully resolved: the expression is satisfied iff the
        // path names a document.
        let segs = terms_to_path(&path)?;
        return match ctx.store.get(&segs) {
            Ok(_) => iter(ctx),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        };
    }

    let head = &full[pos];
    let Value::Var(head_var) = &head.value else {
        // Constant selector.
        let mut next = path;
        next.push(head.clone());
        return eval_ref_rec(ctx, full, next, iter);
    };

    if pos == 0 {
        // A bound head is not a document root: project the remaining
        // suffix through the bound value. E.g. x = [1,2,3], x[i] = 1.
        if let Some(binding) = ctx.bindings.get(&head.value) {
            let binding = binding.clone();
            return eval_ref_rule_result(ctx, full, &full.terms()[1..], binding, iter);
        }

        let root = vec![head.clone()];
        let segs = terms_to_path(&root)?;
        return match ctx.store.get(&segs) {
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
            Ok(Document::Rules(rules)) => {
                for rule in rules {
                    eval_ref_rule(ctx, full, 1, rule, iter)?;
                }
                Ok(())
            }
            Ok(Document::Data(_)) => eval_ref_rec(ctx, full, root, iter),
        };
    }

    // A binding exists for the variable: treat it as a constant.
    if let Some(binding) = ctx.bindings.get(&head.value) {
        let mut next = path;
        next.push(Term::new(binding.clone()));
        return eval_ref_rec(ctx, full, next, iter);
    }

    // Unbound variable: enumerate the collection at the current path.
    let segs = terms_to_path(&path)?;
    let node = match ctx.store.get(&segs) {
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e),
        Ok(Document::Rules(_)) => {
            return Err(Error::non_composite(full.to_string(), format_path(&segs)))
        }
        Ok(Document::Data(json)) => json.clone(),
    };

    match node {
        serde_json::Value::Object(map) => {
            for key in map.keys() {
                let key_value = Value::String(key.as_str().into());
                let Some(bound) = ctx.bind_var(head_var, &key_value) else {
                    continue;
                };
                let mut next = path.clone();
                next.push(Term::new(key_value));
                eval_ref_rec(&bound, full, next, iter)?;
            }
            Ok(())
        }
        serde_json::Value::Array(elems) => {
            for i in 0..elems.len() {
                #[allow(clippy::cast_possible_wrap)]
                let key_value = Value::Int(i as i64);
                let Some(bound) = ctx.bind_var(head_var, &key_value) else {
                    continue;
                };
                let mut next = path.clone();
                next.push(Term::new(key_value));
                eval_ref_rec(&bound, full, next, iter)?;
            }
            Ok(())
        }
        _ => Err(Error::non_composite(full.to_string(), format_path(&segs))),
    }
}

/// Dereferences one rule of the set found at `full[..path_len]`.
fn eval_ref_rule<'s>(
    ctx: &Ctx<'s>,
    full: &Ref,
    path_len: usize,
    rule: &Rule,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    match rule.head() {
        RuleHead::Complete { value } => eval_rule_complete(ctx, full, path_len, rule, value, iter),
        RuleHead::PartialObject { key, value } => {
            eval_rule_partial_object(ctx, full, path_len, rule, key, value, iter)
        }
        RuleHead::PartialSet { key } => {
            eval_rule_partial_set(ctx, full, path_len, rule, key, iter)
        }
    }
}

fn eval_rule_complete<'s>(
    ctx: &Ctx<'s>,
    full: &Ref,
    path_len: usize,
    rule: &Rule,
    value_term: &Term,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let suffix = &full.terms()[path_len..];
    let child = ctx.child(rule, Bindings::new());

    if suffix.is_empty() {
        // The reference names the whole document: bind it to the rule's
        // value so the enclosing expression sees it.
        return evaluate(&child, &mut |satisfied| {
            let result = plug_value(&value_term.value, &satisfied.bindings);
            let next = ctx.bind_ref(full, result);
            iter(&next)
        });
    }

    evaluate(&child, &mut |satisfied| {
        let result = plug_value(&value_term.value, &satisfied.bindings);
        match result {
            Value::Object(_) | Value::Array(_) | Value::Ref(_) => {
                eval_ref_rule_result(ctx, full, suffix, result, iter)
            }
            other => Err(Error::bad_dereference(format!(
                "{} value of rule {}",
                other.type_name(),
                rule.name()
            ))),
        }
    })
}

/// Extracts a ground value for a rule head term under the child context.
fn ground_head_term(term: &Term, child: &Ctx<'_>) -> Result<Value> {
    let value = plug_value(&term.value, &child.bindings);
    if value.is_ground() {
        Ok(value)
    } else {
        Err(Error::unbound_variable(term.to_string()))
    }
}

/// Builds the child bindings for a ground lookup key, or reports that
/// the rule cannot match it.
fn bind_rule_key(key_term: &Term, lookup_key: &Value) -> Result<Option<Bindings>> {
    match &key_term.value {
        Value::Var(kv) => Ok(Some(
            Bindings::new().put(Value::Var(kv.clone()), lookup_key.clone()),
        )),
        ground if ground.is_ground() => {
            if ground == lookup_key {
                Ok(Some(Bindings::new()))
            } else {
                Ok(None)
            }
        }
        other => Err(Error::internal(format!(
            "rule key must be a variable or ground: {other}"
        ))),
    }
}

fn eval_rule_partial_object<'s>(
    ctx: &Ctx<'s>,
    full: &Ref,
    path_len: usize,
    rule: &Rule,
    key_term: &Term,
    value_term: &Term,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let suffix = &full.terms()[path_len..];
    if suffix.is_empty() {
        return Err(Error::bad_dereference(format!(
            "partial document {} needs a key here",
            rule.name()
        )));
    }
    let rest = &full.terms()[path_len + 1..];

    let lookup_key = plug_value(&suffix[0].value, &ctx.bindings);

    if !lookup_key.is_ground() {
        // The key selects nothing yet: evaluate the rule and copy the
        // child's key into the caller.
        let Value::Var(query_var) = &lookup_key else {
            return Err(Error::internal(format!(
                "non-ground key selector: {lookup_key}"
            )));
        };
        let child = ctx.child(rule, Bindings::new());
        return evaluate(&child, &mut |satisfied| {
            let key = ground_head_term(key_term, satisfied)?;
            let value = ground_head_term(value_term, satisfied)?;
            let Some(caller) = ctx.bind_var(query_var, &key) else {
                return Ok(());
            };
            eval_ref_rule_result(&caller, full, rest, value, iter)
        });
    }

    let Some(bindings) = bind_rule_key(key_term, &lookup_key)? else {
        return Ok(());
    };
    let child = ctx.child(rule, bindings);
    evaluate(&child, &mut |satisfied| {
        let value = ground_head_term(value_term, satisfied)?;
        eval_ref_rule_result(ctx, full, rest, value, iter)
    })
}

fn eval_rule_partial_set<'s>(
    ctx: &Ctx<'s>,
    full: &Ref,
    path_len: usize,
    rule: &Rule,
    key_term: &Term,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    let suffix = &full.terms()[path_len..];
    if suffix.is_empty() {
        return Err(Error::bad_dereference(format!(
            "partial document {} needs a key here",
            rule.name()
        )));
    }
    if suffix.len() > 1 {
        // Dereferencing through a set element is undefined; the
        // compiler is expected to catch this statically.
        return Ok(());
    }

    // The element's presence is the result: the reference prefix itself
    // is bound to true so the expression becomes defined.
    let prefix = full.prefix(path_len + 1);
    let lookup_key = plug_value(&suffix[0].value, &ctx.bindings);

    if !lookup_key.is_ground() {
        let Value::Var(query_var) = &lookup_key else {
            return Err(Error::internal(format!(
                "non-ground key selector: {lookup_key}"
            )));
        };
        let child = ctx.child(rule, Bindings::new());
        return evaluate(&child, &mut |satisfied| {
            let element = ground_head_term(key_term, satisfied)?;
            let Some(caller) = ctx.bind_var(query_var, &element) else {
                return Ok(());
            };
            let caller = caller.bind_ref(&prefix, Value::Bool(true));
            iter(&caller)
        });
    }

    let Some(bindings) = bind_rule_key(key_term, &lookup_key)? else {
        return Ok(());
    };
    let child = ctx.child(rule, bindings);
    evaluate(&child, &mut |_| {
        let caller = ctx.bind_ref(&prefix, Value::Bool(true));
        iter(&caller)
    })
}

/// Projects a remaining suffix through a rule result, binding the
/// original reference to the value found.
fn eval_ref_rule_result<'s>(
    ctx: &Ctx<'s>,
    full: &Ref,
    suffix: &[Term],
    result: Value,
    iter: &mut dyn FnMut(&Ctx<'s>) -> Result<()>,
) -> Result<()> {
    match result {
        Value::Ref(resolved) => {
            // The rule produced another reference: concatenate it with
            // the remaining suffix and keep walking from there. E.g.
            // q[k] = v :- a[k] = v, then q.foo[0] continues as
            // a.foo[0].
            let concatenated = resolved.concat(suffix);
            eval_ref_rec(
                ctx,
                &concatenated,
                resolved.terms().to_vec(),
                &mut |walked| {
                    let bound =
                        plug_value(&Value::Ref(concatenated.clone()), &walked.bindings);
                    let next = walked.bind_ref(full, bound);
                    iter(&next)
                },
            )
        }
        Value::Array(_) | Value::Object(_) => {
            if suffix.is_empty() {
                let next = ctx.bind_ref(full, result);
                return iter(&next);
            }
            let plugged: Vec<Term> = suffix
                .iter()
                .map(|t| plug_term(t, &ctx.bindings))
                .collect();
            result.query(&plugged, &mut |extra, value| {
                let mut next = ctx.bind_ref(full, value.clone());
                for (var, chosen) in extra {
                    match next.bind_var(var, chosen) {
                        Some(c) => next = c,
                        None => return Ok(()),
                    }
                }
                iter(&next)
            })
        }
        scalar => {
            if !suffix.is_empty() {
                // Dereferencing a scalar is undefined.
                return Ok(());
            }
            let next = ctx.bind_ref(full, scalar);
            iter(&next)
        }
    }
}
