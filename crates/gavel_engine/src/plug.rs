//! Substitution of bindings into values, terms, and expressions.
//!
//! `plug` replaces variables and bound references with their bindings,
//! recursively through composites. Because the environment is kept flat
//! (see `Ctx::bind_var`), plugging is idempotent.

use gavel_foundation::{Bindings, Expr, ExprTerms, Ref, Term, Value};

/// Substitutes bindings into a value.
#[must_use]
pub fn plug_value(value: &Value, bindings: &Bindings) -> Value {
    match value {
        Value::Var(_) => bindings.get(value).unwrap_or(value).clone(),
        Value::Ref(r) => {
            if let Some(bound) = bindings.get(value) {
                return bound.clone();
            }
            if r.is_ground() {
                return value.clone();
            }
            let mut terms = Vec::with_capacity(r.len());
            terms.push(r.head().clone());
            for t in &r.terms()[1..] {
                terms.push(plug_term(t, bindings));
            }
            Value::Ref(Ref::new(terms))
        }
        Value::Array(elems) => {
            Value::Array(elems.iter().map(|t| plug_term(t, bindings)).collect())
        }
        Value::Object(pairs) => Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (plug_term(k, bindings), plug_term(v, bindings)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

/// Substitutes bindings into a term, preserving its location.
#[must_use]
pub fn plug_term(term: &Term, bindings: &Bindings) -> Term {
    let mut plugged = term.clone();
    plugged.value = plug_value(&term.value, bindings);
    plugged
}

/// Substitutes bindings into an expression's operands.
///
/// The operator term of a call is never plugged.
#[must_use]
pub fn plug_expr(expr: &Expr, bindings: &Bindings) -> Expr {
    let terms = match &expr.terms {
        ExprTerms::Single(t) => ExprTerms::Single(plug_term(t, bindings)),
        ExprTerms::Call(ts) => {
            let mut buf = Vec::with_capacity(ts.len());
            buf.push(ts[0].clone());
            for t in &ts[1..] {
                buf.push(plug_term(t, bindings));
            }
            ExprTerms::Call(buf)
        }
    };
    Expr {
        negated: expr.negated,
        terms,
    }
}
