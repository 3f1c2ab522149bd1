//! The policy value model.
//!
//! Values are immutable and cheaply cloneable for the scalar variants.
//! Composite values own their sub-terms; the evaluator never mutates a
//! value after compilation.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;
use std::sync::Arc;

use crate::term::Term;
use crate::Result;

/// A variable identifier.
///
/// Variables name query unknowns and document roots (the head of every
/// reference is a variable naming the root it starts from).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Var(Arc<str>);

impl Var {
    /// Creates a variable with the given name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the variable's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Var({})", self.0)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Var {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A reference: a non-empty path expression rooted at a document.
///
/// The head term is always a [`Var`] naming a document root; the remaining
/// terms are selectors (strings, numbers, variables, or nested references).
#[derive(Clone)]
pub struct Ref(Vec<Term>);

impl Ref {
    /// Creates a reference from its terms.
    ///
    /// # Panics
    /// Panics if `terms` is empty; references are non-empty by construction.
    #[must_use]
    pub fn new(terms: Vec<Term>) -> Self {
        assert!(!terms.is_empty(), "references are non-empty");
        Self(terms)
    }

    /// Returns the terms of this reference.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.0
    }

    /// Returns the number of terms (head plus selectors).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with other sequences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the head term (the root variable).
    #[must_use]
    pub fn head(&self) -> &Term {
        &self.0[0]
    }

    /// Returns a new reference with `term` appended as a selector.
    #[must_use]
    pub fn child(&self, term: Term) -> Self {
        let mut terms = self.0.clone();
        terms.push(term);
        Self(terms)
    }

    /// Returns the reference consisting of the first `n` terms.
    ///
    /// # Panics
    /// Panics if `n` is zero or greater than the reference length.
    #[must_use]
    pub fn prefix(&self, n: usize) -> Self {
        Self::new(self.0[..n].to_vec())
    }

    /// Returns a new reference with every term of `suffix` appended.
    #[must_use]
    pub fn concat(&self, suffix: &[Term]) -> Self {
        let mut terms = self.0.clone();
        terms.extend(suffix.iter().cloned());
        Self(terms)
    }

    /// Returns true if every selector is ground.
    ///
    /// The head variable does not count: it names a document root, not an
    /// unknown, so a reference with a ground tail is itself ground.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        self.0[1..].iter().all(Term::is_ground)
    }

    /// Returns an iterator over the terms.
    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.0.iter()
    }
}

impl Index<usize> for Ref {
    type Output = Term;

    fn index(&self, index: usize) -> &Term {
        &self.0[index]
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Ref {}

impl Hash for Ref {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for t in &self.0 {
            t.value.hash(state);
        }
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0[0].value)?;
        for t in &self.0[1..] {
            match &t.value {
                Value::String(s) if is_identifier(s) => write!(f, ".{s}")?,
                Value::String(s) => write!(f, "[{s:?}]")?,
                other => write!(f, "[{other}]")?,
            }
        }
        Ok(())
    }
}

/// The policy value model.
///
/// A tagged sum covering JSON scalars and composites plus the three
/// evaluation-time variants: variables, references, and composites whose
/// elements are [`Term`]s (and so may themselves contain variables).
#[derive(Clone)]
pub enum Value {
    /// The null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(Arc<str>),
    /// A variable.
    Var(Var),
    /// Ordered sequence of terms.
    Array(Vec<Term>),
    /// Ordered sequence of key/value term pairs.
    ///
    /// Keys may be non-ground inside rule bodies but must be ground when
    /// used for storage lookup or unification.
    Object(Vec<(Term, Term)>),
    /// A reference into a document.
    Ref(Ref),
}

impl Value {
    /// Returns a short name for the value's type, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Var(_) => "variable",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Ref(_) => "reference",
        }
    }

    /// Returns true if the value contains no variables.
    ///
    /// A reference is ground if all of its selectors are ground; the head
    /// variable names a document root and does not count.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        match self {
            Self::Var(_) => false,
            Self::Array(elems) => elems.iter().all(Term::is_ground),
            Self::Object(pairs) => pairs.iter().all(|(k, v)| k.is_ground() && v.is_ground()),
            Self::Ref(r) => r.is_ground(),
            _ => true,
        }
    }

    /// Visits this value and every nested value in pre-order.
    ///
    /// The visitor returns true to stop the walk; `walk` returns whether
    /// the walk was stopped.
    pub fn walk(&self, visit: &mut dyn FnMut(&Value) -> bool) -> bool {
        if visit(self) {
            return true;
        }
        match self {
            Self::Array(elems) => elems.iter().any(|t| t.value.walk(visit)),
            Self::Object(pairs) => pairs
                .iter()
                .any(|(k, v)| k.value.walk(visit) || v.value.walk(visit)),
            Self::Ref(r) => r.iter().any(|t| t.value.walk(visit)),
            _ => false,
        }
    }

    /// Returns true if `var` occurs anywhere inside this value.
    #[must_use]
    pub fn contains_var(&self, var: &Var) -> bool {
        self.walk(&mut |v| matches!(v, Value::Var(other) if other == var))
    }

    /// Returns a stable structural hash of this value.
    ///
    /// Stable across runs: the hasher is seeded deterministically.
    #[must_use]
    pub fn hash_code(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Enumerates the positions of this composite matching a reference
    /// suffix.
    ///
    /// The suffix's terms may be ground selectors or variables; a variable
    /// selector enumerates every index (arrays) or ground key (objects).
    /// For each position satisfying the whole suffix, `emit` receives the
    /// selector bindings chosen along the way plus the value found there.
    /// Positions that do not exist yield nothing. Errors returned by
    /// `emit` propagate.
    ///
    /// # Errors
    /// Returns the first error produced by `emit`.
    pub fn query(
        &self,
        suffix: &[Term],
        emit: &mut dyn FnMut(&[(Var, Value)], &Value) -> Result<()>,
    ) -> Result<()> {
        let mut chosen = Vec::new();
        self.query_rec(suffix, &mut chosen, emit)
    }

    fn query_rec(
        &self,
        suffix: &[Term],
        chosen: &mut Vec<(Var, Value)>,
        emit: &mut dyn FnMut(&[(Var, Value)], &Value) -> Result<()>,
    ) -> Result<()> {
        let Some(head) = suffix.first() else {
            return emit(chosen, self);
        };
        let tail = &suffix[1..];
        match self {
            Self::Array(elems) => match &head.value {
                Value::Var(v) => {
                    for (i, elem) in elems.iter().enumerate() {
                        #[allow(clippy::cast_possible_wrap)]
                        chosen.push((v.clone(), Value::Int(i as i64)));
                        elem.value.query_rec(tail, chosen, emit)?;
                        chosen.pop();
                    }
                    Ok(())
                }
                Value::Int(i) => match usize::try_from(*i).ok().and_then(|i| elems.get(i)) {
                    Some(elem) => elem.value.query_rec(tail, chosen, emit),
                    None => Ok(()),
                },
                _ => Ok(()),
            },
            Self::Object(pairs) => match &head.value {
                Value::Var(v) => {
                    for (k, val) in pairs {
                        if !k.is_ground() {
                            continue;
                        }
                        chosen.push((v.clone(), k.value.clone()));
                        val.value.query_rec(tail, chosen, emit)?;
                        chosen.pop();
                    }
                    Ok(())
                }
                key if key.is_ground() => {
                    for (k, val) in pairs {
                        if k.value == *key {
                            return val.value.query_rec(tail, chosen, emit);
                        }
                    }
                    Ok(())
                }
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a variable.
    #[must_use]
    pub const fn as_var(&self) -> Option<&Var> {
        match self {
            Self::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Attempts to extract a reference.
    #[must_use]
    pub const fn as_ref_value(&self) -> Option<&Ref> {
        match self {
            Self::Ref(r) => Some(r),
            _ => None,
        }
    }
}

// Implement PartialEq manually: floats compare by bits (so Eq is lawful)
// and object pair order is irrelevant.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Var(a), Self::Var(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(ak, av)| {
                        b.iter()
                            .any(|(bk, bv)| ak.value == bk.value && av.value == bv.value)
                    })
            }
            (Self::Ref(a), Self::Ref(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Float(n) => n.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::Var(v) => v.hash(state),
            Self::Array(elems) => {
                for t in elems {
                    t.value.hash(state);
                }
            }
            Self::Object(pairs) => {
                // Pair order is irrelevant for equality, so accumulate
                // pair hashes commutatively.
                let mut acc: u64 = 0;
                for (k, v) in pairs {
                    let mut h = DefaultHasher::new();
                    k.value.hash(&mut h);
                    v.value.hash(&mut h);
                    acc = acc.wrapping_add(h.finish());
                }
                acc.hash(state);
            }
            Self::Ref(r) => r.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Var(v) => write!(f, "{v}"),
            Self::Array(elems) => {
                write!(f, "[")?;
                for (i, t) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t.value)?;
                }
                write!(f, "]")
            }
            Self::Object(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k.value, v.value)?;
                }
                write!(f, "}}")
            }
            Self::Ref(r) => write!(f, "{r}"),
        }
    }
}

// Convenience From implementations

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<Var> for Value {
    fn from(v: Var) -> Self {
        Self::Var(v)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Self::Ref(r)
    }
}
