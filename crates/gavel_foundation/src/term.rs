//! Terms and the compiled policy AST.
//!
//! The evaluator consumes an already-compiled AST: bodies of expressions
//! over terms, grouped into rules. Compile-time safety checks (variable
//! safety, operator arities, recursion rejection) happen upstream.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::value::{Ref, Value, Var};

/// A source location attached to a term by the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Location {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub col: u32,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A term: a value plus an optional source location.
///
/// Equality and hashing ignore the location.
#[derive(Clone)]
pub struct Term {
    /// The term's value.
    pub value: Value,
    /// Where the term appeared in source, if known.
    pub location: Option<Location>,
}

impl Term {
    /// Creates a term with no location.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self {
            value,
            location: None,
        }
    }

    /// Attaches a source location.
    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Creates a null term.
    #[must_use]
    pub const fn null() -> Self {
        Self::new(Value::Null)
    }

    /// Creates a boolean term.
    #[must_use]
    pub const fn boolean(b: bool) -> Self {
        Self::new(Value::Bool(b))
    }

    /// Creates an integer term.
    #[must_use]
    pub const fn int(n: i64) -> Self {
        Self::new(Value::Int(n))
    }

    /// Creates a float term.
    #[must_use]
    pub const fn float(n: f64) -> Self {
        Self::new(Value::Float(n))
    }

    /// Creates a string term.
    #[must_use]
    pub fn string(s: impl Into<std::sync::Arc<str>>) -> Self {
        Self::new(Value::String(s.into()))
    }

    /// Creates a variable term.
    #[must_use]
    pub fn var(name: impl Into<std::sync::Arc<str>>) -> Self {
        Self::new(Value::Var(Var::new(name)))
    }

    /// Creates an array term.
    #[must_use]
    pub fn array(elems: Vec<Term>) -> Self {
        Self::new(Value::Array(elems))
    }

    /// Creates an object term.
    #[must_use]
    pub fn object(pairs: Vec<(Term, Term)>) -> Self {
        Self::new(Value::Object(pairs))
    }

    /// Creates a reference term.
    #[must_use]
    pub fn reference(r: Ref) -> Self {
        Self::new(Value::Ref(r))
    }

    /// Returns true if the term's value is ground.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        self.value.is_ground()
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// The terms of an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprTerms {
    /// A lone term; satisfied when its plugged value is `true` (a
    /// reference term is satisfied when the reference resolves).
    Single(Term),
    /// A built-in call: element 0 is a variable naming the operator, the
    /// rest are operands.
    Call(Vec<Term>),
}

/// An expression in a rule body or query.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    /// Whether the expression is negated (negation as failure).
    pub negated: bool,
    /// The expression's terms.
    pub terms: ExprTerms,
}

impl Expr {
    /// Creates a non-negated single-term expression.
    #[must_use]
    pub fn term(t: Term) -> Self {
        Self {
            negated: false,
            terms: ExprTerms::Single(t),
        }
    }

    /// Creates a non-negated built-in call expression.
    #[must_use]
    pub fn call(op: &str, operands: Vec<Term>) -> Self {
        let mut terms = Vec::with_capacity(operands.len() + 1);
        terms.push(Term::var(op));
        terms.extend(operands);
        Self {
            negated: false,
            terms: ExprTerms::Call(terms),
        }
    }

    /// Creates an equality expression `a = b`.
    #[must_use]
    pub fn equality(a: Term, b: Term) -> Self {
        Self::call("=", vec![a, b])
    }

    /// Returns this expression with negation flipped.
    #[must_use]
    pub fn complement(&self) -> Self {
        Self {
            negated: !self.negated,
            terms: self.terms.clone(),
        }
    }

    /// Returns a negated copy of this expression.
    #[must_use]
    pub fn negate(mut self) -> Self {
        self.negated = true;
        self
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "not ")?;
        }
        match &self.terms {
            ExprTerms::Single(t) => write!(f, "{t}"),
            ExprTerms::Call(ts) => match &ts[0].value {
                Value::Var(op) if op.name() == "=" && ts.len() == 3 => {
                    write!(f, "{} = {}", ts[1], ts[2])
                }
                op => {
                    write!(f, "{op}(")?;
                    for (i, t) in ts[1..].iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{t}")?;
                    }
                    write!(f, ")")
                }
            },
        }
    }
}

/// An ordered list of expressions, all of which must be satisfied.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Body(pub Vec<Expr>);

impl Body {
    /// Creates a body from its expressions.
    #[must_use]
    pub fn new(exprs: Vec<Expr>) -> Self {
        Self(exprs)
    }

    /// Returns the number of expressions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the body has no expressions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the expression at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Expr> {
        self.0.get(index)
    }

    /// Returns an iterator over the expressions.
    pub fn iter(&self) -> impl Iterator<Item = &Expr> {
        self.0.iter()
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

/// The document kind a rule defines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocKind {
    /// A complete document: the rule's value whenever the body holds.
    Complete,
    /// A partial object: each grounding contributes a key/value entry.
    PartialObject,
    /// A partial set: each grounding contributes an element.
    PartialSet,
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::PartialObject => write!(f, "partial object"),
            Self::PartialSet => write!(f, "partial set"),
        }
    }
}

/// The head of a rule, determining its document kind.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleHead {
    /// `name = value :- body`
    Complete {
        /// The rule's output value.
        value: Term,
    },
    /// `name[key] = value :- body`
    PartialObject {
        /// The entry key term.
        key: Term,
        /// The entry value term.
        value: Term,
    },
    /// `name[key] :- body`
    PartialSet {
        /// The element term.
        key: Term,
    },
}

/// A compiled rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    name: Var,
    head: RuleHead,
    body: Body,
}

impl Rule {
    /// Creates a complete-document rule.
    #[must_use]
    pub fn complete(name: impl Into<Var>, value: Term, body: Body) -> Self {
        Self {
            name: name.into(),
            head: RuleHead::Complete { value },
            body,
        }
    }

    /// Creates a partial-object rule.
    #[must_use]
    pub fn partial_object(name: impl Into<Var>, key: Term, value: Term, body: Body) -> Self {
        Self {
            name: name.into(),
            head: RuleHead::PartialObject { key, value },
            body,
        }
    }

    /// Creates a partial-set rule.
    #[must_use]
    pub fn partial_set(name: impl Into<Var>, key: Term, body: Body) -> Self {
        Self {
            name: name.into(),
            head: RuleHead::PartialSet { key },
            body,
        }
    }

    /// Returns the rule's name.
    #[must_use]
    pub fn name(&self) -> &Var {
        &self.name
    }

    /// Returns the rule's head.
    #[must_use]
    pub fn head(&self) -> &RuleHead {
        &self.head
    }

    /// Returns the rule's body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Returns the document kind this rule defines.
    #[must_use]
    pub fn doc_kind(&self) -> DocKind {
        match self.head {
            RuleHead::Complete { .. } => DocKind::Complete,
            RuleHead::PartialObject { .. } => DocKind::PartialObject,
            RuleHead::PartialSet { .. } => DocKind::PartialSet,
        }
    }
}
