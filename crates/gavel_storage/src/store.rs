//! The data store: one JSON base document plus named rule mounts.
//!
//! The store is read-mostly during evaluation. Writes go through
//! [`DataStore::insert`], which invalidates any cached index whose
//! reference overlaps the written path (contract with the evaluator).

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as Json;

use gavel_foundation::{Error, Ref, Result, Rule, Term, Value};

use crate::index::{build, Index, Indices};

/// A segment of a storage path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSeg {
    /// An object field.
    Field(Arc<str>),
    /// An array index.
    Item(usize),
}

impl fmt::Display for PathSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(s) => write!(f, "{s}"),
            Self::Item(i) => write!(f, "{i}"),
        }
    }
}

/// Renders a path for error messages, e.g. `data.a[0].b`.
#[must_use]
pub fn format_path(path: &[PathSeg]) -> String {
    let mut out = String::new();
    for (i, seg) in path.iter().enumerate() {
        match seg {
            PathSeg::Field(s) => {
                if i > 0 {
                    out.push('.');
                }
                out.push_str(s);
            }
            PathSeg::Item(n) => {
                out.push('[');
                out.push_str(&n.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Converts a sequence of ground path terms into storage path segments.
///
/// The first term may be a variable (the document root name); every other
/// term must be a string or a non-negative number.
///
/// # Errors
/// Returns a type mismatch error for variables past the head, negative or
/// fractional numbers, and composite selectors.
pub fn terms_to_path(terms: &[Term]) -> Result<Vec<PathSeg>> {
    let mut path = Vec::with_capacity(terms.len());
    for (i, t) in terms.iter().enumerate() {
        let seg = match &t.value {
            Value::Var(v) if i == 0 => PathSeg::Field(v.name().into()),
            Value::String(s) => PathSeg::Field(s.clone()),
            #[allow(clippy::cast_sign_loss)]
            Value::Int(n) if *n >= 0 => PathSeg::Item(*n as usize),
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Value::Float(n) if *n >= 0.0 && n.fract() == 0.0 => PathSeg::Item(*n as usize),
            other => {
                return Err(Error::type_mismatch(
                    "string or number selector",
                    other.type_name(),
                ))
            }
        };
        path.push(seg);
    }
    Ok(path)
}

/// Converts a ground reference into its underlying storage path.
///
/// # Errors
/// See [`terms_to_path`].
pub fn ref_to_path(r: &Ref) -> Result<Vec<PathSeg>> {
    terms_to_path(r.terms())
}

/// Rules collocated at a path, sharing a name and a document kind.
pub type RuleSet = Vec<Arc<Rule>>;

/// The result of a storage lookup.
#[derive(Debug)]
pub enum Document<'a> {
    /// A JSON-shaped base node.
    Data(&'a Json),
    /// A virtual node defined by rules.
    Rules(&'a [Arc<Rule>]),
}

/// In-memory store holding the base document and named virtual documents.
///
/// The base document is a JSON object addressed by path. Virtual documents
/// are rule sets mounted at top-level names (rule dispatch happens at the
/// head of a reference); a mount shadows a base key of the same name.
pub struct DataStore {
    base: Json,
    mounts: HashMap<String, RuleSet>,
    indices: RefCell<Indices>,
}

impl DataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Json::Object(serde_json::Map::new()),
            mounts: HashMap::new(),
            indices: RefCell::new(Indices::new()),
        }
    }

    /// Writes `value` into the base document at `path`, creating
    /// intermediate objects as needed.
    ///
    /// Any cached index whose reference overlaps the written path is
    /// discarded.
    ///
    /// # Errors
    /// Returns a storage error if the path is empty or traverses an
    /// existing non-object node.
    pub fn insert(&mut self, path: &[&str], value: Json) -> Result<()> {
        let Some((last, prefix)) = path.split_last() else {
            return Err(Error::storage("cannot insert at the document root"));
        };
        let mut node = &mut self.base;
        for seg in prefix {
            let Json::Object(map) = node else {
                return Err(Error::storage(format!(
                    "cannot write through non-object at {seg}"
                )));
            };
            node = map
                .entry((*seg).to_string())
                .or_insert_with(|| Json::Object(serde_json::Map::new()));
        }
        let Json::Object(map) = node else {
            return Err(Error::storage(format!(
                "cannot write through non-object at {last}"
            )));
        };
        map.insert((*last).to_string(), value);

        self.indices.borrow_mut().invalidate_overlapping(path);
        Ok(())
    }

    /// Mounts rules as the virtual document named `name`.
    ///
    /// Rules already mounted under the same name are kept; the new rules
    /// are appended in order. All rules at one name must share a document
    /// kind (a compile-time guarantee the store does not re-check).
    pub fn install_rules(&mut self, name: &str, rules: Vec<Rule>) {
        self.mounts
            .entry(name.to_string())
            .or_default()
            .extend(rules.into_iter().map(Arc::new));
        self.indices.borrow_mut().invalidate_overlapping(&[name]);
    }

    /// Looks up the document at `path`.
    ///
    /// # Errors
    /// Returns a not-found error when the path does not name a node:
    /// missing keys, out-of-range indices, traversal of scalars, and
    /// paths descending through a rule mount all report not-found.
    pub fn get(&self, path: &[PathSeg]) -> Result<Document<'_>> {
        if let Some(PathSeg::Field(head)) = path.first() {
            if let Some(rules) = self.mounts.get(head.as_ref()) {
                if path.len() == 1 {
                    return Ok(Document::Rules(rules));
                }
                // Virtual subtrees have no addressable children in
                // storage; the evaluator dereferences them itself.
                return Err(Error::not_found(format_path(path)));
            }
        }

        let mut node = &self.base;
        for seg in path {
            node = match (node, seg) {
                (Json::Object(map), PathSeg::Field(f)) => map.get(f.as_ref()),
                (Json::Array(elems), PathSeg::Item(i)) => elems.get(*i),
                _ => None,
            }
            .ok_or_else(|| Error::not_found(format_path(path)))?;
        }
        Ok(Document::Data(node))
    }

    /// Returns the cached index for `reference`, if one has been built.
    #[must_use]
    pub fn index(&self, reference: &Ref) -> Option<Index> {
        self.indices.borrow().get(reference)
    }

    /// Builds and caches an index for `reference` if none exists yet.
    ///
    /// # Errors
    /// Propagates storage errors encountered while walking the base
    /// document (missing paths contribute no entries and are not errors).
    pub fn build_index(&self, reference: &Ref) -> Result<()> {
        if self.indices.borrow().get(reference).is_some() {
            return Ok(());
        }
        let index = build(self, reference)?;
        self.indices.borrow_mut().put(reference.clone(), index);
        Ok(())
    }

    /// Returns the number of cached indices.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.borrow().len()
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
