//! Lazily built inverted maps over non-ground references.
//!
//! For a reference like `data.a[i].b.c[j]`, the index maps every concrete
//! value the base document produces at that reference to the variable
//! bindings (`i`, `j`) that reach it. Equality expressions probe the index
//! with the other side's value instead of enumerating the document.
//!
//! Entries are bindings-only; the caller probes by value. Only references
//! into base documents are indexed, and the store discards an index when
//! a write touches its reference's prefix.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::sync::Arc;

use gavel_foundation::{value_from_json, Bindings, Error, Ref, Result, Term, Value};

use crate::store::{terms_to_path, DataStore, Document, PathSeg};

type Entries = HashMap<Value, Vec<Bindings>, BuildHasherDefault<DefaultHasher>>;

/// An inverted map from concrete values to binding deltas.
///
/// Cloning is O(1); the entries are shared.
#[derive(Clone, Debug)]
pub struct Index {
    entries: Arc<Entries>,
}

impl Index {
    /// Yields each binding delta whose materialized value equals `value`.
    ///
    /// Number spellings are normalized before comparison, so a whole
    /// float probes the same bucket as the equivalent integer.
    ///
    /// # Errors
    /// Returns the first error produced by `emit`.
    pub fn iter(&self, value: &Value, emit: &mut dyn FnMut(&Bindings) -> Result<()>) -> Result<()> {
        let key = normalize(value.clone());
        if let Some(deltas) = self.entries.get(&key) {
            for delta in deltas {
                emit(delta)?;
            }
        }
        Ok(())
    }

    /// Returns the number of distinct values in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collapses the two spellings of a whole number into one key.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn normalize(value: Value) -> Value {
    match value {
        Value::Float(f)
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 =>
        {
            Value::Int(f as i64)
        }
        Value::Array(elems) => Value::Array(
            elems
                .into_iter()
                .map(|t| Term::new(normalize(t.value)))
                .collect(),
        ),
        Value::Object(pairs) => Value::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (Term::new(normalize(k.value)), Term::new(normalize(v.value))))
                .collect(),
        ),
        other => other,
    }
}

/// Materializes the index for `reference` against the store's base
/// document.
///
/// Walks the reference's ground prefix, then enumerates the composite
/// depth-first, collecting an assignment for every variable. Paths the
/// document does not define contribute no entries.
pub(crate) fn build(store: &DataStore, reference: &Ref) -> Result<Index> {
    let mut entries = Entries::default();
    let head = match &reference.head().value {
        Value::Var(v) => PathSeg::Field(v.name().into()),
        other => {
            return Err(Error::internal(format!(
                "reference head must be a variable, got {other}"
            )))
        }
    };
    let mut path = vec![head];
    walk(
        store,
        reference,
        1,
        &mut path,
        &Bindings::new(),
        &mut entries,
    )?;
    Ok(Index {
        entries: Arc::new(entries),
    })
}

fn walk(
    store: &DataStore,
    reference: &Ref,
    pos: usize,
    path: &mut Vec<PathSeg>,
    binds: &Bindings,
    entries: &mut Entries,
) -> Result<()> {
    if pos == reference.len() {
        return match store.get(path) {
            Ok(Document::Data(json)) => {
                let key = normalize(value_from_json(json));
                entries.entry(key).or_default().push(binds.clone());
                Ok(())
            }
            Ok(Document::Rules(_)) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        };
    }

    let term = &reference[pos];
    match &term.value {
        Value::Var(v) => {
            let node = match store.get(path) {
                Ok(Document::Data(json)) => json.clone(),
                Ok(Document::Rules(_)) => return Ok(()),
                Err(e) if e.is_not_found() => return Ok(()),
                Err(e) => return Err(e),
            };
            match node {
                serde_json::Value::Object(map) => {
                    for key in map.keys() {
                        let next = binds.put(
                            Value::Var(v.clone()),
                            Value::String(key.as_str().into()),
                        );
                        path.push(PathSeg::Field(key.as_str().into()));
                        walk(store, reference, pos + 1, path, &next, entries)?;
                        path.pop();
                    }
                    Ok(())
                }
                serde_json::Value::Array(elems) => {
                    for i in 0..elems.len() {
                        #[allow(clippy::cast_possible_wrap)]
                        let next = binds.put(Value::Var(v.clone()), Value::Int(i as i64));
                        path.push(PathSeg::Item(i));
                        walk(store, reference, pos + 1, path, &next, entries)?;
                        path.pop();
                    }
                    Ok(())
                }
                // Scalars have no children; the branch is simply empty.
                _ => Ok(()),
            }
        }
        _ => {
            let seg = terms_to_path(std::slice::from_ref(term))?
                .pop()
                .expect("single term yields a single segment");
            path.push(seg);
            let result = walk(store, reference, pos + 1, path, binds, entries);
            path.pop();
            result
        }
    }
}

/// The store's collection of cached indices, keyed by reference.
#[derive(Default)]
pub(crate) struct Indices {
    map: HashMap<Value, Index, BuildHasherDefault<DefaultHasher>>,
}

impl Indices {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, reference: &Ref) -> Option<Index> {
        self.map.get(&Value::Ref(reference.clone())).cloned()
    }

    pub(crate) fn put(&mut self, reference: Ref, index: Index) {
        self.map.insert(Value::Ref(reference), index);
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    /// Discards every index whose reference overlaps the written path.
    ///
    /// A reference overlaps when each of its leading terms matches the
    /// corresponding written segment (variables match anything), up to
    /// the length of the shorter side.
    pub(crate) fn invalidate_overlapping(&mut self, written: &[&str]) {
        self.map.retain(|key, _| {
            let Value::Ref(r) = key else { return true };
            !overlaps(r, written)
        });
    }
}

fn overlaps(reference: &Ref, written: &[&str]) -> bool {
    let n = reference.len().min(written.len());
    for i in 0..n {
        let matches = match &reference[i].value {
            Value::Var(v) if i == 0 => v.name() == written[i],
            Value::Var(_) => true,
            Value::String(s) => s.as_ref() == written[i],
            // Written paths address object fields; a numeric selector
            // cannot collide with one.
            _ => false,
        };
        if !matches {
            return false;
        }
    }
    true
}
