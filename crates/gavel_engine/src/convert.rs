//! Conversion of term values to JSON and the ground comparison order.
//!
//! Ground equality bottoms out here: both sides convert to the
//! language-neutral JSON representation (resolving references through
//! the store) and compare under a numeric-aware total order, so the two
//! spellings of a whole number are equal.

use std::cmp::Ordering;

use serde_json::Value as Json;

use gavel_foundation::{Error, Result, Value};
use gavel_storage::{ref_to_path, DataStore, Document};

/// Converts a value to JSON, resolving references through the store.
///
/// # Errors
/// Variables are an illegal conversion input and yield an unbound
/// variable error (a compile-time safety violation upstream). A
/// reference into a virtual document cannot be converted directly and
/// yields a dereference error; storage errors propagate.
pub fn value_to_json(value: &Value, store: &DataStore) -> Result<Json> {
    match value {
        Value::Null => Ok(Json::Null),
        Value::Bool(b) => Ok(Json::Bool(*b)),
        Value::Int(n) => Ok(Json::from(*n)),
        Value::Float(n) => serde_json::Number::from_f64(*n)
            .map(Json::Number)
            .ok_or_else(|| Error::internal(format!("non-finite number: {n}"))),
        Value::String(s) => Ok(Json::String(s.to_string())),
        Value::Array(elems) => elems
            .iter()
            .map(|t| value_to_json(&t.value, store))
            .collect::<Result<Vec<_>>>()
            .map(Json::Array),
        Value::Object(pairs) => {
            let mut map = serde_json::Map::with_capacity(pairs.len());
            for (k, v) in pairs {
                let key = value_to_json(&k.value, store)?;
                let Json::String(key) = key else {
                    return Err(Error::non_string_key(key.to_string()));
                };
                map.insert(key, value_to_json(&v.value, store)?);
            }
            Ok(Json::Object(map))
        }
        Value::Ref(r) => match store.get(&ref_to_path(r)?)? {
            Document::Data(json) => Ok(json.clone()),
            Document::Rules(_) => Err(Error::bad_dereference(format!(
                "virtual document {r}"
            ))),
        },
        Value::Var(v) => Err(Error::unbound_variable(v.name())),
    }
}

fn type_rank(json: &Json) -> u8 {
    match json {
        Json::Null => 0,
        Json::Bool(_) => 1,
        Json::Number(_) => 2,
        Json::String(_) => 3,
        Json::Array(_) => 4,
        Json::Object(_) => 5,
    }
}

/// Totally orders JSON values: null < booleans < numbers < strings <
/// arrays < objects. Numbers compare numerically regardless of spelling.
#[must_use]
pub fn compare(a: &Json, b: &Json) -> Ordering {
    match (a, b) {
        (Json::Null, Json::Null) => Ordering::Equal,
        (Json::Bool(x), Json::Bool(y)) => x.cmp(y),
        (Json::Number(x), Json::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Json::String(x), Json::String(y)) => x.cmp(y),
        (Json::Array(x), Json::Array(y)) => {
            for (xe, ye) in x.iter().zip(y.iter()) {
                match compare(xe, ye) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        (Json::Object(x), Json::Object(y)) => {
            let mut xk: Vec<_> = x.keys().collect();
            let mut yk: Vec<_> = y.keys().collect();
            xk.sort_unstable();
            yk.sort_unstable();
            match xk.cmp(&yk) {
                Ordering::Equal => {}
                other => return other,
            }
            for k in xk {
                match compare(&x[k.as_str()], &y[k.as_str()]) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            Ordering::Equal
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
