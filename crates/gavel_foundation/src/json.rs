//! Bridge between the term model and JSON documents.
//!
//! Base documents are JSON-shaped (`serde_json::Value`, built with
//! `preserve_order` so object iteration follows insertion order). The
//! evaluator moves between the two representations at the storage
//! boundary and when materializing query results.

use serde_json::Value as Json;

use crate::error::Error;
use crate::term::Term;
use crate::value::Value;
use crate::Result;

/// Converts a JSON document into a ground term value.
///
/// Numbers that fit in `i64` become [`Value::Int`]; everything else
/// becomes [`Value::Float`]. Object pair order follows the document.
#[must_use]
pub fn value_from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => number_from_json(n),
        Json::String(s) => Value::String(s.as_str().into()),
        Json::Array(elems) => Value::Array(
            elems
                .iter()
                .map(|e| Term::new(value_from_json(e)))
                .collect(),
        ),
        Json::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (Term::string(k.as_str()), Term::new(value_from_json(v))))
                .collect(),
        ),
    }
}

fn number_from_json(n: &serde_json::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i)
    } else {
        // u64 beyond i64::MAX or a true float; either way f64 is the
        // closest representation available.
        Value::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Converts a ground value (no variables, no references) into JSON.
///
/// # Errors
/// Returns [`crate::ErrorKind::UnboundVariable`] for variables,
/// [`crate::ErrorKind::BadDereference`] for references (resolving a
/// reference needs the store; see the engine's conversion), and
/// [`crate::ErrorKind::NonStringKey`] for object keys that are not
/// strings.
pub fn ground_to_json(value: &Value) -> Result<Json> {
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
            .map(|t| ground_to_json(&t.value))
            .collect::<Result<Vec<_>>>()
            .map(Json::Array),
        Value::Object(pairs) => {
            let mut map = serde_json::Map::with_capacity(pairs.len());
            for (k, v) in pairs {
                let Value::String(key) = &k.value else {
                    return Err(Error::non_string_key(k.value.to_string()));
                };
                map.insert(key.to_string(), ground_to_json(&v.value)?);
            }
            Ok(Json::Object(map))
        }
        Value::Var(v) => Err(Error::unbound_variable(v.name())),
        Value::Ref(r) => Err(Error::bad_dereference(r.to_string())),
    }
}
