//! The outer query entry point.
//!
//! `top_down_query` materializes the document named by a path: base
//! documents come straight from storage; virtual documents are computed
//! by running the proof search over their rules and collecting the
//! results according to the document kind.

use std::fmt;
use std::rc::Rc;

use serde_json::Value as Json;

use gavel_foundation::{Bindings, Error, Result, Rule, RuleHead};
use gavel_storage::{DataStore, Document, PathSeg};

use crate::builtins::Builtins;
use crate::context::Ctx;
use crate::convert::value_to_json;
use crate::eval::evaluate;
use crate::plug::plug_value;
use crate::trace::TracerHandle;

/// Input parameters for the query interface.
pub struct QueryParams<'s> {
    /// The store to query.
    pub store: &'s DataStore,
    /// Optional tracing hook.
    pub tracer: Option<TracerHandle>,
    /// The built-in registry.
    pub builtins: Rc<Builtins>,
    /// Whether the indexed equality fast path may be used.
    pub indexing: bool,
    /// The document path, e.g. `["p"]` or `["data", "servers"]`.
    pub path: Vec<String>,
}

impl<'s> QueryParams<'s> {
    /// Creates parameters with the default registry and no tracer.
    #[must_use]
    pub fn new(store: &'s DataStore, path: Vec<String>) -> Self {
        Self {
            store,
            tracer: None,
            builtins: Rc::new(Builtins::default()),
            indexing: true,
            path,
        }
    }

    /// Attaches a tracer.
    #[must_use]
    pub fn with_tracer(mut self, tracer: TracerHandle) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Replaces the built-in registry.
    #[must_use]
    pub fn with_builtins(mut self, builtins: Rc<Builtins>) -> Self {
        self.builtins = builtins;
        self
    }

    /// Enables or disables the indexed fast path.
    #[must_use]
    pub fn with_indexing(mut self, indexing: bool) -> Self {
        self.indexing = indexing;
        self
    }
}

/// The result of a query: a document, or the designated absence of one.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryResult {
    /// The document's value.
    Value(Json),
    /// No grounding satisfied the query.
    Undefined,
}

impl QueryResult {
    /// Returns true if the query was undefined.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns the value, if defined.
    #[must_use]
    pub fn as_value(&self) -> Option<&Json> {
        match self {
            Self::Value(j) => Some(j),
            Self::Undefined => None,
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(j) => write!(f, "{j}"),
            Self::Undefined => write!(f, "<undefined>"),
        }
    }
}

/// Returns the document identified by the path.
///
/// If the storage node at the path is a rule set, the proof search is
/// run to generate the virtual document. A path naming nothing yields
/// [`QueryResult::Undefined`].
///
/// # Errors
/// Propagates storage errors, safety violations (unbound variables,
/// non-string object keys), and conflicting complete rules.
pub fn top_down_query(params: &QueryParams<'_>) -> Result<QueryResult> {
    let segs: Vec<PathSeg> = params
        .path
        .iter()
        .map(|s| PathSeg::Field(s.as_str().into()))
        .collect();

    let doc = match params.store.get(&segs) {
        Ok(doc) => doc,
        Err(e) if e.is_not_found() => return Ok(QueryResult::Undefined),
        Err(e) => return Err(e),
    };

    match doc {
        Document::Data(json) => Ok(QueryResult::Value(json.clone())),
        Document::Rules(rules) => {
            if rules.is_empty() {
                return Ok(QueryResult::Undefined);
            }
            // All rules at one path share a kind; checked at compile
            // time.
            match rules[0].doc_kind() {
                gavel_foundation::DocKind::Complete => query_complete(params, rules),
                gavel_foundation::DocKind::PartialObject => query_partial_object(params, rules),
                gavel_foundation::DocKind::PartialSet => query_partial_set(params, rules),
            }
        }
    }
}

fn rule_context<'s>(params: &QueryParams<'s>, rule: &Rule) -> Ctx<'s> {
    let mut ctx = Ctx::new(rule.body().clone(), params.store)
        .with_builtins(Rc::clone(&params.builtins))
        .with_indexing(params.indexing);
    if let Some(tracer) = &params.tracer {
        ctx = ctx.with_tracer(Rc::clone(tracer));
    }
    ctx
}

fn query_complete(
    params: &QueryParams<'_>,
    rules: &[std::sync::Arc<Rule>],
) -> Result<QueryResult> {
    if rules.len() > 1 {
        return Err(Error::conflicting_rules(rules[0].name().name()));
    }
    let rule = &rules[0];
    let RuleHead::Complete { value } = rule.head() else {
        return Err(Error::internal("mismatched rule kind at path"));
    };

    let ctx = rule_context(params, rule);
    let mut satisfied: Option<Bindings> = None;
    evaluate(&ctx, &mut |c| {
        if satisfied.is_none() {
            satisfied = Some(c.bindings.clone());
        }
        Ok(())
    })?;

    match satisfied {
        None => Ok(QueryResult::Undefined),
        Some(bindings) => {
            let plugged = plug_value(&value.value, &bindings);
            Ok(QueryResult::Value(value_to_json(&plugged, params.store)?))
        }
    }
}

fn query_partial_object(
    params: &QueryParams<'_>,
    rules: &[std::sync::Arc<Rule>],
) -> Result<QueryResult> {
    let mut result = serde_json::Map::new();
    for rule in rules {
        let RuleHead::PartialObject { key, value } = rule.head() else {
            return Err(Error::internal("mismatched rule kind at path"));
        };
        let ctx = rule_context(params, rule);
        evaluate(&ctx, &mut |c| {
            let key_json = value_to_json(&plug_value(&key.value, &c.bindings), params.store)?;
            let Json::String(key_str) = key_json else {
                return Err(Error::non_string_key(key_json.to_string()));
            };
            let value_json =
                value_to_json(&plug_value(&value.value, &c.bindings), params.store)?;
            result.insert(key_str, value_json);
            Ok(())
        })?;
    }
    Ok(QueryResult::Value(Json::Object(result)))
}

fn query_partial_set(
    params: &QueryParams<'_>,
    rules: &[std::sync::Arc<Rule>],
) -> Result<QueryResult> {
    let mut result: Vec<Json> = Vec::new();
    for rule in rules {
        let RuleHead::PartialSet { key } = rule.head() else {
            return Err(Error::internal("mismatched rule kind at path"));
        };
        let ctx = rule_context(params, rule);
        evaluate(&ctx, &mut |c| {
            let element = value_to_json(&plug_value(&key.value, &c.bindings), params.store)?;
            if !result.contains(&element) {
                result.push(element);
            }
            Ok(())
        })?;
    }
    Ok(QueryResult::Value(Json::Array(result)))
}
