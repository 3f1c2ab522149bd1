//! Trace record formatting.

use serde_json::json;

use crate::trace::record::TraceRecord;

/// Renders trace records as text.
pub trait TraceFormatter {
    /// Formats a single record.
    fn format(&self, record: &TraceRecord) -> String;

    /// Formats multiple records, one per line.
    fn format_many(&self, records: &[&TraceRecord]) -> String {
        records
            .iter()
            .map(|r| self.format(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Human-readable format: depth-indented operations.
///
/// ```text
/// [000001] Enter
/// [000002]   Eval q[x]
/// [000003]   Exit
/// ```
#[derive(Clone, Debug, Default)]
pub struct HumanFormatter {
    show_bindings: bool,
}

impl HumanFormatter {
    /// Creates a formatter that hides bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Includes the bindings in each line.
    #[must_use]
    pub fn with_bindings(mut self) -> Self {
        self.show_bindings = true;
        self
    }
}

impl TraceFormatter for HumanFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let event = &record.event;
        let indent = "  ".repeat(event.depth);
        let mut line = format!("[{:06}] {}{}", record.id, indent, event.op);
        if let Some(expr) = &event.expr {
            line.push(' ');
            line.push_str(&expr.to_string());
        }
        if self.show_bindings {
            line.push(' ');
            line.push_str(&event.bindings.to_string());
        }
        line
    }
}

/// JSON format, one object per record.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Creates a JSON formatter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TraceFormatter for JsonFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let event = &record.event;
        let bindings: serde_json::Map<String, serde_json::Value> = event
            .bindings
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v.to_string())))
            .collect();
        json!({
            "id": record.id,
            "timestamp_ns": record.timestamp_ns,
            "op": event.op_name(),
            "expr": event.expr.as_ref().map(ToString::to_string),
            "bindings": bindings,
            "depth": event.depth,
            "parent_depth": event.parent_depth,
        })
        .to_string()
    }
}
