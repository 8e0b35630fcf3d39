//! Operand binding
//!
//! A string operand is bound to a value from the data context when it is a
//! template:
//! - `{{ $out.approved }}` or `?:$out.approved` always bind; a missing path
//!   binds to `null`
//! - a bare string whose first segment is a context root (`$out.approved`)
//!   binds the same way
//!
//! Every other operand passes through untouched.

use serde_json::Value;

use super::ast::Condition;
use crate::waypoint::workflow::context::DataContext;

/// Resolve template operands of every condition against `ctx`
pub fn bind(conditions: &[Condition], ctx: &DataContext) -> Vec<Condition> {
    conditions
        .iter()
        .map(|cond| Condition {
            left: bind_value(&cond.left, ctx),
            op: cond.op,
            right: bind_value(&cond.right, ctx),
        })
        .collect()
}

/// Resolve a single operand
pub fn bind_value(value: &Value, ctx: &DataContext) -> Value {
    let Value::String(s) = value else {
        return value.clone();
    };

    match template_path(s, ctx) {
        Some(path) => ctx.get_path(path).cloned().unwrap_or(Value::Null),
        None => value.clone(),
    }
}

fn template_path<'a>(s: &'a str, ctx: &DataContext) -> Option<&'a str> {
    let trimmed = s.trim();
    if let Some(inner) = trimmed
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
    {
        return Some(inner.trim());
    }
    if let Some(path) = trimmed.strip_prefix("?:") {
        return Some(path.trim());
    }

    let root = trimmed.split('.').next().unwrap_or_default();
    if ctx.has_root(root) {
        Some(trimmed)
    } else {
        None
    }
}
