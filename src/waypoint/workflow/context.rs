// SPDX-License-Identifier: MIT

//! Evaluation context for branch conditions
//!
//! Transition conditions address instance data through root aliases:
//! `$in` / `$input` for the per-node input, `$out` / `$output` / `$data` for
//! the merged output.

use serde_json::{Map, Value};

/// Aliases bound to the per-node input map
pub const INPUT_ALIASES: [&str; 2] = ["$in", "$input"];

/// Aliases bound to the merged output
pub const OUTPUT_ALIASES: [&str; 3] = ["$out", "$output", "$data"];

/// Named roots that dotted paths resolve against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataContext {
    fields: Map<String, Value>,
}

impl DataContext {
    /// Context with every input and output alias populated
    pub fn new(input: &Value, output: &Value) -> Self {
        let mut ctx = Self::empty();
        for alias in INPUT_ALIASES {
            ctx.insert(alias, input.clone());
        }
        for alias in OUTPUT_ALIASES {
            ctx.insert(alias, output.clone());
        }
        ctx
    }

    pub fn empty() -> Self {
        Self { fields: Map::new() }
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.fields.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether `key` names a root of this context
    pub fn has_root(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Get a nested value using dot notation (e.g. `$out.items.0.price`).
    /// Numeric segments index into arrays.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Snapshot of the whole context, used in diagnostics
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_context() {
        let ctx = DataContext::empty();
        assert!(ctx.get("$out").is_none());
        assert!(ctx.get_path("$out.a").is_none());
        assert!(!ctx.has_root("$out"));
    }

    #[test]
    fn test_aliases_populated() {
        let ctx = DataContext::new(&json!({"submit": {"days": 2}}), &json!({"ok": true}));
        for alias in INPUT_ALIASES {
            assert_eq!(ctx.get(alias), Some(&json!({"submit": {"days": 2}})));
        }
        for alias in OUTPUT_ALIASES {
            assert_eq!(ctx.get(alias), Some(&json!({"ok": true})));
        }
    }

    #[test]
    fn test_get_path() {
        let mut ctx = DataContext::empty();
        ctx.insert("result", json!({"data": {"value": 42}, "items": [{"id": 7}]}));

        assert_eq!(ctx.get_path("result.data"), Some(&json!({"value": 42})));
        assert_eq!(ctx.get_path("result.data.value"), Some(&json!(42)));
        assert_eq!(ctx.get_path("result.items.0.id"), Some(&json!(7)));
        assert_eq!(ctx.get_path("result.items.1"), None);
        assert_eq!(ctx.get_path("result.items.first"), None);
        assert_eq!(ctx.get_path("result.data.value.deeper"), None);
        assert_eq!(ctx.get_path("result.nonexistent"), None);
    }

    #[test]
    fn test_to_json() {
        let ctx = DataContext::new(&json!({}), &json!({"a": 1}));
        let snapshot = ctx.to_json();
        assert_eq!(snapshot["$out"]["a"], 1);
        assert_eq!(snapshot["$in"], json!({}));
    }
}
