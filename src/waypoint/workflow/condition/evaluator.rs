//! Condition evaluator
//!
//! A condition list is the AND of its members; an empty list holds.

use serde_json::Value;
use std::cmp::Ordering;

use super::ast::{CompareOp, Condition};
use super::bind::bind;
use crate::waypoint::workflow::context::DataContext;

/// Evaluate already-bound conditions
pub fn evaluate(conditions: &[Condition]) -> bool {
    conditions.iter().all(evaluate_one)
}

/// Bind against `ctx`, then evaluate
pub fn when(conditions: &[Condition], ctx: &DataContext) -> bool {
    evaluate(&bind(conditions, ctx))
}

fn evaluate_one(cond: &Condition) -> bool {
    let left = &cond.left;
    let right = &cond.right;

    let result = match cond.op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::NotEq => !values_equal(left, right),
        CompareOp::Gt => compare(left, right) == Some(Ordering::Greater),
        CompareOp::Gte => matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CompareOp::Lt => compare(left, right) == Some(Ordering::Less),
        CompareOp::Lte => matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        CompareOp::Like => check_like(left, right),
    };

    log::debug!("{} {} {} => {}", left, cond.op, right, result);
    result
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn check_like(left: &Value, right: &Value) -> bool {
    let Value::String(pattern) = right else {
        return false;
    };
    match left {
        Value::String(s) => like_match(s, pattern),
        Value::Number(n) => like_match(&n.to_string(), pattern),
        Value::Bool(b) => like_match(&b.to_string(), pattern),
        _ => false,
    }
}

/// SQL LIKE matching: `%` matches any run of characters, `_` exactly one
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    // Last `%` seen and the text position it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if let Some((star, mark)) = backtrack {
            p = star + 1;
            t = mark + 1;
            backtrack = Some((star, mark + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '%')
}
