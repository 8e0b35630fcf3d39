// SPDX-License-Identifier: MIT

//! Branch predicate types as they appear in definition documents

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// A single comparison `left op right`.
///
/// Operands are arbitrary JSON values. String operands may be templates that
/// are bound against the data context before evaluation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Condition {
    #[serde(default)]
    pub left: Value,
    #[serde(alias = "operator")]
    pub op: CompareOp,
    #[serde(default)]
    pub right: Value,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum CompareOp {
    /// ==
    Eq,
    /// !=
    NotEq,
    /// >
    Gt,
    /// >=
    Gte,
    /// <
    Lt,
    /// <=
    Lte,
    /// SQL-style pattern match (`%` and `_` wildcards)
    Like,
}

impl Condition {
    pub fn new(left: impl Into<Value>, op: CompareOp, right: impl Into<Value>) -> Self {
        Self {
            left: left.into(),
            op,
            right: right.into(),
        }
    }
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "==" | "=" | "eq" => Ok(CompareOp::Eq),
            "!=" | "<>" | "ne" => Ok(CompareOp::NotEq),
            ">" | "gt" => Ok(CompareOp::Gt),
            ">=" | "gte" | "ge" => Ok(CompareOp::Gte),
            "<" | "lt" => Ok(CompareOp::Lt),
            "<=" | "lte" | "le" => Ok(CompareOp::Lte),
            "like" => Ok(CompareOp::Like),
            other => Err(format!("Unknown comparison operator: {}", other)),
        }
    }
}

impl TryFrom<String> for CompareOp {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CompareOp> for String {
    fn from(op: CompareOp) -> Self {
        op.to_string()
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::Like => write!(f, "like"),
        }
    }
}
