// SPDX-License-Identifier: MIT

//! Schema types for workflow definition documents
//!
//! A document only carries the node list; the workflow name comes from the
//! file's location and the raw source is kept so the definition can be
//! re-parsed on reload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

use super::condition::Condition;
use super::loader::DocumentFormat;

/// A loaded workflow: an ordered node list plus its origin
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WorkflowDefinition {
    #[serde(skip_deserializing)]
    pub name: String,
    /// Ordered nodes; order drives linear advancement and last-node detection
    pub nodes: Vec<Node>,
    /// Original document text
    #[serde(skip)]
    pub source: String,
    /// Encoding of `source`
    #[serde(skip)]
    pub format: DocumentFormat,
    /// File the document was read from, if any
    #[serde(skip)]
    pub path: Option<PathBuf>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// A named step with an assignment rule and optional outgoing transitions
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    /// Who owns the node once the instance arrives on it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AssignmentSpec>,
    /// Conditional edges; empty means "advance to the next node"
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub next: Vec<Transition>,
}

/// Process invocation that yields the owning user id
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AssignmentSpec {
    pub process: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// A conditional edge, evaluated in declared order
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Transition {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub conditions: Vec<Condition>,
    pub goto: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl WorkflowDefinition {
    /// Build a definition from already-parsed nodes
    pub fn new(name: impl Into<String>, nodes: Vec<Node>) -> Self {
        let mut def = Self {
            name: name.into(),
            nodes,
            ..Default::default()
        };
        def.reindex();
        def
    }

    /// Rebuild the name -> position map. The first node wins on duplicate names.
    pub(crate) fn reindex(&mut self) {
        self.index.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            if self.index.contains_key(&node.name) {
                log::warn!(
                    "Workflow '{}' declares node '{}' more than once; using the first",
                    self.name,
                    node.name
                );
                continue;
            }
            self.index.insert(node.name.clone(), i);
        }
    }

    /// Position of a node in declared order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.position(name).map(|i| &self.nodes[i])
    }

    pub fn first(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn last(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// True iff `name` is the final declared node
    pub fn is_last_node(&self, name: &str) -> bool {
        self.last().is_some_and(|node| node.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Goto targets that do not name a node, as `(from, target)` pairs
    pub fn dangling_targets(&self) -> Vec<(&str, &str)> {
        self.nodes
            .iter()
            .flat_map(|node| {
                node.next
                    .iter()
                    .filter(|t| self.position(&t.goto).is_none())
                    .map(move |t| (node.name.as_str(), t.goto.as_str()))
            })
            .collect()
    }
}
