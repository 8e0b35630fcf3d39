//! Next-node resolution
//!
//! Given the node an instance sits on and its data, decide where it goes:
//! nodes without transitions advance linearly, nodes with transitions take
//! the first one whose conditions hold.

use super::condition;
use super::context::DataContext;
use super::types::{Node, Transition, WorkflowDefinition};
use crate::kit::WorkflowError;

/// Resolves successor nodes within one definition
pub struct NodeResolver<'a> {
    definition: &'a WorkflowDefinition,
}

impl<'a> NodeResolver<'a> {
    pub fn new(definition: &'a WorkflowDefinition) -> Self {
        Self { definition }
    }

    /// The node that follows `current` given `ctx`
    pub fn next(&self, current: &str, ctx: &DataContext) -> Result<&'a Node, WorkflowError> {
        let def = self.definition;
        let index = def
            .position(current)
            .ok_or_else(|| WorkflowError::node_not_found(&def.name, current))?;

        let next_index = index + 1;
        if next_index == def.len() {
            return Err(WorkflowError::last_node(&def.name, current));
        }

        let node = &def.nodes[index];
        if node.next.is_empty() {
            return Ok(&def.nodes[next_index]);
        }

        let Some(transition) = self.matching_transition(node, ctx) else {
            return Err(WorkflowError::NoMatchingBranch {
                workflow: def.name.clone(),
                node: current.to_string(),
                data: ctx.to_json(),
            });
        };

        def.node(&transition.goto)
            .ok_or_else(|| WorkflowError::GotoTargetNotFound {
                workflow: def.name.clone(),
                from: current.to_string(),
                target: transition.goto.clone(),
            })
    }

    /// First transition of `node` whose conditions hold
    fn matching_transition(&self, node: &'a Node, ctx: &DataContext) -> Option<&'a Transition> {
        node.next.iter().enumerate().find_map(|(i, transition)| {
            let matched = condition::when(&transition.conditions, ctx);
            log::debug!(
                "Workflow '{}' node '{}' transition #{} -> '{}': {}",
                self.definition.name,
                node.name,
                i,
                transition.goto,
                if matched { "matched" } else { "skipped" }
            );
            matched.then_some(transition)
        })
    }
}
