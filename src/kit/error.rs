// SPDX-License-Identifier: MIT

//! Typed error handling for waypoint-rs
//!
//! Callers branch on the error kind; nothing in the engine retries or
//! recovers locally.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use super::instance::InstanceId;

/// Top-level error type for engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Definition and node-resolution faults
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// No instance stored under the given primary key
    #[error("Workflow instance {0} not found")]
    InstanceNotFound(InstanceId),

    /// The stored instance cannot be advanced in its current shape
    #[error("Invalid instance state for {instance}: {message}")]
    InvalidState { instance: String, message: String },

    /// The assignment resolver failed or returned something that is not a user id
    #[error("Assignment via process '{process}' failed: {message}")]
    Assignment { process: String, message: String },

    /// A conditional upsert lost against a concurrent writer
    #[error("Instance {id} was modified concurrently (expected revision {expected}, found {actual})")]
    ConcurrentModification {
        id: InstanceId,
        expected: u64,
        actual: u64,
    },

    /// Underlying store failure
    #[error(transparent)]
    Repository(RepositoryError),

    /// Configuration errors (invalid env values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Definition loading and node resolution errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A definition document could not be parsed
    #[error("Workflow '{name}' in {} is malformed: {message}", .file.display())]
    DefinitionParse {
        name: String,
        file: PathBuf,
        content: String,
        message: String,
    },

    /// A definition parsed but is unusable (e.g. it declares no nodes)
    #[error("Workflow '{name}' is invalid: {message}")]
    InvalidDefinition { name: String, message: String },

    /// Nothing registered under this name
    #[error("Workflow '{0}' is not loaded")]
    DefinitionNotFound(String),

    /// The current node is not part of the definition
    #[error("Node '{node}' not found in workflow '{workflow}'")]
    NodeNotFound { workflow: String, node: String },

    /// The current node is the final declared node
    #[error("Node '{node}' is the last node of workflow '{workflow}'")]
    LastNodeReached { workflow: String, node: String },

    /// A matched transition points at an unknown node
    #[error("Transition from '{from}' targets unknown node '{target}' in workflow '{workflow}'")]
    GotoTargetNotFound {
        workflow: String,
        from: String,
        target: String,
    },

    /// No transition of the current node matched the data
    #[error("No transition of node '{node}' in workflow '{workflow}' matched the data")]
    NoMatchingBranch {
        workflow: String,
        node: String,
        data: Value,
    },
}

/// Errors raised by an [`InstanceRepository`](super::repository::InstanceRepository)
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("instance {0} not found")]
    NotFound(InstanceId),

    #[error("revision conflict on {id}: expected {expected}, found {actual}")]
    Conflict {
        id: InstanceId,
        expected: u64,
        actual: u64,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::InstanceNotFound(id),
            RepositoryError::Conflict {
                id,
                expected,
                actual,
            } => Self::ConcurrentModification {
                id,
                expected,
                actual,
            },
            other => Self::Repository(other),
        }
    }
}

impl EngineError {
    /// Create an invalid state error
    pub fn invalid_state(instance: impl ToString, message: impl Into<String>) -> Self {
        Self::InvalidState {
            instance: instance.to_string(),
            message: message.into(),
        }
    }

    /// Create an assignment error
    pub fn assignment(process: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Assignment {
            process: process.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The workflow-level error, if this is one
    pub fn as_workflow(&self) -> Option<&WorkflowError> {
        match self {
            Self::Workflow(err) => Some(err),
            _ => None,
        }
    }
}

impl WorkflowError {
    pub fn node_not_found(workflow: impl Into<String>, node: impl Into<String>) -> Self {
        Self::NodeNotFound {
            workflow: workflow.into(),
            node: node.into(),
        }
    }

    pub fn last_node(workflow: impl Into<String>, node: impl Into<String>) -> Self {
        Self::LastNodeReached {
            workflow: workflow.into(),
            node: node.into(),
        }
    }
}
