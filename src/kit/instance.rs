// SPDX-License-Identifier: MIT

//! Persisted workflow instance records
//!
//! Payload fields (`assignees`, `input`, `output`) stay schema-less
//! [`serde_json::Value`]s: the store hands back whatever was written, and the
//! merge rules decide what to do with malformed prior state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier of a user taking part in a workflow
pub type UserId = i64;

/// Repository primary key of an instance (distinct from the data id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for InstanceId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for InstanceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External correlation key tying an instance to a business record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataId(String);

impl From<&str> for DataId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DataId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for DataId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of an instance or of its current node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    InProgress,
    Closed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::InProgress => write!(f, "in_progress"),
            Status::Closed => write!(f, "closed"),
        }
    }
}

/// One running occurrence of a workflow for a given data id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Unset until the repository has stored the row
    pub id: Option<InstanceId>,
    /// Name of the workflow definition
    pub workflow: String,
    pub data_id: DataId,
    /// Name of the node the instance currently sits on
    pub node_name: String,
    pub node_status: Status,
    pub status: Status,
    /// User currently responsible for the node
    pub owner_id: Option<UserId>,
    /// Ordered set of every user that touched the instance
    pub assignees: Value,
    /// Per-node input payloads keyed by node name
    pub input: Value,
    pub output: Value,
    /// Bumped by the repository on every successful upsert
    #[serde(default)]
    pub revision: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Instance {
    /// In-memory, unsaved instance sitting on `node_name`
    pub fn template(
        workflow: impl Into<String>,
        data_id: DataId,
        node_name: impl Into<String>,
        uid: UserId,
    ) -> Self {
        Self {
            id: None,
            workflow: workflow.into(),
            data_id,
            node_name: node_name.into(),
            node_status: Status::InProgress,
            status: Status::InProgress,
            owner_id: Some(uid),
            assignees: Value::Array(vec![Value::from(uid)]),
            input: Value::Object(Map::new()),
            output: Value::Object(Map::new()),
            revision: 0,
            created_at: None,
            updated_at: None,
        }
    }

    /// Assignee ids that are integers; anything else in the stored set is skipped
    pub fn assignee_ids(&self) -> Vec<UserId> {
        match &self.assignees {
            Value::Array(users) => users.iter().filter_map(Value::as_i64).collect(),
            _ => vec![],
        }
    }

    pub fn has_assignee(&self, uid: UserId) -> bool {
        self.assignee_ids().contains(&uid)
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == Status::InProgress
    }

    /// Label used in diagnostics: the id when stored, else workflow/data id
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => format!("{}:{}", self.workflow, self.data_id),
        }
    }
}
