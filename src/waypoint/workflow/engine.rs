// SPDX-License-Identifier: MIT

//! Workflow engine - instance lifecycle orchestration
//!
//! The engine is bound to one workflow name and reads the definition from the
//! shared [`DefinitionStore`] on every call, so reloads take effect
//! immediately. It holds no locks of its own: each operation is a read from
//! the repository, a decision, and at most one write. Writes only happen
//! after node resolution and assignment have both succeeded.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use super::context::DataContext;
use super::merge::{merge_data, merge_users};
use super::registry::DefinitionStore;
use super::resolver::NodeResolver;
use super::types::{Node, WorkflowDefinition};
use crate::kit::{
    AssignmentResolver, DataId, EngineError, Instance, InstanceFilter, InstanceId,
    InstanceRepository, Status, UserId, WorkflowError,
};

/// Drives instances of one workflow through its nodes
pub struct WorkflowEngine {
    name: String,
    definitions: DefinitionStore,
    repository: Arc<dyn InstanceRepository>,
    assigner: Arc<dyn AssignmentResolver>,
    assignment_timeout: Option<Duration>,
}

impl WorkflowEngine {
    pub fn new(
        name: impl Into<String>,
        definitions: DefinitionStore,
        repository: Arc<dyn InstanceRepository>,
        assigner: Arc<dyn AssignmentResolver>,
    ) -> Self {
        Self {
            name: name.into(),
            definitions,
            repository,
            assigner,
            assignment_timeout: None,
        }
    }

    /// Bound each assignment resolver call; `None` waits indefinitely
    pub fn with_assignment_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.assignment_timeout = timeout;
        self
    }

    /// Current definition snapshot
    pub async fn definition(&self) -> Result<Arc<WorkflowDefinition>, EngineError> {
        Ok(self.definitions.select(&self.name).await?)
    }

    /// The open instance `uid` can see for `data_id`, or an unsaved template
    /// sitting on the first node
    pub async fn open(
        &self,
        uid: UserId,
        data_id: impl Into<DataId>,
    ) -> Result<Instance, EngineError> {
        let data_id = data_id.into();
        let filter = InstanceFilter::in_progress(&self.name, data_id.clone(), uid);
        if let Some(instance) = self.repository.find_one(&filter).await? {
            return Ok(instance);
        }

        let def = self.definition().await?;
        let first = def.first().ok_or_else(|| WorkflowError::InvalidDefinition {
            name: self.name.clone(),
            message: "no nodes declared".to_string(),
        })?;
        Ok(Instance::template(&self.name, data_id, &first.name, uid))
    }

    /// Instance by repository primary key
    pub async fn find(&self, id: &InstanceId) -> Result<Instance, EngineError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Record `input` for `node`, merge `output`, and add `uid` to the
    /// assignees. Creates the instance when `uid` has no open one for
    /// `data_id`.
    pub async fn save(
        &self,
        uid: UserId,
        node: &str,
        data_id: impl Into<DataId>,
        input: Value,
        output: Option<Value>,
    ) -> Result<Instance, EngineError> {
        let data_id = data_id.into();
        let def = self.definition().await?;
        if def.position(node).is_none() {
            return Err(WorkflowError::node_not_found(&self.name, node).into());
        }

        let filter = InstanceFilter::in_progress(&self.name, data_id.clone(), uid);
        let existing = self.repository.find_one(&filter).await?;

        let mut node_input = Map::new();
        node_input.insert(node.to_string(), input);
        let node_input = Value::Object(node_input);
        let output = output.unwrap_or_else(|| Value::Object(Map::new()));

        let mut instance = match existing {
            Some(mut row) => {
                row.input = Value::Object(merge_data(&row.input, &node_input));
                row.assignees = Value::Array(merge_users(&row.assignees, &[Value::from(uid)]));
                row.output = Value::Object(merge_data(&row.output, &output));
                row
            }
            None => {
                let mut row = Instance::template(&self.name, data_id, node, uid);
                row.input = node_input;
                row.output = output;
                row
            }
        };
        instance.node_name = node.to_string();
        instance.owner_id = Some(uid);

        let saved = self.commit(&instance).await?;
        log::info!(
            "Workflow '{}' saved node '{}' of instance {} by user {}",
            self.name,
            node,
            saved.label(),
            uid
        );
        Ok(saved)
    }

    /// Advance the instance to the node its transitions select
    pub async fn next(
        &self,
        uid: UserId,
        id: &InstanceId,
        output: Value,
    ) -> Result<Instance, EngineError> {
        let mut instance = self.load_open(id).await?;
        let def = self.definition().await?;

        let output = merge_data(&instance.output, &output);
        let assignees = merge_users(&instance.assignees, &[Value::from(uid)]);
        let output = Value::Object(output);

        let ctx = DataContext::new(&instance.input, &output);
        let next = NodeResolver::new(&def).next(&instance.node_name, &ctx)?;
        let owner = self.assign(next, uid).await?;

        log::info!(
            "Workflow '{}' instance {} moves '{}' -> '{}' (owner {})",
            self.name,
            instance.label(),
            instance.node_name,
            next.name,
            owner
        );

        instance.output = output;
        instance.assignees = Value::Array(assignees);
        self.advance(&mut instance, next, owner);
        self.commit(&instance).await
    }

    /// Jump straight to `target`, bypassing transition conditions
    pub async fn goto(
        &self,
        uid: UserId,
        id: &InstanceId,
        target: &str,
        output: Value,
    ) -> Result<Instance, EngineError> {
        let mut instance = self.load_open(id).await?;
        let def = self.definition().await?;

        let next = def
            .node(target)
            .ok_or_else(|| WorkflowError::GotoTargetNotFound {
                workflow: self.name.clone(),
                from: instance.node_name.clone(),
                target: target.to_string(),
            })?;
        let owner = self.assign(next, uid).await?;

        log::info!(
            "Workflow '{}' instance {} jumps '{}' -> '{}' (owner {})",
            self.name,
            instance.label(),
            instance.node_name,
            next.name,
            owner
        );

        instance.output = Value::Object(merge_data(&instance.output, &output));
        instance.assignees = Value::Array(merge_users(&instance.assignees, &[Value::from(uid)]));
        self.advance(&mut instance, next, owner);
        self.commit(&instance).await
    }

    /// Mark the instance closed; it no longer shows up in `open`/`save`
    pub async fn close(
        &self,
        uid: UserId,
        id: &InstanceId,
        output: Value,
    ) -> Result<Instance, EngineError> {
        let mut instance = self.load_open(id).await?;

        instance.output = Value::Object(merge_data(&instance.output, &output));
        instance.assignees = Value::Array(merge_users(&instance.assignees, &[Value::from(uid)]));
        instance.status = Status::Closed;
        instance.node_status = Status::Closed;

        log::info!(
            "Workflow '{}' instance {} closed on '{}' by user {}",
            self.name,
            instance.label(),
            instance.node_name,
            uid
        );
        self.commit(&instance).await
    }

    /// Whether `node` is the final declared node
    pub async fn is_last_node(&self, node: &str) -> Result<bool, EngineError> {
        Ok(self.definition().await?.is_last_node(node))
    }

    /// Load an instance that belongs to this workflow and can still move
    async fn load_open(&self, id: &InstanceId) -> Result<Instance, EngineError> {
        let instance = self.find(id).await?;
        if instance.workflow != self.name {
            return Err(EngineError::invalid_state(
                id,
                format!(
                    "instance belongs to workflow '{}', not '{}'",
                    instance.workflow, self.name
                ),
            ));
        }
        if instance.node_name.is_empty() {
            return Err(EngineError::invalid_state(id, "current node is not set"));
        }
        if !instance.is_in_progress() {
            return Err(EngineError::invalid_state(id, "instance is closed"));
        }
        Ok(instance)
    }

    fn advance(&self, instance: &mut Instance, next: &Node, owner: UserId) {
        instance.node_name = next.name.clone();
        instance.node_status = Status::InProgress;
        instance.status = Status::InProgress;
        instance.owner_id = Some(owner);
    }

    /// Resolve the owner of `node`. Nodes without an assignment spec stay
    /// with the acting user.
    async fn assign(&self, node: &Node, uid: UserId) -> Result<UserId, EngineError> {
        let Some(spec) = &node.user else {
            return Ok(uid);
        };

        let call = self.assigner.resolve(&spec.process, &spec.args);
        let result = match self.assignment_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                EngineError::assignment(
                    &spec.process,
                    format!("timed out after {}ms", limit.as_millis()),
                )
            })?,
            None => call.await,
        };

        let value = result.map_err(|e| EngineError::assignment(&spec.process, e.to_string()))?;
        coerce_user_id(&value).ok_or_else(|| {
            EngineError::assignment(&spec.process, format!("returned {} instead of a user id", value))
        })
    }

    async fn commit(&self, instance: &Instance) -> Result<Instance, EngineError> {
        let id = self.repository.upsert(instance).await?;
        self.find(&id).await
    }
}

/// Interpret a process result as a user id: integers, integral floats and
/// numeric strings are accepted
pub fn coerce_user_id(value: &Value) -> Option<UserId> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
