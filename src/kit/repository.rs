// SPDX-License-Identifier: MIT

//! Storage port for workflow instances
//!
//! The engine never touches a storage technology directly; it only speaks
//! this trait. Uniqueness of in-progress instances is a property of the
//! lookup filter, not of the store.

use async_trait::async_trait;

use super::error::RepositoryError;
use super::instance::{DataId, Instance, InstanceId, Status, UserId};

/// Lookup filter for the single open instance a user can see
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceFilter {
    pub workflow: String,
    pub data_id: DataId,
    /// The user must be a member of the instance's assignee set
    pub assignee: UserId,
    pub status: Status,
}

impl InstanceFilter {
    pub fn in_progress(workflow: impl Into<String>, data_id: DataId, assignee: UserId) -> Self {
        Self {
            workflow: workflow.into(),
            data_id,
            assignee,
            status: Status::InProgress,
        }
    }

    /// Whether a stored instance satisfies the filter
    pub fn matches(&self, instance: &Instance) -> bool {
        instance.workflow == self.workflow
            && instance.data_id == self.data_id
            && instance.status == self.status
            && instance.has_assignee(self.assignee)
    }
}

/// Repository trait for instance persistence.
///
/// `upsert` inserts when `instance.id` is `None` and replaces otherwise.
/// Implementations that support optimistic concurrency compare
/// `instance.revision` with the stored revision and fail with
/// [`RepositoryError::Conflict`] on mismatch.
#[async_trait]
pub trait InstanceRepository: Send + Sync {
    /// First instance matching the filter, if any
    async fn find_one(&self, filter: &InstanceFilter) -> Result<Option<Instance>, RepositoryError>;

    /// Instance by primary key; [`RepositoryError::NotFound`] when absent
    async fn find_by_id(&self, id: &InstanceId) -> Result<Instance, RepositoryError>;

    /// Insert or replace, returning the primary key
    async fn upsert(&self, instance: &Instance) -> Result<InstanceId, RepositoryError>;
}
