// SPDX-License-Identifier: MIT

//! In-process instance repository
//!
//! Backs the CLI and tests. Upserts are revision-checked: a write carrying a
//! stale `revision` is rejected instead of overwriting a newer row.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::kit::{Instance, InstanceFilter, InstanceId, InstanceRepository, RepositoryError};

#[derive(Clone, Default)]
pub struct MemoryRepository {
    rows: Arc<RwLock<HashMap<InstanceId, Instance>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl InstanceRepository for MemoryRepository {
    async fn find_one(&self, filter: &InstanceFilter) -> Result<Option<Instance>, RepositoryError> {
        let rows = self.rows.read().await;
        // Oldest match first, like an auto-increment table scan; ids break ties
        Ok(rows
            .values()
            .filter(|row| filter.matches(row))
            .min_by_key(|row| (row.created_at, row.id))
            .cloned())
    }

    async fn find_by_id(&self, id: &InstanceId) -> Result<Instance, RepositoryError> {
        let rows = self.rows.read().await;
        rows.get(id).cloned().ok_or(RepositoryError::NotFound(*id))
    }

    async fn upsert(&self, instance: &Instance) -> Result<InstanceId, RepositoryError> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;

        let id = instance.id.unwrap_or_default();
        let mut row = instance.clone();
        row.id = Some(id);
        row.updated_at = Some(now);

        match rows.get(&id) {
            Some(stored) => {
                if stored.revision != instance.revision {
                    return Err(RepositoryError::Conflict {
                        id,
                        expected: instance.revision,
                        actual: stored.revision,
                    });
                }
                row.revision = stored.revision + 1;
                row.created_at = stored.created_at;
            }
            None => {
                row.revision = 1;
                row.created_at = Some(now);
            }
        }

        rows.insert(id, row);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::{DataId, Status};
    use serde_json::json;

    fn instance(data_id: i64, uid: i64) -> Instance {
        Instance::template("leave", DataId::from(data_id), "submit", uid)
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let repo = MemoryRepository::new();
        let id = repo.upsert(&instance(1, 1)).await.unwrap();

        let row = repo.find_by_id(&id).await.unwrap();
        assert_eq!(row.id, Some(id));
        assert_eq!(row.revision, 1);
        assert!(row.created_at.is_some());
        assert_eq!(row.created_at, row.updated_at);
    }

    #[tokio::test]
    async fn test_update_bumps_revision() {
        let repo = MemoryRepository::new();
        let id = repo.upsert(&instance(1, 1)).await.unwrap();

        let mut row = repo.find_by_id(&id).await.unwrap();
        row.output = json!({"x": 1});
        repo.upsert(&row).await.unwrap();

        let stored = repo.find_by_id(&id).await.unwrap();
        assert_eq!(stored.revision, 2);
        assert_eq!(stored.output, json!({"x": 1}));
        assert_eq!(stored.created_at, row.created_at);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let repo = MemoryRepository::new();
        let id = repo.upsert(&instance(1, 1)).await.unwrap();

        let first = repo.find_by_id(&id).await.unwrap();
        let second = first.clone();

        repo.upsert(&first).await.unwrap();
        let err = repo.upsert(&second).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Conflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_find_by_missing_id() {
        let repo = MemoryRepository::new();
        let id = InstanceId::new();
        assert!(matches!(
            repo.find_by_id(&id).await,
            Err(RepositoryError::NotFound(found)) if found == id
        ));
    }

    #[tokio::test]
    async fn test_find_one_applies_filter() {
        let repo = MemoryRepository::new();
        repo.upsert(&instance(1, 1)).await.unwrap();
        let mut closed = instance(2, 1);
        closed.status = Status::Closed;
        repo.upsert(&closed).await.unwrap();

        let hit = repo
            .find_one(&InstanceFilter::in_progress("leave", DataId::from(1), 1))
            .await
            .unwrap();
        assert!(hit.is_some());

        let miss = repo
            .find_one(&InstanceFilter::in_progress("leave", DataId::from(2), 1))
            .await
            .unwrap();
        assert!(miss.is_none());

        let stranger = repo
            .find_one(&InstanceFilter::in_progress("leave", DataId::from(1), 99))
            .await
            .unwrap();
        assert!(stranger.is_none());
    }

    #[tokio::test]
    async fn test_find_one_breaks_timestamp_ties_by_id() {
        let repo = MemoryRepository::new();
        let a = repo.upsert(&instance(1, 1)).await.unwrap();
        let b = repo.upsert(&instance(1, 1)).await.unwrap();

        {
            let mut rows = repo.rows.write().await;
            let stamp = rows[&a].created_at;
            for row in rows.values_mut() {
                row.created_at = stamp;
            }
        }

        let filter = InstanceFilter::in_progress("leave", DataId::from(1), 1);
        for _ in 0..5 {
            let hit = repo.find_one(&filter).await.unwrap().unwrap();
            assert_eq!(hit.id, Some(a.min(b)));
        }
    }
}
