// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::loader::{DocumentFormat, WorkflowLoader};
use super::types::WorkflowDefinition;
use crate::kit::{EngineError, WorkflowError};

/// Name -> definition registry shared by every engine that resolves against it.
///
/// Entries are immutable snapshots: `reload` swaps the `Arc` under the write
/// lock, so a resolution that already holds the old snapshot finishes on it
/// while later selections see the new graph.
#[derive(Clone, Default)]
pub struct DefinitionStore {
    definitions: Arc<RwLock<HashMap<String, Arc<WorkflowDefinition>>>>,
    loader: WorkflowLoader,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every document under `dir`, registering each under
    /// `prefix + relative name`. Stops at the first document that fails.
    pub async fn load_dir<P: AsRef<Path>>(
        &self,
        dir: P,
        prefix: &str,
    ) -> Result<usize, EngineError> {
        let entries = self.loader.scan(dir, prefix)?;
        for entry in &entries {
            let def = self.loader.load_file(entry)?;
            log::info!(
                "Loaded workflow '{}' ({} nodes) from {}",
                def.name,
                def.len(),
                entry.path.display()
            );
            self.register(def).await;
        }
        Ok(entries.len())
    }

    /// Parse `source` and register it under `name`
    pub async fn load_source(
        &self,
        name: &str,
        source: impl Into<String>,
        format: DocumentFormat,
    ) -> Result<Arc<WorkflowDefinition>, WorkflowError> {
        let def = WorkflowLoader::parse(name, source.into(), format, None)?;
        Ok(self.register(def).await)
    }

    /// Register a definition, replacing any entry with the same name
    pub async fn register(&self, def: WorkflowDefinition) -> Arc<WorkflowDefinition> {
        let def = Arc::new(def);
        let mut definitions = self.definitions.write().await;
        definitions.insert(def.name.clone(), Arc::clone(&def));
        def
    }

    /// The current snapshot registered under `name`
    pub async fn select(&self, name: &str) -> Result<Arc<WorkflowDefinition>, WorkflowError> {
        let definitions = self.definitions.read().await;
        definitions
            .get(name)
            .cloned()
            .ok_or_else(|| WorkflowError::DefinitionNotFound(name.to_string()))
    }

    /// Re-parse the stored source of `name` and swap in the result
    pub async fn reload(&self, name: &str) -> Result<Arc<WorkflowDefinition>, WorkflowError> {
        let current = self.select(name).await?;
        let fresh = Arc::new(WorkflowLoader::reparse(&current)?);

        let mut definitions = self.definitions.write().await;
        definitions.insert(name.to_string(), Arc::clone(&fresh));
        log::info!("Reloaded workflow '{}'", name);
        Ok(fresh)
    }

    /// Registered names, sorted
    pub async fn names(&self) -> Vec<String> {
        let definitions = self.definitions.read().await;
        let mut names: Vec<String> = definitions.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use serde_json::json;

    static LINEAR: Lazy<String> = Lazy::new(|| {
        json!({
            "nodes": [
                {"name": "a"},
                {"name": "b", "next": [{"conditions": [{"left": "$out.ok", "op": "==", "right": true}], "goto": "c"}]},
                {"name": "c"}
            ]
        })
        .to_string()
    });

    #[tokio::test]
    async fn test_select_registered_definition() {
        let store = DefinitionStore::new();
        store
            .load_source("linear", LINEAR.as_str(), DocumentFormat::Json)
            .await
            .unwrap();

        let def = store.select("linear").await.unwrap();
        assert_eq!(def.name, "linear");
        assert_eq!(def.len(), 3);
    }

    #[tokio::test]
    async fn test_select_missing_definition() {
        let store = DefinitionStore::new();
        let err = store.select("nope").await.unwrap_err();
        assert!(matches!(err, WorkflowError::DefinitionNotFound(ref name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_register_overwrites_existing() {
        let store = DefinitionStore::new();
        store
            .load_source("flow", LINEAR.as_str(), DocumentFormat::Json)
            .await
            .unwrap();
        store
            .load_source("flow", r#"{"nodes": [{"name": "only"}]}"#, DocumentFormat::Json)
            .await
            .unwrap();

        let def = store.select("flow").await.unwrap();
        assert_eq!(def.len(), 1);
        assert_eq!(store.names().await, vec!["flow".to_string()]);
    }

    #[tokio::test]
    async fn test_reload_replaces_snapshot_and_keeps_graph() {
        let store = DefinitionStore::new();
        let original = store
            .load_source("linear", LINEAR.as_str(), DocumentFormat::Json)
            .await
            .unwrap();

        let reloaded = store.reload("linear").await.unwrap();
        assert!(!Arc::ptr_eq(&original, &reloaded));
        assert_eq!(reloaded.nodes, original.nodes);

        // The held snapshot is untouched; new selections see the new one.
        let selected = store.select("linear").await.unwrap();
        assert!(Arc::ptr_eq(&selected, &reloaded));
        assert_eq!(original.len(), 3);
    }

    #[tokio::test]
    async fn test_reload_yaml_source() {
        let store = DefinitionStore::new();
        let original = store
            .load_source("yaml", "nodes:\n  - name: a\n  - name: b\n", DocumentFormat::Yaml)
            .await
            .unwrap();

        let reloaded = store.reload("yaml").await.unwrap();
        assert_eq!(reloaded.format, DocumentFormat::Yaml);
        assert_eq!(reloaded.nodes, original.nodes);
        assert_eq!(reloaded.len(), 2);
    }

    #[tokio::test]
    async fn test_reload_missing_definition() {
        let store = DefinitionStore::new();
        assert!(store.reload("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_store_is_clone() {
        let store = DefinitionStore::new();
        let cloned = store.clone();
        cloned
            .load_source("shared", LINEAR.as_str(), DocumentFormat::Json)
            .await
            .unwrap();
        assert!(store.select("shared").await.is_ok());
    }

    #[tokio::test]
    async fn test_load_dir_fails_fast_on_bad_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_good.json"), LINEAR.as_str()).unwrap();
        std::fs::write(dir.path().join("b_bad.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("c_later.json"), LINEAR.as_str()).unwrap();

        let store = DefinitionStore::new();
        let err = store.load_dir(dir.path(), "").await.unwrap_err();
        match err {
            EngineError::Workflow(WorkflowError::DefinitionParse { name, content, .. }) => {
                assert_eq!(name, "b_bad");
                assert_eq!(content, "{ not json");
            }
            other => panic!("Expected DefinitionParse, got {:?}", other),
        }

        assert!(store.select("a_good").await.is_ok());
        assert!(store.select("c_later").await.is_err());
    }

    #[tokio::test]
    async fn test_load_dir_counts_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("hr")).unwrap();
        std::fs::write(dir.path().join("hr/leave.json"), LINEAR.as_str()).unwrap();
        std::fs::write(dir.path().join("expense.yaml"), "nodes:\n  - name: only\n").unwrap();

        let store = DefinitionStore::new();
        let count = store.load_dir(dir.path(), "x.").await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            store.names().await,
            vec!["x.expense".to_string(), "x.hr.leave".to_string()]
        );
    }
}
