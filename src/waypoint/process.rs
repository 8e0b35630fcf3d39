// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::kit::AssignmentResolver;

/// A named process callable: arguments in, result value out
pub type ProcessFn =
    Arc<dyn Fn(&[Value]) -> Result<Value, Box<dyn Error + Send + Sync>> + Send + Sync>;

/// Table of named processes, usable as the engine's assignment resolver
#[derive(Clone)]
pub struct ProcessRegistry {
    processes: Arc<RwLock<HashMap<String, ProcessFn>>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            processes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registry preloaded with `fixed`, which returns its first argument
    pub fn with_builtins() -> Self {
        let mut processes: HashMap<String, ProcessFn> = HashMap::new();
        processes.insert("fixed".to_string(), Arc::new(fixed));
        Self {
            processes: Arc::new(RwLock::new(processes)),
        }
    }

    pub async fn register<F>(&self, name: impl Into<String>, process: F)
    where
        F: Fn(&[Value]) -> Result<Value, Box<dyn Error + Send + Sync>> + Send + Sync + 'static,
    {
        let mut processes = self.processes.write().await;
        processes.insert(name.into(), Arc::new(process));
    }

    pub async fn get(&self, name: &str) -> Option<ProcessFn> {
        let processes = self.processes.read().await;
        processes.get(name).cloned()
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn fixed(args: &[Value]) -> Result<Value, Box<dyn Error + Send + Sync>> {
    args.first()
        .cloned()
        .ok_or_else(|| "process 'fixed' expects one argument".into())
}

#[async_trait]
impl AssignmentResolver for ProcessRegistry {
    async fn resolve(
        &self,
        process: &str,
        args: &[Value],
    ) -> Result<Value, Box<dyn Error + Send + Sync>> {
        let handler = self
            .get(process)
            .await
            .ok_or_else(|| format!("process '{}' is not registered", process))?;
        handler(args)
    }
}
