use async_trait::async_trait;
use serde_json::Value;
use std::error::Error;

/// Maps a node's assignment spec to the user responsible for it.
///
/// Implementations return whatever the underlying process produced; the
/// engine coerces the result to a user id and reports anything else as an
/// assignment error.
#[async_trait]
pub trait AssignmentResolver: Send + Sync {
    /// Run the named process with the node's assignment arguments
    async fn resolve(
        &self,
        process: &str,
        args: &[Value],
    ) -> Result<Value, Box<dyn Error + Send + Sync>>;
}
