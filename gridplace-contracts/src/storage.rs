//! Host-owned persistent storage.

use async_trait::async_trait;

use crate::CollaboratorError;

/// Persistent string key-value storage owned by the host.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `None` when the key was never set.
    async fn get(&self, key: &str) -> Result<Option<String>, CollaboratorError>;

    /// Insert or overwrite `key`.
    async fn set(
        &self,
        key: &str,
        value: String,
    ) -> Result<(), CollaboratorError>;
}
