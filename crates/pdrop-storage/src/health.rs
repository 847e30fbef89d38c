//! Storage reachability check

use opendal::ErrorKind;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::store::BundleStore;

impl BundleStore {
    /// Verify the backend answers a listing of the drop prefix.
    ///
    /// An absent prefix counts as healthy: nothing has been uploaded yet.
    pub async fn check_health(&self) -> StorageResult<()> {
        let dir = self.path_for("");
        match self.operator().list(&dir).await {
            Ok(entries) => {
                debug!(prefix = %dir, entries = entries.len(), "storage reachable");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Read(format!("health check on {dir}: {e}"))),
        }
    }
}

/// Returns true if storage is reachable, false otherwise
pub async fn is_healthy(store: &BundleStore) -> bool {
    store.check_health().await.is_ok()
}
