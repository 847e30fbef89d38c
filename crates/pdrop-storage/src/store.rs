//! Bundle store: one object per drop, addressed by its storage id
//!
//! Each drop is written as a single object at `{prefix}/{id}`. A single PUT
//! is all-or-nothing on S3-compatible backends, so readers see either the
//! complete bundle or nothing.

use opendal::{ErrorKind, Operator};
use tracing::debug;

use crate::error::{StorageError, StorageResult};

#[derive(Debug, Clone)]
pub struct BundleStore {
    op: Operator,
    prefix: String,
}

impl BundleStore {
    pub fn new(op: Operator, prefix: &str) -> Self {
        Self {
            op,
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    /// Object path for a storage id
    pub fn path_for(&self, id: &str) -> String {
        if self.prefix.is_empty() {
            id.to_string()
        } else {
            format!("{}/{id}", self.prefix)
        }
    }

    /// Write `payload` under `id`, replacing anything already there.
    pub async fn put(&self, id: &str, payload: Vec<u8>) -> StorageResult<()> {
        let path = self.path_for(id);
        let size = payload.len();
        self.op
            .write(&path, payload)
            .await
            .map_err(|e| StorageError::Write(format!("{path}: {e}")))?;
        debug!(path = %path, bytes = size, "bundle written");
        Ok(())
    }

    /// Read the payload stored under `id`.
    pub async fn get(&self, id: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(id);
        match self.op.read(&path).await {
            Ok(buf) => {
                let bytes = buf.to_vec();
                debug!(path = %path, bytes = bytes.len(), "bundle read");
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(path)),
            Err(e) => Err(StorageError::Read(format!("{path}: {e}"))),
        }
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }
}
