//! Transfer engine: upload and download of passphrase-addressed drops
//!
//! - `upload_files`: fresh secret → derive (key, id) → seal envelopes →
//!   write one bundle under id → return the passphrase
//! - `download_files`: decode passphrase → derive (key, id) → read bundle →
//!   open every envelope, all-or-nothing
//!
//! Secret and key material live only on the stack of one call and are
//! zeroized on drop, so a cancelled future leaves nothing behind.

use pdrop_core::File;
use pdrop_crypto::{decode, derive_keys, encode, DerivedKeys, DropBundle, KdfParams, Passphrase, Secret};
use pdrop_storage::BundleStore;
use tracing::{debug, info, warn};

use crate::error::{TransferError, TransferResult};

/// Progress callback type (steps_done, steps_total, message)
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

const STEPS: u64 = 3;

fn report(progress: Option<&ProgressFn>, done: u64, msg: &str) {
    if let Some(cb) = progress {
        cb(done, STEPS, msg);
    }
}

/// Encrypt `files` and store them under a freshly generated secret.
///
/// Returns the 24-word passphrase; it is the only way back to the files and
/// is not kept anywhere. Fails with `EmptyInput` before touching storage if
/// `files` is empty.
pub async fn upload_files(
    store: &BundleStore,
    params: &KdfParams,
    files: &[File],
    progress: Option<&ProgressFn>,
) -> TransferResult<Passphrase> {
    if files.is_empty() {
        return Err(TransferError::EmptyInput);
    }

    let secret = Secret::generate();

    report(progress, 0, "deriving keys");
    let DerivedKeys { key, id } =
        derive_keys(&secret, params).map_err(TransferError::KeyDerivation)?;

    report(progress, 1, "encrypting");
    let bundle = DropBundle::seal(&key, files).map_err(TransferError::EncryptionFailed)?;
    let payload = bundle.to_bytes().map_err(TransferError::EncryptionFailed)?;
    let payload_size = payload.len();

    report(progress, 2, "uploading");
    store.put(id.as_str(), payload).await.map_err(|e| {
        warn!(id = %id.short(), error = %e, "upload failed");
        TransferError::from(e)
    })?;

    report(progress, STEPS, "done");
    info!(
        id = %id.short(),
        files = files.len(),
        bytes = payload_size,
        "uploaded"
    );

    Ok(encode(&secret))
}

/// Fetch and decrypt the files stored for `passphrase`, in upload order.
///
/// An incomplete or malformed passphrase fails with `InvalidPassphrase`
/// before any storage access. `NotFound` and `DecryptionFailed` both mean
/// "nothing for this passphrase" to the caller.
pub async fn download_files(
    store: &BundleStore,
    params: &KdfParams,
    passphrase: &Passphrase,
    progress: Option<&ProgressFn>,
) -> TransferResult<Vec<File>> {
    let secret = decode(passphrase).map_err(TransferError::InvalidPassphrase)?;

    report(progress, 0, "deriving keys");
    let DerivedKeys { key, id } =
        derive_keys(&secret, params).map_err(TransferError::KeyDerivation)?;
    drop(secret);

    report(progress, 1, "downloading");
    let payload = store.get(id.as_str()).await.map_err(|e| {
        debug!(id = %id.short(), error = %e, "download failed");
        TransferError::from(e)
    })?;

    report(progress, 2, "decrypting");
    let files = DropBundle::from_bytes(&payload)
        .and_then(|bundle| bundle.open(&key))
        .map_err(|e| {
            debug!(id = %id.short(), error = %e, "bundle rejected");
            TransferError::DecryptionFailed(e)
        })?;

    report(progress, STEPS, "done");
    info!(
        id = %id.short(),
        files = files.len(),
        bytes = payload.len(),
        "downloaded"
    );

    Ok(files)
}

/// Lifecycle of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// A store plus KDF settings, tracking the state of the last operation.
#[derive(Debug)]
pub struct Transfer {
    store: BundleStore,
    params: KdfParams,
    state: OperationState,
}

impl Transfer {
    pub fn new(store: BundleStore, params: KdfParams) -> Self {
        Self {
            store,
            params,
            state: OperationState::Idle,
        }
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    pub async fn upload(
        &mut self,
        files: &[File],
        progress: Option<&ProgressFn>,
    ) -> TransferResult<Passphrase> {
        self.state = OperationState::Running;
        let result = upload_files(&self.store, &self.params, files, progress).await;
        self.finish(result)
    }

    pub async fn download(
        &mut self,
        passphrase: &Passphrase,
        progress: Option<&ProgressFn>,
    ) -> TransferResult<Vec<File>> {
        self.state = OperationState::Running;
        let result = download_files(&self.store, &self.params, passphrase, progress).await;
        self.finish(result)
    }

    fn finish<T>(&mut self, result: TransferResult<T>) -> TransferResult<T> {
        self.state = if result.is_ok() {
            OperationState::Succeeded
        } else {
            OperationState::Failed
        };
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn memory_store() -> BundleStore {
        let op = opendal::Operator::new(opendal::services::Memory::default())
            .expect("memory operator")
            .finish();
        BundleStore::new(op, "drops")
    }

    fn fast_params() -> KdfParams {
        KdfParams {
            mem_cost_kib: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    #[tokio::test]
    async fn test_progress_reports_all_steps() {
        let store = memory_store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: ProgressFn = Box::new(move |done, total, msg| {
            sink.lock().unwrap().push((done, total, msg.to_string()));
        });

        let files = vec![File::new("a.txt", "text/plain", b"hello".to_vec())];
        upload_files(&store, &fast_params(), &files, Some(&progress))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first().map(|s| s.0), Some(0));
        assert_eq!(seen.last().map(|s| (s.0, s.2.as_str())), Some((STEPS, "done")));
        assert!(seen.iter().all(|s| s.1 == STEPS));
    }

    #[tokio::test]
    async fn test_transfer_state_machine() {
        let mut transfer = Transfer::new(memory_store(), fast_params());
        assert_eq!(transfer.state(), OperationState::Idle);

        let err = transfer.upload(&[], None).await.unwrap_err();
        assert!(matches!(err, TransferError::EmptyInput));
        assert_eq!(transfer.state(), OperationState::Failed);

        let files = vec![File::new("a.txt", "text/plain", b"hello".to_vec())];
        let passphrase = transfer.upload(&files, None).await.unwrap();
        assert_eq!(transfer.state(), OperationState::Succeeded);

        let downloaded = transfer.download(&passphrase, None).await.unwrap();
        assert_eq!(downloaded, files);
        assert_eq!(transfer.state(), OperationState::Succeeded);
    }

    #[tokio::test]
    async fn test_garbage_payload_is_decryption_failure() {
        let store = memory_store();
        let params = fast_params();
        let secret = Secret::generate();
        let keys = derive_keys(&secret, &params).unwrap();
        store.put(keys.id.as_str(), b"not a bundle".to_vec()).await.unwrap();

        let err = download_files(&store, &params, &encode(&secret), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::DecryptionFailed(_)));
        assert!(err.is_wrong_passphrase());
    }
}
