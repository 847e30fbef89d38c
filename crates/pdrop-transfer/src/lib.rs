//! pdrop-transfer: the two public operations, `upload_files` and `download_files`

pub mod engine;
pub mod error;

pub use engine::{download_files, upload_files, OperationState, ProgressFn, Transfer};
pub use error::{TransferError, TransferResult};
pub use pdrop_crypto::{validate_password, Passphrase};
