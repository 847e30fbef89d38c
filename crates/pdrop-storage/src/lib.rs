//! pdrop-storage: OpenDAL storage abstraction for drop bundles

pub mod error;
pub mod health;
pub mod operator;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use health::is_healthy;
pub use operator::{build_from_core_config, build_s3_operator, S3Config};
pub use store::BundleStore;
