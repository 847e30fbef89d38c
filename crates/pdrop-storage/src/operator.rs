//! OpenDAL Operator factory for pdrop storage backends

use anyhow::{Context, Result};
use opendal::Operator;
use pdrop_core::config::{StorageBackend, StorageConfig};

/// Minimal config needed to build an S3 operator
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Build an OpenDAL Operator for any S3-compatible endpoint
///
/// Path-style addressing (the opendal default) keeps MinIO and SeaweedFS
/// endpoints working.
pub fn build_s3_operator(cfg: &S3Config) -> Result<Operator> {
    let builder = opendal::services::S3::default()
        .endpoint(&cfg.endpoint)
        .region(&cfg.region)
        .bucket(&cfg.bucket)
        .access_key_id(&cfg.access_key_id)
        .secret_access_key(&cfg.secret_access_key);

    let op = Operator::new(builder)
        .context("creating OpenDAL S3 operator")?
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(5)
                .with_jitter(),
        )
        .finish();

    Ok(op)
}

/// Build an operator for the configured backend.
///
/// S3 needs `credentials` as `(access_key_id, secret_access_key)`. If
/// `enforce_tls` is set and the endpoint uses HTTP, this returns an error;
/// otherwise a warning is logged for non-HTTPS endpoints.
pub fn build_from_core_config(
    storage: &StorageConfig,
    credentials: Option<(&str, &str)>,
) -> Result<Operator> {
    match storage.backend {
        StorageBackend::S3 => {
            let (access_key_id, secret_access_key) =
                credentials.context("S3 backend requires access credentials")?;

            if storage.endpoint.starts_with("http://") {
                if storage.enforce_tls {
                    anyhow::bail!(
                        "S3 endpoint uses plaintext HTTP ({}), but enforce_tls is enabled. \
                         Use an HTTPS endpoint or set storage.enforce_tls = false for local development.",
                        storage.endpoint
                    );
                }
                tracing::warn!(
                    endpoint = %storage.endpoint,
                    "S3 endpoint uses plaintext HTTP, credentials are transmitted unencrypted"
                );
            }

            build_s3_operator(&S3Config {
                endpoint: storage.endpoint.clone(),
                region: storage.region.clone(),
                bucket: storage.bucket.clone(),
                access_key_id: access_key_id.to_string(),
                secret_access_key: secret_access_key.to_string(),
            })
        }
        StorageBackend::Fs => {
            let root = storage.root.to_string_lossy();
            let builder = opendal::services::Fs::default().root(&root);
            let op = Operator::new(builder)
                .with_context(|| format!("creating OpenDAL fs operator at {root}"))?
                .layer(opendal::layers::LoggingLayer::default())
                .finish();
            Ok(op)
        }
        StorageBackend::Memory => {
            tracing::warn!("memory storage backend: drops vanish when the process exits");
            let op = Operator::new(opendal::services::Memory::default())
                .context("creating OpenDAL memory operator")?
                .finish();
            Ok(op)
        }
    }
}
