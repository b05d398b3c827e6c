//! # s3v-probe — Amazon S3 Vectors smoke tests
//!
//! Runs small end-to-end checks against a real S3 Vectors deployment:
//!
//! | Run | Entry point | What it does |
//! |:----|:------------|:-------------|
//! | credential check | [`run_credential_check`] | STS `GetCallerIdentity`, then S3 `HeadBucket` |
//! | smoke | [`run_smoke`] | provision, insert two vectors, query, threshold + filter check, optional cleanup |
//! | hybrid | [`run_hybrid`] | insert labelled vectors, query with a compound metadata filter, always clean up |
//!
//! Runs talk to the service through the [`VectorStore`] trait;
//! [`S3VectorsStore`] is the AWS SDK implementation. Query results are
//! post-processed with [`s3v_filter`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use s3v_probe::{load_sdk_config, run_smoke, IndexConfig, S3VectorsStore, SmokeConfig};
//!
//! # async fn example() -> Result<(), s3v_probe::ProbeError> {
//! let mut config = SmokeConfig::new(IndexConfig::new("my-vectors", "smoke-index"));
//! config.filter_kind = Some("smoke".into());
//! config.min_similarity = Some(0.1);
//! config.cleanup = true;
//!
//! let sdk_config = load_sdk_config(&config.aws).await;
//! let store = S3VectorsStore::new(&sdk_config).with_retry((&config.aws).into());
//! let report = run_smoke(&store, &config).await?;
//! println!("kept {} of {} hits", report.results.len(), report.returned);
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every SDK failure is classified into a [`ProbeError`] variant
//! (`NotFound`, `Conflict`, `Auth`, `RateLimited`, ...). Provisioning relies
//! on this: `NotFound` on lookup triggers a create, `Conflict` on create
//! counts as success. Transient failures (`RateLimited`, `Timeout`,
//! `Connection`) are retried with exponential backoff, see [`RetryPolicy`].
//!
//! ## Metrics
//!
//! Runs record `s3v.*` counters through the `metrics` facade. They are
//! discarded unless the embedding process installs a recorder; the `s3v`
//! binary does so with `--metrics`.

pub mod aws;
pub mod classify;
pub mod config;
pub mod document;
pub mod error;
pub mod hybrid;
pub mod identity;
pub mod provision;
pub mod query_filter;
pub mod retry;
pub mod s3vectors;
pub mod sample;
pub mod smoke;
pub mod store;

#[cfg(test)]
mod testing;

pub use aws::{load_sdk_config, region_name};
pub use config::{
    AwsConfig, CredentialCheckConfig, HybridConfig, IndexConfig, SmokeConfig, VectorDataType,
};
pub use error::{ProbeError, ProbeResult};
pub use hybrid::{run_hybrid, HybridReport};
pub use identity::{
    run_credential_check, AwsIdentityProbe, CallerIdentity, CredentialReport, IdentityProbe,
};
pub use provision::{create_index_if_absent, ensure_index, ensure_vector_bucket, Provisioned};
pub use query_filter::QueryFilter;
pub use retry::RetryPolicy;
pub use s3vectors::S3VectorsStore;
pub use smoke::{run_smoke, SmokeReport};
pub use store::{QueryRequest, VectorRecord, VectorStore};
