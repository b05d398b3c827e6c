//! Credential check: who am I, and can I see the bucket?

use crate::classify::classify_sdk_error;
use crate::config::CredentialCheckConfig;
use crate::error::ProbeResult;
use async_trait::async_trait;
use aws_config::SdkConfig;
use serde::Serialize;
use tracing::info;

/// Caller identity as reported by STS
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CallerIdentity {
    pub account: Option<String>,
    pub arn: Option<String>,
    pub user_id: Option<String>,
}

/// The two calls the credential check makes
#[async_trait]
pub trait IdentityProbe: Send + Sync {
    /// STS `GetCallerIdentity`
    async fn caller_identity(&self) -> ProbeResult<CallerIdentity>;

    /// S3 `HeadBucket`
    async fn head_bucket(&self, bucket: &str) -> ProbeResult<()>;
}

/// STS + S3 clients built from one SDK config
#[derive(Debug, Clone)]
pub struct AwsIdentityProbe {
    sts: aws_sdk_sts::Client,
    s3: aws_sdk_s3::Client,
}

impl AwsIdentityProbe {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            sts: aws_sdk_sts::Client::new(sdk_config),
            s3: aws_sdk_s3::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl IdentityProbe for AwsIdentityProbe {
    async fn caller_identity(&self) -> ProbeResult<CallerIdentity> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e).context("STS GetCallerIdentity failed"))?;
        Ok(CallerIdentity {
            account: output.account().map(str::to_string),
            arn: output.arn().map(str::to_string),
            user_id: output.user_id().map(str::to_string),
        })
    }

    async fn head_bucket(&self, bucket: &str) -> ProbeResult<()> {
        self.s3
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                classify_sdk_error(&e).context(&format!("S3 HeadBucket failed for '{bucket}'"))
            })?;
        Ok(())
    }
}

/// Outcome of a successful credential check
#[derive(Debug, Clone, Serialize)]
pub struct CredentialReport {
    pub account: Option<String>,
    pub arn: Option<String>,
    pub user_id: Option<String>,
    pub bucket: String,
    pub region: String,
}

/// STS first, then HeadBucket; the first failure aborts.
pub async fn run_credential_check(
    probe: &dyn IdentityProbe,
    config: &CredentialCheckConfig,
    region: &str,
) -> ProbeResult<CredentialReport> {
    config.validate_all()?;

    let identity = probe.caller_identity().await?;
    info!(
        account = ?identity.account,
        arn = ?identity.arn,
        user_id = ?identity.user_id,
        "STS OK"
    );

    probe.head_bucket(&config.bucket).await?;
    info!(bucket = %config.bucket, region, "S3 OK");

    Ok(CredentialReport {
        account: identity.account,
        arn: identity.arn,
        user_id: identity.user_id,
        bucket: config.bucket.clone(),
        region: region.to_string(),
    })
}
