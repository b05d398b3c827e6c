//! Shared AWS SDK configuration

use crate::config::{AwsConfig, DEFAULT_REGION};
use aws_config::meta::region::RegionProviderChain;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::time::Duration;
use tracing::debug;

/// Load the SDK configuration used by every client.
///
/// Region: explicit `region` → SDK default chain (env, profile, IMDS) →
/// `us-east-1`. Credentials come from the standard AWS credential chain.
pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    let region = match config.region {
        Some(ref region) => RegionProviderChain::first_try(Region::new(region.clone())),
        None => RegionProviderChain::default_provider(),
    }
    .or_else(Region::new(DEFAULT_REGION));

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(Duration::from_secs(config.timeout_secs))
                .build(),
        );

    if let Some(ref endpoint) = config.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    let sdk_config = loader.load().await;
    debug!(
        region = %region_name(&sdk_config),
        endpoint = ?config.endpoint_url,
        timeout_secs = config.timeout_secs,
        "AWS SDK config loaded"
    );
    sdk_config
}

/// Resolved region name, falling back to the default.
pub fn region_name(sdk_config: &SdkConfig) -> String {
    sdk_config
        .region()
        .map(|r| r.to_string())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}
