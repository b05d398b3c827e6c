//! s3v - Amazon S3 Vectors smoke tests
//!
//! Every option can also be set through its `S3V_*` environment variable.
//! AWS credentials and region come from the standard SDK chain.
//! With `--metrics`, the run's counters are printed to stderr in
//! Prometheus text format on exit.

use anyhow::Context;
use aws_config::SdkConfig;
use clap::{ArgAction, Args, Parser, Subcommand};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use s3v_filter::DistanceMetric;
use s3v_probe::config::parse_flag;
use s3v_probe::{
    load_sdk_config, region_name, run_credential_check, run_hybrid, run_smoke, AwsConfig,
    AwsIdentityProbe, CredentialCheckConfig, HybridConfig, IndexConfig, RetryPolicy,
    S3VectorsStore, SmokeConfig, VectorDataType,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "s3v")]
#[command(about = "Smoke tests for Amazon S3 Vectors")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print counters in Prometheus text format to stderr on exit
    #[arg(
        long,
        global = true,
        env = "S3V_METRICS",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = flag
    )]
    metrics: bool,

    #[command(flatten)]
    aws: AwsArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify credentials (STS) and access to a plain S3 bucket
    Check {
        /// S3 bucket probed with HeadBucket
        #[arg(long, env = "S3V_BUCKET")]
        bucket: String,
    },

    /// Insert two vectors, query them back and check the results
    Smoke(SmokeArgs),

    /// Vector search combined with a compound metadata filter
    Hybrid(HybridArgs),
}

#[derive(Args)]
struct AwsArgs {
    /// AWS region (defaults to the SDK chain, then us-east-1)
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Custom endpoint URL
    #[arg(long, global = true, env = "S3V_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Per-operation timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    timeout_secs: u64,

    /// Retries per call on throttling, timeouts and connection errors
    #[arg(long, global = true, env = "S3V_MAX_RETRIES", default_value = "3")]
    max_retries: u32,
}

impl From<AwsArgs> for AwsConfig {
    fn from(args: AwsArgs) -> Self {
        Self {
            region: args.region,
            endpoint_url: args.endpoint_url,
            timeout_secs: args.timeout_secs,
            max_retries: args.max_retries,
            ..AwsConfig::default()
        }
    }
}

#[derive(Args)]
struct IndexArgs {
    /// Vector bucket name
    #[arg(long, env = "S3V_BUCKET")]
    bucket: String,

    /// Vector index name
    #[arg(long, env = "S3V_INDEX")]
    index: String,

    /// Vector dimension used when the index is created
    #[arg(long, env = "S3V_DIMENSION", default_value = "1536")]
    dimension: i32,

    /// Distance metric used when the index is created
    #[arg(long, env = "S3V_METRIC", default_value = "cosine", value_parser = metric)]
    metric: DistanceMetric,

    /// Vector data type
    #[arg(long, env = "S3V_DATA_TYPE", default_value = "float32")]
    data_type: VectorDataType,

    /// Index type label reported with the run
    #[arg(long, env = "S3V_INDEX_TYPE", default_value = "flat")]
    index_type: String,

    /// Seed for the random vectors (defaults to the clock)
    #[arg(long, env = "S3V_SEED")]
    seed: Option<u64>,
}

impl From<IndexArgs> for IndexConfig {
    fn from(args: IndexArgs) -> Self {
        let mut index = IndexConfig::new(args.bucket, args.index);
        index.dimension = args.dimension;
        index.distance_metric = args.metric;
        index.data_type = args.data_type;
        index.index_type = args.index_type;
        index
    }
}

#[derive(Args)]
struct SmokeArgs {
    #[command(flatten)]
    index: IndexArgs,

    /// Number of nearest neighbors to return
    #[arg(short, long = "top-k", env = "S3V_K", default_value = "5")]
    k: i32,

    /// Expected `kind` metadata value (server filter and local check)
    #[arg(long, env = "S3V_FILTER_KIND")]
    filter_kind: Option<String>,

    /// Raw JSON filter sent with the query (overrides --filter-kind server side)
    #[arg(long, env = "S3V_FILTER_JSON")]
    filter_json: Option<String>,

    /// Delete the inserted vectors afterwards (1/true/yes)
    #[arg(
        long,
        env = "S3V_CLEANUP",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = flag
    )]
    cleanup: bool,

    /// Drop hits whose cosine similarity is below this value
    #[arg(long, env = "S3V_MIN_SIMILARITY")]
    min_similarity: Option<f32>,
}

#[derive(Args)]
struct HybridArgs {
    #[command(flatten)]
    index: IndexArgs,

    /// Number of nearest neighbors to return
    #[arg(short, long = "top-k", env = "S3V_K", default_value = "20")]
    k: i32,
}

fn flag(value: &str) -> Result<bool, String> {
    Ok(parse_flag(value))
}

/// `--metric` is case-insensitive; result metrics are not.
fn metric(value: &str) -> Result<DistanceMetric, String> {
    Ok(DistanceMetric::from(value.trim().to_ascii_lowercase()))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn metrics_builder() -> PrometheusBuilder {
    PrometheusBuilder::new()
}

fn init_metrics(enabled: bool) -> anyhow::Result<Option<PrometheusHandle>> {
    if !enabled {
        return Ok(None);
    }
    let handle = metrics_builder()
        .install_recorder()
        .context("Failed to install metrics recorder")?;
    Ok(Some(handle))
}

fn print_json<T: Serialize>(report: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let metrics = init_metrics(cli.metrics)?;

    let aws = AwsConfig::from(cli.aws);
    let sdk_config = load_sdk_config(&aws).await;
    let region = region_name(&sdk_config);
    debug!(region = %region, "Resolved region");

    let result = run(cli.command, aws, &sdk_config, &region).await;

    if let Some(handle) = metrics {
        eprint!("{}", handle.render());
    }
    result
}

async fn run(
    command: Commands,
    aws: AwsConfig,
    sdk_config: &SdkConfig,
    region: &str,
) -> anyhow::Result<()> {
    match command {
        Commands::Check { bucket } => {
            let mut config = CredentialCheckConfig::new(bucket);
            config.aws = aws;
            let probe = AwsIdentityProbe::new(sdk_config);
            let report = run_credential_check(&probe, &config, region).await?;

            println!("STS OK");
            println!("Account: {}", report.account.as_deref().unwrap_or("-"));
            println!("Arn: {}", report.arn.as_deref().unwrap_or("-"));
            println!("UserId: {}", report.user_id.as_deref().unwrap_or("-"));
            println!("S3 OK");
            println!("Bucket: {}", report.bucket);
            println!("Region: {}", report.region);
        }

        Commands::Smoke(args) => {
            let seed = args.index.seed;
            let mut config = SmokeConfig::new(args.index.into());
            config.aws = aws;
            config.top_k = args.k;
            config.filter_kind = args.filter_kind;
            config.filter_json = args.filter_json;
            config.cleanup = args.cleanup;
            config.min_similarity = args.min_similarity;
            config.seed = seed;

            let store = S3VectorsStore::new(sdk_config).with_retry(RetryPolicy::from(&config.aws));
            let report = run_smoke(&store, &config)
                .await
                .context("smoke run failed")?;
            print_json(&report)?;
        }

        Commands::Hybrid(args) => {
            let seed = args.index.seed;
            let mut config = HybridConfig::new(args.index.into());
            config.aws = aws;
            config.top_k = args.k;
            config.seed = seed;

            let store = S3VectorsStore::new(sdk_config).with_retry(RetryPolicy::from(&config.aws));
            let report = run_hybrid(&store, &config)
                .await
                .context("hybrid run failed")?;
            print_json(&report)?;
        }
    }

    Ok(())
}
