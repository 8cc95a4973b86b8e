use std::time::Duration;

use clap::Parser;
use edge_cleanup_aws::adapters::cloudfront::{
    DistributionGateway, DistributionReadback, DistributionSummaryRecord, DistributionUpdateError,
};
use edge_cleanup_aws::adapters::lambda::{
    DeletePacer, DeleteVersionOutcome, FunctionGateway, VersionListing,
};
use edge_cleanup_aws::handlers::orchestrate::run_cleanup;
use edge_cleanup_core::context::DeploymentContext;
use edge_cleanup_core::contract::{
    normalize_request, split_function_list, CleanupReport, CleanupRequest,
    DEFAULT_DELETE_PAUSE_MS,
};

#[derive(Parser)]
#[command(
    name = "edge-cleanup",
    about = "Detach edge function associations and reap prior function versions",
    long_about = "Removes every edge function association from the deployment's\n\
                  distribution, then deletes all prior (numeric) versions of the\n\
                  configured functions. The function definitions themselves are\n\
                  left in place until replica propagation completes."
)]
struct Cli {
    /// Path to the deployment context JSON document
    #[arg(long, env = "EDGE_CLEANUP_CONTEXT")]
    context: Option<String>,
    /// Landscape tag identifying the distribution (overrides the context)
    #[arg(long)]
    landscape: Option<String>,
    /// Comma-separated function names (overrides the context)
    #[arg(long)]
    functions: Option<String>,
    /// Log intended mutations without issuing them
    #[arg(long)]
    dry_run: bool,
    /// Pause after each version deletion call, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DELETE_PAUSE_MS)]
    pause_ms: u64,
    /// AWS region override (falls back to the context, then the environment)
    #[arg(long)]
    region: Option<String>,
}

struct AwsDistributionGateway {
    client: aws_sdk_cloudfront::Client,
}

impl DistributionGateway for AwsDistributionGateway {
    type Config = aws_sdk_cloudfront::types::DistributionConfig;

    fn list_distributions(&self) -> Result<Vec<DistributionSummaryRecord>, String> {
        let client = self.client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut records = Vec::new();
                let mut marker: Option<String> = None;
                loop {
                    let mut request = client.list_distributions();
                    if let Some(marker) = &marker {
                        request = request.marker(marker);
                    }
                    let output = request
                        .send()
                        .await
                        .map_err(|error| format!("failed to list distributions: {error}"))?;
                    let Some(list) = output.distribution_list else {
                        break;
                    };
                    for summary in list.items() {
                        records.push(DistributionSummaryRecord {
                            id: summary.id.clone(),
                            comment: summary.comment.clone(),
                        });
                    }
                    marker = if list.is_truncated {
                        list.next_marker.clone()
                    } else {
                        None
                    };
                    if marker.is_none() {
                        break;
                    }
                }
                Ok(records)
            })
        })
    }

    fn get_distribution(
        &self,
        id: &str,
    ) -> Result<DistributionReadback<Self::Config>, String> {
        let client = self.client.clone();
        let id = id.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_distribution()
                    .id(&id)
                    .send()
                    .await
                    .map_err(|error| format!("failed to read distribution {id}: {error}"))?;
                let etag = output.e_tag;
                let Some(distribution) = output.distribution else {
                    return Ok(DistributionReadback {
                        config: None,
                        etag,
                        has_default_cache_behavior: false,
                        edge_association_count: 0,
                    });
                };
                let Some(config) = distribution.distribution_config else {
                    return Ok(DistributionReadback {
                        config: None,
                        etag,
                        has_default_cache_behavior: false,
                        edge_association_count: 0,
                    });
                };
                let has_default_cache_behavior = config.default_cache_behavior.is_some();
                let edge_association_count = config
                    .default_cache_behavior
                    .as_ref()
                    .and_then(|behavior| behavior.lambda_function_associations.as_ref())
                    .map(|associations| associations.quantity.max(0) as usize)
                    .unwrap_or(0);
                Ok(DistributionReadback {
                    config: Some(config),
                    etag,
                    has_default_cache_behavior,
                    edge_association_count,
                })
            })
        })
    }

    fn update_without_associations(
        &self,
        id: &str,
        mut config: Self::Config,
        if_match: &str,
    ) -> Result<(), DistributionUpdateError> {
        let client = self.client.clone();
        let id = id.to_string();
        let if_match = if_match.to_string();

        // The update replaces the whole configuration, so a config with the
        // association list omitted is a config with no associations.
        if let Some(behavior) = config.default_cache_behavior.as_mut() {
            behavior.lambda_function_associations = None;
        }

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                match client
                    .update_distribution()
                    .id(&id)
                    .distribution_config(config)
                    .if_match(&if_match)
                    .send()
                    .await
                {
                    Ok(_) => Ok(()),
                    Err(error) => {
                        let service_error = error.into_service_error();
                        if service_error.is_precondition_failed()
                            || service_error.is_invalid_if_match_version()
                        {
                            Err(DistributionUpdateError::StaleToken(format!(
                                "stale concurrency token for distribution {id}: {service_error}"
                            )))
                        } else {
                            Err(DistributionUpdateError::Other(format!(
                                "failed to update distribution {id}: {service_error}"
                            )))
                        }
                    }
                }
            })
        })
    }
}

struct AwsFunctionGateway {
    client: aws_sdk_lambda::Client,
}

/// Sleeps a fixed interval after each live delete to stay under the
/// provider's request-rate ceiling.
struct FixedDelayPacer {
    delay: Duration,
}

impl DeletePacer for FixedDelayPacer {
    fn pause_after_delete(&self) {
        if self.delay.is_zero() {
            return;
        }
        let delay = self.delay;
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(tokio::time::sleep(delay))
        });
    }
}

impl FunctionGateway for AwsFunctionGateway {
    fn list_version_arns(&self, function_name: &str) -> Result<VersionListing, String> {
        let client = self.client.clone();
        let function_name = function_name.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut arns = Vec::new();
                let mut marker: Option<String> = None;
                loop {
                    let mut request = client
                        .list_versions_by_function()
                        .function_name(&function_name);
                    if let Some(marker) = &marker {
                        request = request.marker(marker);
                    }
                    let output = match request.send().await {
                        Ok(output) => output,
                        Err(error) => {
                            let service_error = error.into_service_error();
                            if service_error.is_resource_not_found_exception() {
                                return Ok(VersionListing::FunctionMissing);
                            }
                            return Err(format!(
                                "failed to list versions of {function_name}: {service_error}"
                            ));
                        }
                    };
                    for version in output.versions() {
                        if let Some(arn) = version.function_arn() {
                            arns.push(arn.to_string());
                        }
                    }
                    marker = output.next_marker().map(str::to_string);
                    if marker.is_none() {
                        break;
                    }
                }
                Ok(VersionListing::Versions(arns))
            })
        })
    }

    fn delete_version(
        &self,
        function_name: &str,
        qualifier: &str,
    ) -> Result<DeleteVersionOutcome, String> {
        let client = self.client.clone();
        let function_name = function_name.to_string();
        let qualifier = qualifier.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                match client
                    .delete_function()
                    .function_name(&function_name)
                    .qualifier(&qualifier)
                    .send()
                    .await
                {
                    Ok(_) => Ok(DeleteVersionOutcome::Deleted),
                    Err(error) => {
                        let service_error = error.into_service_error();
                        if service_error.is_resource_not_found_exception() {
                            Ok(DeleteVersionOutcome::AlreadyAbsent)
                        } else {
                            Err(format!(
                                "failed to delete {function_name}:{qualifier}: {service_error}"
                            ))
                        }
                    }
                }
            })
        })
    }
}

async fn run(cli: Cli) -> Result<CleanupReport, Box<dyn std::error::Error>> {
    let context = match &cli.context {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|error| format!("failed to read context file {path}: {error}"))?;
            Some(DeploymentContext::from_json(&text)?)
        }
        None => None,
    };

    let landscape = cli
        .landscape
        .clone()
        .or_else(|| context.as_ref().map(|c| c.landscape().to_string()))
        .ok_or("either --landscape or --context is required")?;

    // The app function carries the landscape in its name, so a --landscape
    // override has to rename it along with the distribution comment.
    let function_names = match &cli.functions {
        Some(list) => split_function_list(list),
        None => context
            .as_ref()
            .map(|context| context.function_names_for(&landscape))
            .ok_or("either --functions or --context is required")?,
    };

    let request = normalize_request(CleanupRequest {
        landscape,
        function_names,
        dry_run: cli.dry_run,
    })?;

    let region = cli
        .region
        .clone()
        .or_else(|| context.as_ref().map(|c| c.region.clone()));
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region));
    }
    let config = loader.load().await;

    let distributions = AwsDistributionGateway {
        client: aws_sdk_cloudfront::Client::new(&config),
    };
    let functions = AwsFunctionGateway {
        client: aws_sdk_lambda::Client::new(&config),
    };
    let pacer = FixedDelayPacer {
        delay: Duration::from_millis(cli.pause_ms),
    };

    run_cleanup(&distributions, &functions, &pacer, &request).map_err(Into::into)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(report) => println!("{}", report.render_summary()),
        Err(error) => {
            eprintln!("edge-cleanup failed: {error}");
            std::process::exit(1);
        }
    }
}
