//! End-to-end cleanup orchestration.
//!
//! Runs the detach phase to completion before any version deletion is
//! attempted, then reaps each configured function strictly sequentially.
//! Precondition and concurrency failures abort the run; everything else is
//! tolerated and reported.

use edge_cleanup_core::contract::{CleanupReport, NormalizedCleanupRequest};
use serde_json::json;

use crate::adapters::cloudfront::DistributionGateway;
use crate::adapters::lambda::{DeletePacer, FunctionGateway};
use crate::handlers::detach::{detach_distribution, DetachError};
use crate::handlers::reap::reap_prior_versions;

pub fn run_cleanup(
    distributions: &impl DistributionGateway,
    functions: &impl FunctionGateway,
    pacer: &impl DeletePacer,
    request: &NormalizedCleanupRequest,
) -> Result<CleanupReport, DetachError> {
    log_orchestrator_info(
        "cleanup_started",
        json!({
            "landscape": request.landscape.clone(),
            "function_names": request.function_names.clone(),
            "dry_run": request.dry_run,
        }),
    );

    let detach = detach_distribution(distributions, &request.landscape, request.dry_run)?;

    let mut summaries = Vec::with_capacity(request.function_names.len());
    for function_name in &request.function_names {
        summaries.push(reap_prior_versions(
            functions,
            pacer,
            function_name,
            request.dry_run,
        ));
    }

    let report = CleanupReport {
        dry_run: request.dry_run,
        detach,
        functions: summaries,
    };
    log_orchestrator_info(
        "cleanup_completed",
        json!({
            "dry_run": report.dry_run,
            "versions_deleted": report.deleted_total(),
            "versions_failed": report.failed_total(),
        }),
    );
    Ok(report)
}

fn log_orchestrator_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "cleanup_orchestrator",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
