//! Distribution detach phase.
//!
//! Strips every edge-function association from the one distribution whose
//! comment matches the deployment, using the concurrency token obtained from
//! the immediately preceding read. Version deletion only becomes legal once
//! the provider has propagated this change to its edge locations, a
//! background process that outlives this run.

use edge_cleanup_core::contract::{distribution_comment, DetachOutcome};
use serde_json::json;

use crate::adapters::cloudfront::{DistributionGateway, DistributionUpdateError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetachError {
    /// The readback lacked a usable configuration or concurrency token;
    /// aborted before any mutation was attempted.
    Precondition(String),
    /// The provider rejected the update as stale; re-invocation obtains a
    /// fresh token.
    Conflict(String),
    /// Any other failed remote call.
    Api(String),
}

impl std::fmt::Display for DetachError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Precondition(message) => write!(f, "precondition failure: {message}"),
            Self::Conflict(message) => write!(f, "concurrency conflict: {message}"),
            Self::Api(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for DetachError {}

pub fn detach_distribution(
    gateway: &impl DistributionGateway,
    landscape: &str,
    dry_run: bool,
) -> Result<DetachOutcome, DetachError> {
    let comment = distribution_comment(landscape);
    log_detach_info("listing_distributions", json!({ "comment": comment.clone() }));

    let summaries = gateway.list_distributions().map_err(DetachError::Api)?;
    let Some(summary) = summaries
        .into_iter()
        .find(|summary| summary.comment == comment)
    else {
        log_detach_info(
            "distribution_already_deleted",
            json!({ "comment": comment }),
        );
        return Ok(DetachOutcome::AlreadyAbsent);
    };

    log_detach_info(
        "reading_distribution",
        json!({ "distribution_id": summary.id.clone() }),
    );
    let readback = gateway
        .get_distribution(&summary.id)
        .map_err(DetachError::Api)?;
    let associations = readback.edge_association_count;

    let config = readback.config.ok_or_else(|| {
        DetachError::Precondition(format!(
            "distribution {} readback carried no configuration",
            summary.id
        ))
    })?;
    if !readback.has_default_cache_behavior {
        return Err(DetachError::Precondition(format!(
            "distribution {} has no default cache behavior",
            summary.id
        )));
    }
    let etag = readback.etag.ok_or_else(|| {
        DetachError::Precondition(format!(
            "distribution {} readback carried no concurrency token",
            summary.id
        ))
    })?;

    if dry_run {
        log_detach_info(
            "detach_skipped_dry_run",
            json!({ "distribution_id": summary.id.clone(), "edge_associations": associations }),
        );
        return Ok(DetachOutcome::DryRun {
            distribution_id: summary.id,
            associations_would_remove: associations,
        });
    }

    log_detach_info(
        "clearing_edge_associations",
        json!({ "distribution_id": summary.id.clone(), "edge_associations": associations }),
    );
    gateway
        .update_without_associations(&summary.id, config, &etag)
        .map_err(|error| {
            log_detach_error(
                "distribution_update_failed",
                json!({ "distribution_id": summary.id.clone(), "error": error.to_string() }),
            );
            match error {
                DistributionUpdateError::StaleToken(message) => DetachError::Conflict(message),
                DistributionUpdateError::Other(message) => DetachError::Api(message),
            }
        })?;

    Ok(DetachOutcome::Detached {
        distribution_id: summary.id,
        associations_removed: associations,
    })
}

fn log_detach_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "distribution_detacher",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_detach_error(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "distribution_detacher",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
