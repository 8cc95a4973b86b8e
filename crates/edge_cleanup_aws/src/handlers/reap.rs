//! Version reaping phase.
//!
//! Deletes every prior (all-digits) version of one function, strictly in
//! enumeration order, and never the in-service version. Nothing here is
//! fatal: a missing function, an already-absent version, or a failed delete
//! is recorded in the summary and the run moves on, leaving stragglers for
//! a future invocation. Live deletes are spaced by the injected pacer so the
//! run stays under the provider's request rate ceiling.

use edge_cleanup_core::arn::parse_qualified_arn;
use edge_cleanup_core::contract::{FunctionReapSummary, VersionFailure};
use serde_json::json;

use crate::adapters::lambda::{DeletePacer, DeleteVersionOutcome, FunctionGateway, VersionListing};

pub fn reap_prior_versions(
    gateway: &impl FunctionGateway,
    pacer: &impl DeletePacer,
    function_name: &str,
    dry_run: bool,
) -> FunctionReapSummary {
    let mut summary = FunctionReapSummary::new(function_name);
    log_reaper_info("listing_versions", json!({ "function_name": function_name }));

    let listing = match gateway.list_version_arns(function_name) {
        Ok(listing) => listing,
        Err(message) => {
            log_reaper_error(
                "version_listing_failed",
                json!({ "function_name": function_name, "error": message.clone() }),
            );
            summary.list_failure = Some(message);
            return summary;
        }
    };

    let arns = match listing {
        VersionListing::FunctionMissing => {
            log_reaper_info(
                "function_already_deleted",
                json!({ "function_name": function_name }),
            );
            summary.function_missing = true;
            return summary;
        }
        VersionListing::Versions(arns) => arns,
    };

    for arn in arns {
        let version = match parse_qualified_arn(&arn) {
            Ok(version) => version,
            Err(error) => {
                log_reaper_error(
                    "malformed_version_arn",
                    json!({ "function_name": function_name, "arn": arn.clone(), "error": error.message() }),
                );
                summary.failed.push(VersionFailure {
                    qualifier: arn,
                    reason: error.message().to_string(),
                });
                continue;
            }
        };

        if !version.is_prior_version() {
            log_reaper_info(
                "keeping_current_version",
                json!({ "function_name": function_name, "qualifier": version.qualifier.clone() }),
            );
            summary.kept_current.push(version.qualifier);
            continue;
        }

        if dry_run {
            log_reaper_info(
                "dry_run_delete",
                json!({
                    "function_name": version.function_name.clone(),
                    "qualifier": version.qualifier.clone(),
                }),
            );
            summary.planned.push(version.qualifier);
            continue;
        }

        log_reaper_info(
            "deleting_version",
            json!({
                "function_name": version.function_name.clone(),
                "qualifier": version.qualifier.clone(),
            }),
        );
        match gateway.delete_version(&version.function_name, &version.qualifier) {
            Ok(DeleteVersionOutcome::Deleted) => summary.deleted.push(version.qualifier),
            Ok(DeleteVersionOutcome::AlreadyAbsent) => {
                log_reaper_info(
                    "version_already_absent",
                    json!({
                        "function_name": version.function_name.clone(),
                        "qualifier": version.qualifier.clone(),
                    }),
                );
                summary.already_absent.push(version.qualifier);
            }
            Err(message) => {
                log_reaper_error(
                    "version_delete_failed",
                    json!({
                        "function_name": version.function_name.clone(),
                        "qualifier": version.qualifier.clone(),
                        "error": message.clone(),
                    }),
                );
                summary.failed.push(VersionFailure {
                    qualifier: version.qualifier,
                    reason: message,
                });
            }
        }
        // Every delete call counts against the provider's rate ceiling,
        // whatever its outcome.
        pacer.pause_after_delete();
    }

    summary
}

fn log_reaper_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "version_reaper",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

fn log_reaper_error(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "version_reaper",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    struct RecordingPacer {
        pauses: Mutex<usize>,
    }

    impl RecordingPacer {
        fn new() -> Self {
            Self {
                pauses: Mutex::new(0),
            }
        }

        fn pauses(&self) -> usize {
            *self.pauses.lock().expect("poisoned mutex")
        }
    }

    impl DeletePacer for RecordingPacer {
        fn pause_after_delete(&self) {
            *self.pauses.lock().expect("poisoned mutex") += 1;
        }
    }

    struct MockFunctionGateway {
        listing: Result<VersionListing, String>,
        delete_results: HashMap<String, Result<DeleteVersionOutcome, String>>,
        deletes: Mutex<Vec<(String, String)>>,
    }

    impl MockFunctionGateway {
        fn new(listing: Result<VersionListing, String>) -> Self {
            Self {
                listing,
                delete_results: HashMap::new(),
                deletes: Mutex::new(Vec::new()),
            }
        }

        fn with_versions(qualifiers: &[&str]) -> Self {
            let arns = qualifiers
                .iter()
                .map(|qualifier| {
                    format!(
                        "arn:aws:lambda:us-east-1:123456789012:function:edge-origin-fn:{qualifier}"
                    )
                })
                .collect();
            Self::new(Ok(VersionListing::Versions(arns)))
        }

        fn deletes(&self) -> Vec<(String, String)> {
            self.deletes.lock().expect("poisoned mutex").clone()
        }
    }

    impl FunctionGateway for MockFunctionGateway {
        fn list_version_arns(&self, _function_name: &str) -> Result<VersionListing, String> {
            self.listing.clone()
        }

        fn delete_version(
            &self,
            function_name: &str,
            qualifier: &str,
        ) -> Result<DeleteVersionOutcome, String> {
            self.deletes
                .lock()
                .expect("poisoned mutex")
                .push((function_name.to_string(), qualifier.to_string()));
            self.delete_results
                .get(qualifier)
                .cloned()
                .unwrap_or(Ok(DeleteVersionOutcome::Deleted))
        }
    }

    #[test]
    fn deletes_prior_versions_in_order_and_keeps_latest() {
        let gateway = MockFunctionGateway::with_versions(&["$LATEST", "1", "2", "3"]);
        let pacer = RecordingPacer::new();

        let summary = reap_prior_versions(&gateway, &pacer, "edge-origin-fn", false);
        assert_eq!(
            gateway.deletes(),
            vec![
                ("edge-origin-fn".to_string(), "1".to_string()),
                ("edge-origin-fn".to_string(), "2".to_string()),
                ("edge-origin-fn".to_string(), "3".to_string()),
            ]
        );
        assert_eq!(summary.deleted, vec!["1", "2", "3"]);
        assert_eq!(summary.kept_current, vec!["$LATEST"]);
        assert!(summary.failed.is_empty());
        assert_eq!(pacer.pauses(), 3);
    }

    #[test]
    fn dry_run_issues_zero_deletion_calls() {
        let gateway = MockFunctionGateway::with_versions(&["$LATEST", "1", "2", "3"]);
        let pacer = RecordingPacer::new();

        let summary = reap_prior_versions(&gateway, &pacer, "edge-origin-fn", true);
        assert!(gateway.deletes().is_empty());
        assert_eq!(summary.planned, vec!["1", "2", "3"]);
        assert_eq!(summary.kept_current, vec!["$LATEST"]);
        assert!(summary.deleted.is_empty());
        assert_eq!(pacer.pauses(), 0);
    }

    #[test]
    fn missing_function_is_success_by_absence() {
        let gateway = MockFunctionGateway::new(Ok(VersionListing::FunctionMissing));

        let summary = reap_prior_versions(&gateway, &RecordingPacer::new(), "edge-origin-fn", false);
        assert!(summary.function_missing);
        assert!(gateway.deletes().is_empty());
        assert!(summary.failed.is_empty());
    }

    #[test]
    fn already_absent_version_counts_as_success() {
        let mut gateway = MockFunctionGateway::with_versions(&["1"]);
        gateway
            .delete_results
            .insert("1".to_string(), Ok(DeleteVersionOutcome::AlreadyAbsent));
        let pacer = RecordingPacer::new();

        let summary = reap_prior_versions(&gateway, &pacer, "edge-origin-fn", false);
        assert_eq!(summary.already_absent, vec!["1"]);
        assert!(summary.failed.is_empty());
        assert_eq!(pacer.pauses(), 1);
    }

    #[test]
    fn delete_failure_does_not_abort_remaining_versions() {
        let mut gateway = MockFunctionGateway::with_versions(&["1", "2", "3"]);
        gateway
            .delete_results
            .insert("2".to_string(), Err("rate exceeded".to_string()));
        let pacer = RecordingPacer::new();

        let summary = reap_prior_versions(&gateway, &pacer, "edge-origin-fn", false);
        assert_eq!(summary.deleted, vec!["1", "3"]);
        assert_eq!(
            summary.failed,
            vec![VersionFailure {
                qualifier: "2".to_string(),
                reason: "rate exceeded".to_string(),
            }]
        );
        assert_eq!(gateway.deletes().len(), 3);
        // A rejected delete still spent provider rate; the next call must
        // not follow it immediately.
        assert_eq!(pacer.pauses(), 3);
    }

    #[test]
    fn malformed_arn_is_recorded_and_skipped() {
        let gateway = MockFunctionGateway::new(Ok(VersionListing::Versions(vec![
            "not-an-arn".to_string(),
            "arn:aws:lambda:us-east-1:123456789012:function:edge-origin-fn:1".to_string(),
        ])));
        let pacer = RecordingPacer::new();

        let summary = reap_prior_versions(&gateway, &pacer, "edge-origin-fn", false);
        assert_eq!(summary.deleted, vec!["1"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].qualifier, "not-an-arn");
    }

    #[test]
    fn listing_failure_is_recorded_without_aborting() {
        let gateway = MockFunctionGateway::new(Err("access denied".to_string()));

        let summary = reap_prior_versions(&gateway, &RecordingPacer::new(), "edge-origin-fn", false);
        assert_eq!(summary.list_failure.as_deref(), Some("access denied"));
        assert!(gateway.deletes().is_empty());
    }
}
