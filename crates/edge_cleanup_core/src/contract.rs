use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Pause between consecutive version deletions. Deleting versions is the one
/// destructive call the provider throttles aggressively, so the live gateway
/// waits this long after each delete before issuing the next one.
pub const DEFAULT_DELETE_PAUSE_MS: u64 = 300;

/// Appended to every run summary. Clearing the distribution's associations
/// only starts the provider's replica teardown; the function definitions
/// themselves stay undeletable until that background process finishes.
pub const REPLICA_PROPAGATION_NOTICE: &str = "Replica propagation may still be in progress; \
     delete the edge functions themselves only after the propagation window \
     (typically an hour or two) has elapsed.";

/// The comment the provisioning stack writes onto the distribution. It is the
/// only identifier the teardown workflow has for locating it.
pub fn distribution_comment(landscape: &str) -> String {
    format!("shib-lambda-{landscape}-distribution")
}

/// Splits a comma-delimited function list, tolerating arbitrary spacing
/// around the commas.
pub fn split_function_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanupRequest {
    pub landscape: String,
    pub function_names: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedCleanupRequest {
    pub landscape: String,
    pub function_names: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn normalize_request(
    request: CleanupRequest,
) -> Result<NormalizedCleanupRequest, ValidationError> {
    let landscape = request.landscape.trim().to_string();
    if landscape.is_empty() {
        return Err(ValidationError::new("landscape cannot be empty"));
    }

    let mut function_names = Vec::with_capacity(request.function_names.len());
    for name in &request.function_names {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        if !function_names.iter().any(|existing| existing == name) {
            function_names.push(name.to_string());
        }
    }

    if function_names.is_empty() {
        return Err(ValidationError::new(
            "at least one function name is required",
        ));
    }

    Ok(NormalizedCleanupRequest {
        landscape,
        function_names,
        dry_run: request.dry_run,
    })
}

/// Terminal state of the distribution detach phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DetachOutcome {
    /// No distribution carried the deployment comment; it was already
    /// deleted or never associated.
    AlreadyAbsent,
    Detached {
        distribution_id: String,
        associations_removed: usize,
    },
    DryRun {
        distribution_id: String,
        associations_would_remove: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionFailure {
    pub qualifier: String,
    pub reason: String,
}

/// Everything that happened to one function during version reaping. A
/// summary never represents a fatal condition: failed versions are simply
/// left for a future run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunctionReapSummary {
    pub function_name: String,
    pub function_missing: bool,
    pub list_failure: Option<String>,
    /// Qualifiers deleted in this run, in enumeration order.
    pub deleted: Vec<String>,
    /// Qualifiers a dry run would have deleted.
    pub planned: Vec<String>,
    /// Non-numeric qualifiers left in service.
    pub kept_current: Vec<String>,
    /// Qualifiers the provider reported as already gone.
    pub already_absent: Vec<String>,
    pub failed: Vec<VersionFailure>,
}

impl FunctionReapSummary {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            function_missing: false,
            list_failure: None,
            deleted: Vec::new(),
            planned: Vec::new(),
            kept_current: Vec::new(),
            already_absent: Vec::new(),
            failed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub detach: DetachOutcome,
    pub functions: Vec<FunctionReapSummary>,
}

impl CleanupReport {
    pub fn deleted_total(&self) -> usize {
        self.functions.iter().map(|f| f.deleted.len()).sum()
    }

    pub fn failed_total(&self) -> usize {
        self.functions
            .iter()
            .map(|f| f.failed.len() + usize::from(f.list_failure.is_some()))
            .sum()
    }

    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        if self.dry_run {
            let _ = writeln!(out, "Edge cleanup dry run complete; nothing was mutated.");
        } else {
            let _ = writeln!(out, "Edge cleanup complete.");
        }

        match &self.detach {
            DetachOutcome::AlreadyAbsent => {
                let _ = writeln!(
                    out,
                    "Distribution: no match for the deployment comment; nothing to detach."
                );
            }
            DetachOutcome::Detached {
                distribution_id,
                associations_removed,
            } => {
                let _ = writeln!(
                    out,
                    "Distribution {distribution_id}: removed {associations_removed} edge function association(s)."
                );
            }
            DetachOutcome::DryRun {
                distribution_id,
                associations_would_remove,
            } => {
                let _ = writeln!(
                    out,
                    "Distribution {distribution_id}: would remove {associations_would_remove} edge function association(s)."
                );
            }
        }

        for function in &self.functions {
            let name = &function.function_name;
            if function.function_missing {
                let _ = writeln!(out, "Function {name}: already deleted.");
                continue;
            }
            if let Some(reason) = &function.list_failure {
                let _ = writeln!(out, "Function {name}: version listing failed ({reason}).");
                continue;
            }

            let mut pieces = Vec::new();
            if !function.deleted.is_empty() {
                pieces.push(format!(
                    "deleted {} prior version(s) [{}]",
                    function.deleted.len(),
                    function.deleted.join(", ")
                ));
            }
            if !function.planned.is_empty() {
                pieces.push(format!(
                    "would delete {} prior version(s) [{}]",
                    function.planned.len(),
                    function.planned.join(", ")
                ));
            }
            if !function.kept_current.is_empty() {
                pieces.push(format!("kept {}", function.kept_current.join(", ")));
            }
            if !function.already_absent.is_empty() {
                pieces.push(format!(
                    "{} version(s) already absent",
                    function.already_absent.len()
                ));
            }
            if !function.failed.is_empty() {
                pieces.push(format!(
                    "{} version(s) failed and were left for a future run",
                    function.failed.len()
                ));
            }
            if pieces.is_empty() {
                pieces.push("no versions to process".to_string());
            }
            let _ = writeln!(out, "Function {name}: {}.", pieces.join("; "));
        }

        out.push_str(REPLICA_PROPAGATION_NOTICE);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(landscape: &str, names: &[&str]) -> CleanupRequest {
        CleanupRequest {
            landscape: landscape.to_string(),
            function_names: names.iter().map(|n| n.to_string()).collect(),
            dry_run: false,
        }
    }

    #[test]
    fn comment_follows_the_deployment_convention() {
        assert_eq!(
            distribution_comment("dev"),
            "shib-lambda-dev-distribution"
        );
    }

    #[test]
    fn function_list_tolerates_arbitrary_spacing() {
        assert_eq!(
            split_function_list("edge-origin-fn,  edge-viewer-fn ,app-fn"),
            vec!["edge-origin-fn", "edge-viewer-fn", "app-fn"]
        );
        assert!(split_function_list(" , ,").is_empty());
    }

    #[test]
    fn normalize_trims_and_deduplicates_names() {
        let normalized = normalize_request(request("dev", &[" a ", "b", "", "a"]))
            .expect("request should pass");
        assert_eq!(normalized.function_names, vec!["a", "b"]);
        assert_eq!(normalized.landscape, "dev");
    }

    #[test]
    fn normalize_rejects_empty_landscape() {
        let error = normalize_request(request("  ", &["a"])).expect_err("request should fail");
        assert_eq!(error.message(), "landscape cannot be empty");
    }

    #[test]
    fn normalize_rejects_empty_function_list() {
        let error = normalize_request(request("dev", &[" ", ""])).expect_err("request should fail");
        assert_eq!(error.message(), "at least one function name is required");
    }

    #[test]
    fn summary_counts_deletions_and_failures() {
        let mut fn_summary = FunctionReapSummary::new("edge-origin-fn");
        fn_summary.deleted = vec!["1".to_string(), "2".to_string()];
        fn_summary.failed = vec![VersionFailure {
            qualifier: "3".to_string(),
            reason: "throttled".to_string(),
        }];
        let report = CleanupReport {
            dry_run: false,
            detach: DetachOutcome::Detached {
                distribution_id: "E123".to_string(),
                associations_removed: 2,
            },
            functions: vec![fn_summary],
        };

        assert_eq!(report.deleted_total(), 2);
        assert_eq!(report.failed_total(), 1);
        let summary = report.render_summary();
        assert!(summary.contains("Distribution E123"));
        assert!(summary.contains("deleted 2 prior version(s) [1, 2]"));
        assert!(summary.contains("left for a future run"));
        assert!(summary.contains(REPLICA_PROPAGATION_NOTICE));
    }

    #[test]
    fn dry_run_summary_says_nothing_was_mutated() {
        let report = CleanupReport {
            dry_run: true,
            detach: DetachOutcome::AlreadyAbsent,
            functions: Vec::new(),
        };
        let summary = report.render_summary();
        assert!(summary.contains("dry run"));
        assert!(summary.contains("nothing to detach"));
    }
}
