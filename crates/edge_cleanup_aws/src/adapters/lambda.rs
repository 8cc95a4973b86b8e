//! Gateway seam for edge function version enumeration and deletion.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionListing {
    /// Fully-qualified version ARNs in provider enumeration order.
    Versions(Vec<String>),
    /// The function no longer exists; a prior run already removed it.
    FunctionMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteVersionOutcome {
    Deleted,
    /// The provider reported the version as already gone, which counts as
    /// success under re-invocation.
    AlreadyAbsent,
}

/// Spaces out destructive calls. The live implementation sleeps a fixed
/// interval; tests substitute a recording no-op.
pub trait DeletePacer {
    fn pause_after_delete(&self);
}

pub trait FunctionGateway {
    fn list_version_arns(&self, function_name: &str) -> Result<VersionListing, String>;

    fn delete_version(
        &self,
        function_name: &str,
        qualifier: &str,
    ) -> Result<DeleteVersionOutcome, String>;
}
