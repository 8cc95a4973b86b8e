//! Typed identity for fully-qualified edge function versions.
//!
//! A qualified function ARN ends in `:<function-name>:<qualifier>`. The
//! qualifier decides whether a version may ever be deleted: an all-digits
//! qualifier names an immutable historical version, anything else (notably
//! the `$LATEST` alias) names the version currently in service.

use crate::contract::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionVersionRef {
    pub function_name: String,
    pub qualifier: String,
}

impl FunctionVersionRef {
    /// Prior versions are the only ones the reaper may delete. Everything
    /// else is, or aliases, the in-service version.
    pub fn is_prior_version(&self) -> bool {
        is_prior_qualifier(&self.qualifier)
    }
}

pub fn is_prior_qualifier(qualifier: &str) -> bool {
    !qualifier.is_empty() && qualifier.bytes().all(|byte| byte.is_ascii_digit())
}

/// Parses a qualified function ARN of the shape
/// `arn:<partition>:lambda:<region>:<account>:function:<name>:<qualifier>`.
/// Anything else, including an unqualified ARN, is rejected rather than
/// silently mapped onto empty segments.
pub fn parse_qualified_arn(arn: &str) -> Result<FunctionVersionRef, ValidationError> {
    let parts: Vec<&str> = arn.split(':').collect();
    if parts.len() != 8 || parts[0] != "arn" || parts[5] != "function" {
        return Err(ValidationError::new(format!(
            "not a qualified function ARN: {arn}"
        )));
    }

    let function_name = parts[6];
    let qualifier = parts[7];
    if function_name.is_empty() || qualifier.is_empty() {
        return Err(ValidationError::new(format!(
            "not a qualified function ARN: {arn}"
        )));
    }

    Ok(FunctionVersionRef {
        function_name: function_name.to_string(),
        qualifier: qualifier.to_string(),
    })
}
