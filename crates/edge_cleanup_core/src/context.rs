//! Deployment context document.
//!
//! The provisioning stack is driven by a JSON context file; the teardown
//! workflow reads the same document to derive the distribution comment and
//! the default function list, so both sides agree on names without any
//! shared remote state.

use serde::Deserialize;

use crate::contract::{distribution_comment, ValidationError};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeploymentContext {
    #[serde(rename = "STACK_ID")]
    pub stack_id: String,
    #[serde(rename = "REGION")]
    pub region: String,
    #[serde(rename = "EDGE_REQUEST_ORIGIN_FUNCTION_NAME")]
    pub edge_request_origin_function_name: String,
    #[serde(rename = "EDGE_RESPONSE_VIEWER_FUNCTION_NAME")]
    pub edge_response_viewer_function_name: String,
    #[serde(rename = "TAGS")]
    pub tags: DeploymentTags,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DeploymentTags {
    #[serde(rename = "Landscape")]
    pub landscape: String,
    #[serde(rename = "Service", default)]
    pub service: String,
    #[serde(rename = "Function", default)]
    pub function: String,
}

impl DeploymentContext {
    pub fn from_json(text: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(text)
            .map_err(|error| ValidationError::new(format!("Malformed deployment context: {error}")))
    }

    pub fn landscape(&self) -> &str {
        &self.tags.landscape
    }

    /// The three functions the stack deploys, in teardown order.
    pub fn default_function_names(&self) -> Vec<String> {
        self.function_names_for(&self.tags.landscape)
    }

    /// Same list under an overriding landscape, so the app function name and
    /// the distribution comment always derive from the same landscape.
    pub fn function_names_for(&self, landscape: &str) -> Vec<String> {
        vec![
            self.edge_request_origin_function_name.clone(),
            self.edge_response_viewer_function_name.clone(),
            format!("{}-{landscape}-app-function", self.stack_id),
        ]
    }

    pub fn distribution_comment(&self) -> String {
        distribution_comment(&self.tags.landscape)
    }
}
