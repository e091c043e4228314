//! CloudFormation-shaped remote the stack manager drives.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that may carry the HTTP status of the failed request.
pub trait HttpStatused {
    fn status_code(&self) -> Option<u16>;
}

/// Opaque failure reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub status_code: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            message: message.into(),
        }
    }

    /// A request the remote answered with a non-success status.
    pub fn request_failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code: Some(status_code),
            message: message.into(),
        }
    }
}

impl HttpStatused for TransportError {
    fn status_code(&self) -> Option<u16> {
        self.status_code
    }
}

pub const CAPABILITY_IAM: &str = "CAPABILITY_IAM";
pub const CAPABILITY_NAMED_IAM: &str = "CAPABILITY_NAMED_IAM";

fn default_capabilities() -> Vec<String> {
    vec![CAPABILITY_IAM.to_string(), CAPABILITY_NAMED_IAM.to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateStackInput {
    pub stack_name: String,
    pub template_body: String,
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
}

impl CreateStackInput {
    pub fn new(stack_name: impl Into<String>, template_body: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            template_body: template_body.into(),
            capabilities: default_capabilities(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateStackInput {
    pub stack_name: String,
    pub template_body: String,
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
}

impl UpdateStackInput {
    pub fn new(stack_name: impl Into<String>, template_body: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            template_body: template_body.into(),
            capabilities: default_capabilities(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStacksInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteStackInput {
    pub stack_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStacksOutput {
    #[serde(default)]
    pub stacks: Vec<StackDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackDescription {
    pub stack_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_status: Option<String>,
    #[serde(default)]
    pub outputs: Vec<StackOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackOutput {
    pub output_key: String,
    pub output_value: String,
}

#[async_trait]
pub trait StackTransport: Send + Sync {
    async fn create_stack(&self, input: CreateStackInput) -> Result<(), TransportError>;

    async fn update_stack(&self, input: UpdateStackInput) -> Result<(), TransportError>;

    async fn describe_stacks(
        &self,
        input: DescribeStacksInput,
    ) -> Result<DescribeStacksOutput, TransportError>;

    async fn delete_stack(&self, input: DeleteStackInput) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_use_cloudformation_field_names() {
        let body = serde_json::to_value(CreateStackInput::new("bbl-env", "{}")).unwrap();
        assert_eq!(body["StackName"], "bbl-env");
        assert_eq!(body["TemplateBody"], "{}");
        assert_eq!(body["Capabilities"][1], CAPABILITY_NAMED_IAM);
    }

    #[test]
    fn describe_output_tolerates_missing_fields() {
        let output: DescribeStacksOutput =
            serde_json::from_str(r#"{"Stacks":[{"StackName":"s"}]}"#).unwrap();
        assert_eq!(output.stacks[0].stack_status, None);
        assert!(output.stacks[0].outputs.is_empty());
    }

    #[test]
    fn request_failure_exposes_status() {
        assert_eq!(
            TransportError::request_failure(400, "bad").status_code(),
            Some(400)
        );
        assert_eq!(TransportError::new("boom").status_code(), None);
    }
}
