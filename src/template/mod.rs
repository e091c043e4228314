//! CloudFormation-shaped template documents and their merge algebra.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

pub mod builders;
pub mod intrinsic;
pub mod properties;

pub use builders::{AwsTemplateBuilder, LoadBalancerKind, TemplateBuilder, TemplateParams};
pub use properties::Properties;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// A partial or composite infrastructure description.
///
/// Empty maps are omitted on serialization, so an empty map and an absent
/// section are the same document. Maps are ordered, which keeps the JSON
/// byte-identical across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Template {
    #[serde(
        rename = "AWSTemplateFormatVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub format_version: Option<String>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Parameters", skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(rename = "Mappings", skip_serializing_if = "BTreeMap::is_empty")]
    pub mappings: BTreeMap<String, Value>,
    #[serde(rename = "Resources", skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty template carrying only document metadata.
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            format_version: Some(TEMPLATE_FORMAT_VERSION.to_string()),
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, parameter: Parameter) -> Self {
        self.parameters.insert(name.into(), parameter);
        self
    }

    pub fn with_mapping(mut self, name: impl Into<String>, mapping: Value) -> Self {
        self.mappings.insert(name.into(), mapping);
        self
    }

    pub fn with_resource(mut self, name: impl Into<String>, resource: Resource) -> Self {
        self.resources.insert(name.into(), resource);
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, output: Output) -> Self {
        self.outputs.insert(name.into(), output);
        self
    }

    /// Unions the four maps of `self` and every argument, left to right.
    ///
    /// On a key collision the rightmost source wins. The receiver's format
    /// version and description are kept; arguments never replace them.
    pub fn merge(mut self, others: impl IntoIterator<Item = Template>) -> Template {
        for other in others {
            self.parameters.extend(other.parameters);
            self.mappings.extend(other.mappings);
            self.resources.extend(other.resources);
            self.outputs.extend(other.outputs);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
            && self.mappings.is_empty()
            && self.resources.is_empty()
            && self.outputs.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A named string-valued template input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    pub fn string(default: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: "String".to_string(),
            default: Some(default.into()),
            description: Some(description.into()),
        }
    }

    pub fn typed(
        kind: impl Into<String>,
        default: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            default: Some(default.into()),
            description: Some(description.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeletionPolicy {
    Delete,
    Retain,
    Snapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_policy: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_policy: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<DeletionPolicy>,
}

impl Resource {
    pub fn new(kind: impl Into<String>, properties: impl Into<Properties>) -> Self {
        Self {
            properties: Some(properties.into()),
            ..Self::bare(kind)
        }
    }

    /// A resource with no properties, e.g. an `AWS::EC2::InternetGateway`.
    pub fn bare(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            properties: None,
            depends_on: Vec::new(),
            creation_policy: None,
            update_policy: None,
            deletion_policy: None,
        }
    }

    pub fn depends_on(mut self, resource: impl Into<String>) -> Self {
        self.depends_on.push(resource.into());
        self
    }

    pub fn with_deletion_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Output {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            description: None,
        }
    }
}
