//! Typed `Properties` payloads for the resource types the builders emit.
//!
//! Each variant serializes as its payload object alone; the resource's `Type`
//! field is what tells CloudFormation how to read it. `Opaque` carries any
//! property document not modelled here.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Properties {
    Vpc(VpcProperties),
    VpcGatewayAttachment(VpcGatewayAttachmentProperties),
    Subnet(SubnetProperties),
    RouteTable(RouteTableProperties),
    Route(RouteProperties),
    SubnetRouteTableAssociation(SubnetRouteTableAssociationProperties),
    SecurityGroup(SecurityGroupProperties),
    SecurityGroupIngress(SecurityGroupIngressProperties),
    Instance(InstanceProperties),
    Eip(EipProperties),
    IamUser(IamUserProperties),
    IamAccessKey(IamAccessKeyProperties),
    LoadBalancer(LoadBalancerProperties),
    Opaque(Value),
}

macro_rules! properties_from {
    ($($payload:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$payload> for Properties {
                fn from(value: $payload) -> Self {
                    Properties::$variant(value)
                }
            }
        )*
    };
}

properties_from! {
    VpcProperties => Vpc,
    VpcGatewayAttachmentProperties => VpcGatewayAttachment,
    SubnetProperties => Subnet,
    RouteTableProperties => RouteTable,
    RouteProperties => Route,
    SubnetRouteTableAssociationProperties => SubnetRouteTableAssociation,
    SecurityGroupProperties => SecurityGroup,
    SecurityGroupIngressProperties => SecurityGroupIngress,
    InstanceProperties => Instance,
    EipProperties => Eip,
    IamUserProperties => IamUser,
    IamAccessKeyProperties => IamAccessKey,
    LoadBalancerProperties => LoadBalancer,
    Value => Opaque,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            key: "Name".to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcProperties {
    pub cidr_block: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcGatewayAttachmentProperties {
    pub vpc_id: Value,
    pub internet_gateway_id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetProperties {
    pub availability_zone: Value,
    pub cidr_block: Value,
    pub vpc_id: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTableProperties {
    pub vpc_id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteProperties {
    pub destination_cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<Value>,
    pub route_table_id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetRouteTableAssociationProperties {
    pub route_table_id: Value,
    pub subnet_id: Value,
}

/// One ingress rule, either inline on a security group or standalone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IngressRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_ip: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_security_group_id: Option<Value>,
    pub ip_protocol: String,
    pub from_port: String,
    pub to_port: String,
}

impl IngressRule {
    pub fn from_cidr(cidr: Value, protocol: &str, from_port: &str, to_port: &str) -> Self {
        Self {
            cidr_ip: Some(cidr),
            source_security_group_id: None,
            ip_protocol: protocol.to_string(),
            from_port: from_port.to_string(),
            to_port: to_port.to_string(),
        }
    }

    pub fn from_group(group: Value, protocol: &str, from_port: &str, to_port: &str) -> Self {
        Self {
            cidr_ip: None,
            source_security_group_id: Some(group),
            ip_protocol: protocol.to_string(),
            from_port: from_port.to_string(),
            to_port: to_port.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupProperties {
    pub vpc_id: Value,
    pub group_description: String,
    pub security_group_egress: Vec<Value>,
    pub security_group_ingress: Vec<IngressRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// A standalone `AWS::EC2::SecurityGroupIngress`, used where an inline rule would
/// make a group depend on itself or on a group that already depends on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupIngressProperties {
    pub group_id: Value,
    #[serde(flatten)]
    pub rule: IngressRule,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceProperties {
    pub private_ip_address: String,
    pub instance_type: String,
    pub subnet_id: Value,
    pub image_id: Value,
    pub key_name: Value,
    pub security_group_ids: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    pub source_dest_check: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EipProperties {
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IamUserProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub policies: Vec<IamPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IamPolicy {
    pub policy_name: String,
    pub policy_document: IamPolicyDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IamPolicyDocument {
    pub version: String,
    pub statement: Vec<IamStatement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IamStatement {
    pub action: Vec<String>,
    pub effect: String,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IamAccessKeyProperties {
    pub user_name: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoadBalancerProperties {
    pub cross_zone: bool,
    pub subnets: Vec<Value>,
    pub security_groups: Vec<Value>,
    pub health_check: HealthCheck,
    pub listeners: Vec<Listener>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthCheck {
    pub healthy_threshold: String,
    pub interval: String,
    pub target: String,
    pub timeout: String,
    pub unhealthy_threshold: String,
}

impl HealthCheck {
    pub fn tcp(port: u16) -> Self {
        Self {
            healthy_threshold: "2".to_string(),
            interval: "30".to_string(),
            target: format!("tcp:{port}"),
            timeout: "5".to_string(),
            unhealthy_threshold: "10".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Listener {
    pub protocol: String,
    pub load_balancer_port: String,
    pub instance_protocol: String,
    pub instance_port: String,
    #[serde(rename = "SSLCertificateId", skip_serializing_if = "Option::is_none")]
    pub ssl_certificate_id: Option<String>,
}

impl Listener {
    pub fn plain(protocol: &str, port: u16, instance_protocol: &str, instance_port: u16) -> Self {
        Self {
            protocol: protocol.to_string(),
            load_balancer_port: port.to_string(),
            instance_protocol: instance_protocol.to_string(),
            instance_port: instance_port.to_string(),
            ssl_certificate_id: None,
        }
    }

    pub fn secure(
        protocol: &str,
        port: u16,
        instance_protocol: &str,
        instance_port: u16,
        certificate_arn: &str,
    ) -> Self {
        Self {
            ssl_certificate_id: Some(certificate_arn.to_string()),
            ..Self::plain(protocol, port, instance_protocol, instance_port)
        }
    }
}
