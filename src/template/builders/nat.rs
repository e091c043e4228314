use serde_json::{Map, Value, json};

use crate::template::intrinsic::{AWS_REGION, find_in_map, reference};
use crate::template::properties::{
    EipProperties, IngressRule, InstanceProperties, SecurityGroupProperties, Tag,
};
use crate::template::{Resource, Template};

pub const NAT_AMI_MAPPING: &str = "AWSNATAMI";

const NAT_AMIS: &[(&str, &str)] = &[
    ("ap-northeast-1", "ami-f885ae96"),
    ("ap-northeast-2", "ami-4118d72f"),
    ("ap-southeast-1", "ami-e2fc3f81"),
    ("ap-southeast-2", "ami-e3217a80"),
    ("eu-central-1", "ami-0b322e67"),
    ("eu-west-1", "ami-c0993ab3"),
    ("sa-east-1", "ami-8631b5ea"),
    ("us-east-1", "ami-68115b02"),
    ("us-west-1", "ami-ef1a718f"),
    ("us-west-2", "ami-77a4b816"),
];

/// NAT AMI published for `region`, if any.
pub fn nat_ami(region: &str) -> Option<&'static str> {
    NAT_AMIS
        .iter()
        .find(|(known, _)| *known == region)
        .map(|(_, ami)| *ami)
}

fn ami_mapping() -> Value {
    let regions: Map<String, Value> = NAT_AMIS
        .iter()
        .map(|(region, ami)| (region.to_string(), json!({ "AMI": ami })))
        .collect();
    Value::Object(regions)
}

/// NAT instance in the BOSH subnet giving internal subnets outbound access.
pub fn nat() -> Template {
    let internal = reference("InternalSecurityGroup");

    Template::new()
        .with_mapping(NAT_AMI_MAPPING, ami_mapping())
        .with_resource(
            "NATSecurityGroup",
            Resource::new(
                "AWS::EC2::SecurityGroup",
                SecurityGroupProperties {
                    vpc_id: reference("VPC"),
                    group_description: "NAT".to_string(),
                    security_group_egress: Vec::new(),
                    security_group_ingress: vec![
                        IngressRule::from_group(internal.clone(), "tcp", "0", "65535"),
                        IngressRule::from_group(internal.clone(), "udp", "0", "65535"),
                        IngressRule::from_group(internal, "icmp", "-1", "-1"),
                    ],
                    tags: Vec::new(),
                },
            ),
        )
        .with_resource(
            "NATInstance",
            Resource::new(
                "AWS::EC2::Instance",
                InstanceProperties {
                    private_ip_address: "10.0.0.7".to_string(),
                    instance_type: "t2.medium".to_string(),
                    subnet_id: reference("BOSHSubnet"),
                    image_id: find_in_map(NAT_AMI_MAPPING, reference(AWS_REGION), "AMI"),
                    key_name: reference(super::keypair::SSH_KEY_PAIR_PARAMETER),
                    security_group_ids: vec![reference("NATSecurityGroup")],
                    tags: vec![Tag::name("NAT")],
                    source_dest_check: false,
                },
            ),
        )
        .with_resource(
            "NATEIP",
            Resource::new(
                "AWS::EC2::EIP",
                EipProperties {
                    domain: "vpc".to_string(),
                    instance_id: Some(reference("NATInstance")),
                },
            ),
        )
}
