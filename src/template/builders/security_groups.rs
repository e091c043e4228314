use crate::template::intrinsic::reference;
use crate::template::properties::{
    IngressRule, SecurityGroupIngressProperties, SecurityGroupProperties,
};
use crate::template::{Output, Parameter, Resource, Template};

pub const INTERNAL_SECURITY_GROUP: &str = "InternalSecurityGroup";
pub const BOSH_SECURITY_GROUP: &str = "BOSHSecurityGroup";

fn group(description: &str, ingress: Vec<IngressRule>) -> Resource {
    Resource::new(
        "AWS::EC2::SecurityGroup",
        SecurityGroupProperties {
            vpc_id: reference("VPC"),
            group_description: description.to_string(),
            security_group_egress: Vec::new(),
            security_group_ingress: ingress,
            tags: Vec::new(),
        },
    )
}

fn ingress(group: &str, source: &str, protocol: &str, from_port: &str, to_port: &str) -> Resource {
    Resource::new(
        "AWS::EC2::SecurityGroupIngress",
        SecurityGroupIngressProperties {
            group_id: reference(group),
            rule: IngressRule::from_group(reference(source), protocol, from_port, to_port),
        },
    )
}

fn self_ingress(group: &str, protocol: &str, from_port: &str, to_port: &str) -> Resource {
    ingress(group, group, protocol, from_port, to_port)
}

/// Group shared by every deployed VM. Members reach each other on every
/// protocol; the director reaches them over TCP and UDP.
///
/// Every rule is a standalone ingress resource: a group cannot cite itself
/// inline, and the BOSH group already cites this one inline, so citing it
/// back would make the two groups depend on each other.
pub fn internal_security_group() -> Template {
    Template::new()
        .with_resource(INTERNAL_SECURITY_GROUP, group("Internal", Vec::new()))
        .with_resource(
            "InternalSecurityGroupIngressTCPfromBOSH",
            ingress(INTERNAL_SECURITY_GROUP, BOSH_SECURITY_GROUP, "tcp", "0", "65535"),
        )
        .with_resource(
            "InternalSecurityGroupIngressUDPfromBOSH",
            ingress(INTERNAL_SECURITY_GROUP, BOSH_SECURITY_GROUP, "udp", "0", "65535"),
        )
        .with_resource(
            "InternalSecurityGroupIngressTCPfromSelf",
            self_ingress(INTERNAL_SECURITY_GROUP, "tcp", "0", "65535"),
        )
        .with_resource(
            "InternalSecurityGroupIngressUDPfromSelf",
            self_ingress(INTERNAL_SECURITY_GROUP, "udp", "0", "65535"),
        )
        .with_resource(
            "InternalSecurityGroupIngressICMPfromSelf",
            self_ingress(INTERNAL_SECURITY_GROUP, "icmp", "-1", "-1"),
        )
        .with_output(
            INTERNAL_SECURITY_GROUP,
            Output::new(reference(INTERNAL_SECURITY_GROUP)),
        )
}

/// Group of the director: SSH, agent and director API from `BOSHInboundCIDR`,
/// everything from internal VMs.
pub fn bosh_security_group() -> Template {
    let inbound = reference("BOSHInboundCIDR");
    let internal = reference(INTERNAL_SECURITY_GROUP);

    Template::new()
        .with_parameter(
            "BOSHInboundCIDR",
            Parameter::string(
                "0.0.0.0/0",
                "CIDR to permit access to BOSH (e.g. 205.103.216.37/32 for your specific IP)",
            ),
        )
        .with_resource(
            BOSH_SECURITY_GROUP,
            group(
                "BOSH",
                vec![
                    IngressRule::from_cidr(inbound.clone(), "tcp", "22", "22"),
                    IngressRule::from_cidr(inbound.clone(), "tcp", "6868", "6868"),
                    IngressRule::from_cidr(inbound, "tcp", "25555", "25555"),
                    IngressRule::from_group(internal.clone(), "tcp", "0", "65535"),
                    IngressRule::from_group(internal, "udp", "0", "65535"),
                ],
            ),
        )
        .with_output(
            BOSH_SECURITY_GROUP,
            Output::new(reference(BOSH_SECURITY_GROUP)),
        )
}

/// Internet-facing group attached to a load balancer, open on `ports` over TCP.
pub fn web_security_group(name: &str, description: &str, ports: &[u16]) -> Template {
    let ingress = ports
        .iter()
        .map(|port| {
            let port = port.to_string();
            IngressRule::from_cidr(serde_json::json!("0.0.0.0/0"), "tcp", &port, &port)
        })
        .collect();

    Template::new()
        .with_resource(name, group(description, ingress))
        .with_output(name, Output::new(reference(name)))
}

/// Group for the VMs behind a load balancer, reachable from `source` on `ports`.
pub fn load_balancer_internal_security_group(
    name: &str,
    source: &str,
    description: &str,
    ports: &[u16],
) -> Template {
    let ingress = ports
        .iter()
        .map(|port| {
            let port = port.to_string();
            IngressRule::from_group(reference(source), "tcp", &port, &port)
        })
        .collect();

    Template::new()
        .with_resource(name, group(description, ingress))
        .with_output(name, Output::new(reference(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bosh_group_rule_matrix() {
        let template = bosh_security_group();
        let encoded = serde_json::to_value(&template.resources[BOSH_SECURITY_GROUP]).unwrap();
        let ingress = encoded["Properties"]["SecurityGroupIngress"]
            .as_array()
            .unwrap()
            .clone();
        let cidr_ports: Vec<_> = ingress
            .iter()
            .filter(|rule| rule.get("CidrIp").is_some())
            .map(|rule| rule["FromPort"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(cidr_ports, ["22", "6868", "25555"]);
        assert_eq!(ingress[3]["SourceSecurityGroupId"], json!({"Ref": "InternalSecurityGroup"}));
    }

    #[test]
    fn internal_group_takes_director_traffic_through_standalone_rules() {
        let template = internal_security_group();
        let encoded = serde_json::to_value(&template).unwrap();
        let resources = &encoded["Resources"];

        assert_eq!(
            resources[INTERNAL_SECURITY_GROUP]["Properties"]
                .get("SecurityGroupIngress")
                .and_then(|rules| rules.as_array())
                .map_or(0, Vec::len),
            0
        );
        for (name, protocol) in [
            ("InternalSecurityGroupIngressTCPfromBOSH", "tcp"),
            ("InternalSecurityGroupIngressUDPfromBOSH", "udp"),
        ] {
            let rule = &resources[name];
            assert_eq!(rule["Type"], "AWS::EC2::SecurityGroupIngress");
            assert_eq!(rule["Properties"]["GroupId"], json!({"Ref": INTERNAL_SECURITY_GROUP}));
            assert_eq!(
                rule["Properties"]["SourceSecurityGroupId"],
                json!({"Ref": BOSH_SECURITY_GROUP})
            );
            assert_eq!(rule["Properties"]["IpProtocol"], protocol);
        }
    }

    #[test]
    fn web_group_opens_each_port() {
        let template = web_security_group("ConcourseSecurityGroup", "Concourse", &[80, 2222, 443]);
        let encoded =
            serde_json::to_value(&template.resources["ConcourseSecurityGroup"]).unwrap();
        assert_eq!(
            encoded["Properties"]["SecurityGroupIngress"]
                .as_array()
                .unwrap()
                .len(),
            3
        );
    }
}
