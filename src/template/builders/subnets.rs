use serde_json::{Value, json};

use crate::template::intrinsic::{get_att, reference};
use crate::template::properties::{
    RouteProperties, RouteTableProperties, SubnetProperties, SubnetRouteTableAssociationProperties,
    Tag,
};
use crate::template::{Output, Parameter, Resource, Template};

pub const BOSH_SUBNET_CIDR: &str = "10.0.0.0/24";

/// CIDR of the internal subnet with 1-based suffix `n`: `10.0.{16n}.0/20`.
pub fn internal_subnet_cidr(n: usize) -> String {
    format!("10.0.{}.0/20", 16 * n)
}

/// CIDR of the load-balancer subnet with 1-based suffix `n`: `10.0.{n}.0/24`.
pub fn load_balancer_subnet_cidr(n: usize) -> String {
    format!("10.0.{n}.0/24")
}

pub fn internal_subnet_name(n: usize) -> String {
    format!("InternalSubnet{n}")
}

pub fn load_balancer_subnet_name(n: usize) -> String {
    format!("LoadBalancerSubnet{n}")
}

/// Public subnet the director and NAT live in, routed through the internet gateway.
pub fn bosh_subnet(availability_zone: &str) -> Template {
    Template::new()
        .with_parameter(
            "BOSHSubnetCIDR",
            Parameter::string(BOSH_SUBNET_CIDR, "CIDR block for the BOSH subnet."),
        )
        .with_resource(
            "BOSHSubnet",
            Resource::new(
                "AWS::EC2::Subnet",
                SubnetProperties {
                    availability_zone: json!(availability_zone),
                    cidr_block: reference("BOSHSubnetCIDR"),
                    vpc_id: reference("VPC"),
                    tags: vec![Tag::name("BOSH")],
                },
            ),
        )
        .with_resource(
            "BOSHRouteTable",
            Resource::new(
                "AWS::EC2::RouteTable",
                RouteTableProperties {
                    vpc_id: reference("VPC"),
                },
            ),
        )
        .with_resource(
            "BOSHRoute",
            Resource::new(
                "AWS::EC2::Route",
                RouteProperties {
                    destination_cidr_block: "0.0.0.0/0".to_string(),
                    gateway_id: Some(reference("VPCGatewayInternetGateway")),
                    instance_id: None,
                    route_table_id: reference("BOSHRouteTable"),
                },
            )
            .depends_on("VPCGatewayInternetGateway"),
        )
        .with_resource(
            "BOSHSubnetRouteTableAssociation",
            association("BOSHRouteTable", "BOSHSubnet"),
        )
        .with_output("BOSHSubnet", Output::new(reference("BOSHSubnet")))
        .with_output(
            "BOSHSubnetAZ",
            Output::new(get_att("BOSHSubnet", "AvailabilityZone")),
        )
}

/// One private subnet per availability zone, all routed through the NAT instance.
pub fn internal_subnets(availability_zones: &[String]) -> Template {
    let shared = Template::new()
        .with_resource(
            "InternalRouteTable",
            Resource::new(
                "AWS::EC2::RouteTable",
                RouteTableProperties {
                    vpc_id: reference("VPC"),
                },
            ),
        )
        .with_resource(
            "InternalRoute",
            Resource::new(
                "AWS::EC2::Route",
                RouteProperties {
                    destination_cidr_block: "0.0.0.0/0".to_string(),
                    gateway_id: None,
                    instance_id: Some(reference("NATInstance")),
                    route_table_id: reference("InternalRouteTable"),
                },
            )
            .depends_on("NATInstance"),
        );

    let subnets = availability_zones
        .iter()
        .enumerate()
        .map(|(index, az)| internal_subnet(index + 1, az));

    shared.merge(subnets)
}

pub fn internal_subnet(n: usize, availability_zone: &str) -> Template {
    let name = internal_subnet_name(n);
    let cidr_parameter = format!("{name}CIDR");

    Template::new()
        .with_parameter(
            cidr_parameter.clone(),
            Parameter::string(
                internal_subnet_cidr(n),
                format!("CIDR block for {name}."),
            ),
        )
        .with_resource(
            name.clone(),
            Resource::new(
                "AWS::EC2::Subnet",
                SubnetProperties {
                    availability_zone: json!(availability_zone),
                    cidr_block: reference(&cidr_parameter),
                    vpc_id: reference("VPC"),
                    tags: vec![Tag::name(format!("Internal{n}"))],
                },
            ),
        )
        .with_resource(
            format!("{name}RouteTableAssociation"),
            association("InternalRouteTable", &name),
        )
        .with_output(format!("{name}Name"), Output::new(reference(&name)))
        .with_output(
            format!("{name}AZ"),
            Output::new(get_att(&name, "AvailabilityZone")),
        )
        .with_output(
            format!("{name}CIDR"),
            Output::new(reference(&cidr_parameter)),
        )
}

/// Public subnets for ELBs, one per availability zone.
pub fn load_balancer_subnets(availability_zones: &[String]) -> Template {
    let shared = Template::new()
        .with_resource(
            "LoadBalancerRouteTable",
            Resource::new(
                "AWS::EC2::RouteTable",
                RouteTableProperties {
                    vpc_id: reference("VPC"),
                },
            ),
        )
        .with_resource(
            "LoadBalancerRoute",
            Resource::new(
                "AWS::EC2::Route",
                RouteProperties {
                    destination_cidr_block: "0.0.0.0/0".to_string(),
                    gateway_id: Some(reference("VPCGatewayInternetGateway")),
                    instance_id: None,
                    route_table_id: reference("LoadBalancerRouteTable"),
                },
            )
            .depends_on("VPCGatewayInternetGateway"),
        );

    let subnets = availability_zones
        .iter()
        .enumerate()
        .map(|(index, az)| load_balancer_subnet(index + 1, az));

    shared.merge(subnets)
}

fn load_balancer_subnet(n: usize, availability_zone: &str) -> Template {
    let name = load_balancer_subnet_name(n);
    let cidr_parameter = format!("{name}CIDR");

    Template::new()
        .with_parameter(
            cidr_parameter.clone(),
            Parameter::string(
                load_balancer_subnet_cidr(n),
                format!("CIDR block for {name}."),
            ),
        )
        .with_resource(
            name.clone(),
            Resource::new(
                "AWS::EC2::Subnet",
                SubnetProperties {
                    availability_zone: json!(availability_zone),
                    cidr_block: reference(&cidr_parameter),
                    vpc_id: reference("VPC"),
                    tags: vec![Tag::name(format!("LoadBalancer{n}"))],
                },
            ),
        )
        .with_resource(
            format!("{name}RouteTableAssociation"),
            association("LoadBalancerRouteTable", &name),
        )
        .with_output(name.clone(), Output::new(reference(&name)))
}

/// `Ref`s to every load-balancer subnet, in suffix order.
pub fn load_balancer_subnet_refs(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|n| reference(&load_balancer_subnet_name(n)))
        .collect()
}

fn association(route_table: &str, subnet: &str) -> Resource {
    Resource::new(
        "AWS::EC2::SubnetRouteTableAssociation",
        SubnetRouteTableAssociationProperties {
            route_table_id: reference(route_table),
            subnet_id: reference(subnet),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn azs(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn internal_subnets_step_by_sixteen() {
        let template = internal_subnets(&azs(&["us-east-1a", "us-east-1b", "us-east-1c"]));
        let cidrs: Vec<_> = (1..=3)
            .map(|n| {
                template.parameters[&format!("InternalSubnet{n}CIDR")]
                    .default
                    .clone()
                    .unwrap()
            })
            .collect();
        assert_eq!(cidrs, ["10.0.16.0/20", "10.0.32.0/20", "10.0.48.0/20"]);
        assert!(template.outputs.contains_key("InternalSubnet3AZ"));
        assert!(template.resources.contains_key("InternalRoute"));
    }

    #[test]
    fn load_balancer_subnets_step_by_one() {
        let template = load_balancer_subnets(&azs(&["us-east-1a", "us-east-1b"]));
        assert_eq!(
            template.parameters["LoadBalancerSubnet2CIDR"].default.as_deref(),
            Some("10.0.2.0/24")
        );
        assert_eq!(load_balancer_subnet_refs(2).len(), 2);
    }

    #[test]
    fn bosh_route_waits_for_gateway() {
        let template = bosh_subnet("us-east-1a");
        assert_eq!(
            template.resources["BOSHRoute"].depends_on,
            vec!["VPCGatewayInternetGateway".to_string()]
        );
    }
}
