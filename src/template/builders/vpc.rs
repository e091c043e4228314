use crate::template::intrinsic::reference;
use crate::template::properties::{Tag, VpcGatewayAttachmentProperties, VpcProperties};
use crate::template::{Output, Parameter, Resource, Template};

pub const VPC_CIDR: &str = "10.0.0.0/16";

pub fn vpc(env_id: &str) -> Template {
    Template::new()
        .with_parameter(
            "VPCCIDR",
            Parameter::string(VPC_CIDR, "CIDR block for the VPC."),
        )
        .with_resource(
            "VPC",
            Resource::new(
                "AWS::EC2::VPC",
                VpcProperties {
                    cidr_block: reference("VPCCIDR"),
                    tags: vec![Tag::name(format!("vpc-{env_id}"))],
                },
            ),
        )
        .with_resource(
            "VPCGatewayInternetGateway",
            Resource::bare("AWS::EC2::InternetGateway"),
        )
        .with_resource(
            "VPCGatewayAttachment",
            Resource::new(
                "AWS::EC2::VPCGatewayAttachment",
                VpcGatewayAttachmentProperties {
                    vpc_id: reference("VPC"),
                    internet_gateway_id: reference("VPCGatewayInternetGateway"),
                },
            ),
        )
        .with_output("VPCID", Output::new(reference("VPC")))
        .with_output(
            "VPCInternetGatewayID",
            Output::new(reference("VPCGatewayInternetGateway")),
        )
}
