use crate::template::intrinsic::{get_att, reference};
use crate::template::properties::{HealthCheck, Listener, LoadBalancerProperties};
use crate::template::{Output, Resource, Template};

use super::security_groups::{load_balancer_internal_security_group, web_security_group};
use super::subnets::load_balancer_subnet_refs;

/// Logical-name prefix of each load balancer family; `<prefix>LoadBalancer`,
/// `<prefix>SecurityGroup` and `<prefix>InternalSecurityGroup` follow from it.
pub const CONCOURSE: &str = "Concourse";
pub const CF_ROUTER: &str = "CFRouter";
pub const CF_SSH_PROXY: &str = "CFSSHProxy";
pub const CF_ISO_SEG_ROUTER: &str = "CFIsoSegRouter";

pub fn load_balancer_name(prefix: &str) -> String {
    format!("{prefix}LoadBalancer")
}

pub fn internal_security_group_name(prefix: &str) -> String {
    format!("{prefix}InternalSecurityGroup")
}

struct Family<'a> {
    prefix: &'a str,
    description: &'a str,
    public_ports: &'a [u16],
    instance_ports: &'a [u16],
    health_port: u16,
    listeners: Vec<Listener>,
}

fn family(family: Family<'_>, subnet_count: usize) -> Template {
    let web_group = format!("{}SecurityGroup", family.prefix);
    let internal_group = internal_security_group_name(family.prefix);
    let lb_name = load_balancer_name(family.prefix);

    let load_balancer = Template::new()
        .with_resource(
            lb_name.clone(),
            Resource::new(
                "AWS::ElasticLoadBalancing::LoadBalancer",
                LoadBalancerProperties {
                    cross_zone: true,
                    subnets: load_balancer_subnet_refs(subnet_count),
                    security_groups: vec![reference(&web_group)],
                    health_check: HealthCheck::tcp(family.health_port),
                    listeners: family.listeners,
                },
            ),
        )
        .with_output(lb_name.clone(), Output::new(reference(&lb_name)))
        .with_output(
            format!("{lb_name}URL"),
            Output::new(get_att(&lb_name, "DNSName")),
        );

    web_security_group(&web_group, family.description, family.public_ports).merge([
        load_balancer_internal_security_group(
            &internal_group,
            &web_group,
            &format!("{} Internal", family.description),
            family.instance_ports,
        ),
        load_balancer,
    ])
}

pub fn concourse(subnet_count: usize, certificate_arn: &str) -> Template {
    family(
        Family {
            prefix: CONCOURSE,
            description: "Concourse",
            public_ports: &[80, 2222, 443],
            instance_ports: &[8080, 2222],
            health_port: 8080,
            listeners: vec![
                Listener::plain("tcp", 80, "tcp", 8080),
                Listener::plain("tcp", 2222, "tcp", 2222),
                Listener::secure("ssl", 443, "tcp", 8080, certificate_arn),
            ],
        },
        subnet_count,
    )
}

fn router_listeners(certificate_arn: &str) -> Vec<Listener> {
    vec![
        Listener::plain("http", 80, "http", 80),
        Listener::secure("https", 443, "http", 80, certificate_arn),
        Listener::secure("ssl", 4443, "tcp", 80, certificate_arn),
    ]
}

pub fn cf_router(subnet_count: usize, certificate_arn: &str) -> Template {
    family(
        Family {
            prefix: CF_ROUTER,
            description: "Router",
            public_ports: &[80, 443, 4443],
            instance_ports: &[80],
            health_port: 80,
            listeners: router_listeners(certificate_arn),
        },
        subnet_count,
    )
}

pub fn cf_ssh_proxy(subnet_count: usize) -> Template {
    family(
        Family {
            prefix: CF_SSH_PROXY,
            description: "CFSSHProxy",
            public_ports: &[2222],
            instance_ports: &[2222],
            health_port: 2222,
            listeners: vec![Listener::plain("tcp", 2222, "tcp", 2222)],
        },
        subnet_count,
    )
}

pub fn cf_iso_seg_router(subnet_count: usize, certificate_arn: &str) -> Template {
    family(
        Family {
            prefix: CF_ISO_SEG_ROUTER,
            description: "Isolation Segment Router",
            public_ports: &[80, 443, 4443],
            instance_ports: &[80],
            health_port: 80,
            listeners: router_listeners(certificate_arn),
        },
        subnet_count,
    )
}
