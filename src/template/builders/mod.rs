//! Pure per-family template builders and the composite AWS template.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BblError, Result};
use crate::template::Template;

pub mod eip;
pub mod iam;
pub mod keypair;
pub mod load_balancers;
pub mod nat;
pub mod security_groups;
pub mod subnets;
pub mod vpc;

pub const TEMPLATE_DESCRIPTION: &str = "Infrastructure for a BOSH deployment.";

/// Load balancers to provision in front of the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadBalancerKind {
    #[default]
    None,
    Concourse,
    /// CF router and SSH proxy, plus an isolation-segment router when asked.
    Cf { iso_segment: bool },
}

impl LoadBalancerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadBalancerKind::None => "none",
            LoadBalancerKind::Concourse => "concourse",
            LoadBalancerKind::Cf { .. } => "cf",
        }
    }
}

/// Caller inputs of a composite template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParams {
    pub env_id: String,
    pub availability_zones: Vec<String>,
    pub key_pair_name: String,
    pub iam_user_name: String,
    #[serde(default)]
    pub load_balancer: LoadBalancerKind,
    #[serde(default)]
    pub load_balancer_certificate_arn: Option<String>,
}

/// Seam between the orchestrator and whatever produces the desired template.
pub trait TemplateBuilder: Send + Sync {
    fn build(&self, params: &TemplateParams) -> Result<Template>;
}

/// The BOSH-on-AWS composite template.
///
/// Sub-templates are merged in this order, later ones winning on collisions:
/// internal subnets, SSH key pair, IAM user, NAT, VPC, internal security group,
/// BOSH security group, BOSH subnet, BOSH EIP; then, when load balancers are
/// requested, load-balancer subnets followed by each family (concourse; or CF
/// router, CF SSH proxy, and the isolation-segment router).
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsTemplateBuilder;

impl AwsTemplateBuilder {
    pub fn new() -> Self {
        Self
    }

    fn load_balancers(&self, params: &TemplateParams) -> Result<Vec<Template>> {
        let azs = &params.availability_zones;
        let certificate = || {
            params
                .load_balancer_certificate_arn
                .as_deref()
                .filter(|arn| !arn.is_empty())
                .ok_or_else(|| {
                    BblError::Composition(format!(
                        "load balancer type '{}' requires a certificate ARN",
                        params.load_balancer.as_str()
                    ))
                })
        };

        let templates = match params.load_balancer {
            LoadBalancerKind::None => Vec::new(),
            LoadBalancerKind::Concourse => vec![
                subnets::load_balancer_subnets(azs),
                load_balancers::concourse(azs.len(), certificate()?),
            ],
            LoadBalancerKind::Cf { iso_segment } => {
                let arn = certificate()?;
                let mut templates = vec![
                    subnets::load_balancer_subnets(azs),
                    load_balancers::cf_router(azs.len(), arn),
                    load_balancers::cf_ssh_proxy(azs.len()),
                ];
                if iso_segment {
                    templates.push(load_balancers::cf_iso_seg_router(azs.len(), arn));
                }
                templates
            }
        };
        Ok(templates)
    }
}

impl TemplateBuilder for AwsTemplateBuilder {
    fn build(&self, params: &TemplateParams) -> Result<Template> {
        let first_az = params.availability_zones.first().ok_or_else(|| {
            BblError::Composition("at least one availability zone is required".into())
        })?;

        let base = [
            subnets::internal_subnets(&params.availability_zones),
            keypair::ssh_key_pair(&params.key_pair_name),
            iam::bosh_iam_user(&params.iam_user_name),
            nat::nat(),
            vpc::vpc(&params.env_id),
            security_groups::internal_security_group(),
            security_groups::bosh_security_group(),
            subnets::bosh_subnet(first_az),
            eip::bosh_eip(),
        ];
        let load_balancers = self.load_balancers(params)?;

        let template = Template::described(TEMPLATE_DESCRIPTION)
            .merge(base)
            .merge(load_balancers);
        debug!(
            env_id = %params.env_id,
            load_balancer = params.load_balancer.as_str(),
            resources = template.resources.len(),
            "composed template"
        );
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(load_balancer: LoadBalancerKind, arn: Option<&str>) -> TemplateParams {
        TemplateParams {
            env_id: "bbl-env".into(),
            availability_zones: vec!["us-east-1a".into(), "us-east-1b".into()],
            key_pair_name: "keypair-bbl-env".into(),
            iam_user_name: "bosh-iam-user-bbl-env".into(),
            load_balancer,
            load_balancer_certificate_arn: arn.map(String::from),
        }
    }

    #[test]
    fn base_template_has_no_load_balancers() {
        let template = AwsTemplateBuilder
            .build(&params(LoadBalancerKind::None, None))
            .unwrap();
        assert_eq!(template.description.as_deref(), Some(TEMPLATE_DESCRIPTION));
        assert!(template.resources.contains_key("NATInstance"));
        assert!(template.resources.contains_key("InternalSubnet2"));
        assert!(!template.resources.contains_key("LoadBalancerSubnet1"));
    }

    #[test]
    fn cf_with_iso_segment_adds_three_balancers() {
        let template = AwsTemplateBuilder
            .build(&params(
                LoadBalancerKind::Cf { iso_segment: true },
                Some("arn:cert"),
            ))
            .unwrap();
        for name in [
            "CFRouterLoadBalancer",
            "CFSSHProxyLoadBalancer",
            "CFIsoSegRouterLoadBalancer",
        ] {
            assert!(template.resources.contains_key(name), "missing {name}");
        }
        assert!(!template.resources.contains_key("ConcourseLoadBalancer"));
    }

    #[test]
    fn balancers_without_certificate_are_rejected() {
        let err = AwsTemplateBuilder
            .build(&params(LoadBalancerKind::Concourse, None))
            .unwrap_err();
        assert!(format!("{err}").contains("requires a certificate ARN"));
    }

    #[test]
    fn zero_zones_is_a_composition_error() {
        let mut params = params(LoadBalancerKind::None, None);
        params.availability_zones.clear();
        assert!(matches!(
            AwsTemplateBuilder.build(&params),
            Err(BblError::Composition(_))
        ));
    }

    #[test]
    fn builds_are_byte_identical() {
        let params = params(LoadBalancerKind::Cf { iso_segment: false }, Some("arn:cert"));
        let first = AwsTemplateBuilder.build(&params).unwrap().to_json().unwrap();
        let second = AwsTemplateBuilder.build(&params).unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }
}
