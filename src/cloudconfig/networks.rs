use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BblError, Result};
use crate::network::CidrBlock;

pub const DEFAULT_STATIC_POOL_SIZE: u32 = 65;
/// Gateway, two reserved addresses and the broadcast address need a block of at least this size.
pub const MIN_SUBNET_SIZE: u128 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetInput {
    pub az: String,
    pub subnet: String,
    pub cidr: String,
    #[serde(default)]
    pub security_groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<NetworkSubnet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSubnet {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub az: String,
    pub gateway: String,
    pub range: String,
    pub reserved: Vec<String>,
    #[serde(rename = "static")]
    pub static_ips: Vec<String>,
    pub cloud_properties: SubnetCloudProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetCloudProperties {
    pub subnet: String,
    pub security_groups: Vec<String>,
}

/// Derives BOSH manual networks from subnet inputs.
///
/// Each subnet reserves its gateway (`first+1`), `first+2..first+3` and the
/// last address, and exposes a static pool ending at `last-1`.
#[derive(Debug, Clone)]
pub struct NetworksGenerator {
    inputs: Vec<SubnetInput>,
    az_associations: BTreeMap<String, String>,
    static_pool_size: u32,
    default_alias: bool,
}

impl NetworksGenerator {
    pub fn new(inputs: Vec<SubnetInput>, az_associations: BTreeMap<String, String>) -> Self {
        Self {
            inputs,
            az_associations,
            static_pool_size: DEFAULT_STATIC_POOL_SIZE,
            default_alias: false,
        }
    }

    pub fn with_static_pool_size(mut self, size: u32) -> Self {
        self.static_pool_size = size;
        self
    }

    /// Also emit a `default` network carrying the same subnets as `private`.
    pub fn with_default_alias(mut self, enabled: bool) -> Self {
        self.default_alias = enabled;
        self
    }

    pub fn generate(&self) -> Result<Vec<Network>> {
        if self.static_pool_size == 0 {
            return Err(BblError::Range(
                "static pool size must hold at least one address".to_string(),
            ));
        }
        let subnets = self
            .inputs
            .iter()
            .map(|input| self.subnet(input))
            .collect::<Result<Vec<_>>>()?;

        let private = Network {
            name: "private".to_string(),
            kind: "manual".to_string(),
            subnets,
        };

        let alias = self.default_alias.then(|| Network {
            name: "default".to_string(),
            ..private.clone()
        });
        Ok(std::iter::once(private).chain(alias).collect())
    }

    fn subnet(&self, input: &SubnetInput) -> Result<NetworkSubnet> {
        let block = CidrBlock::parse(&input.cidr)?;
        if block.size() < MIN_SUBNET_SIZE {
            return Err(BblError::Range(format!(
                "CIDR block too small for subnet {}: {} holds {} addresses, need at least {}",
                input.subnet,
                input.cidr,
                block.size(),
                MIN_SUBNET_SIZE
            )));
        }

        let first = block.first_ip();
        let last = block.last_ip();
        let pool = self.static_pool_size as u128;

        Ok(NetworkSubnet {
            az: self
                .az_associations
                .get(&input.az)
                .cloned()
                .unwrap_or_default(),
            gateway: first.add(1).to_string(),
            range: input.cidr.clone(),
            reserved: vec![
                format!("{}-{}", first.add(2), first.add(3)),
                last.to_string(),
            ],
            static_ips: vec![format!("{}-{}", last.subtract(pool), last.subtract(1))],
            cloud_properties: SubnetCloudProperties {
                subnet: input.subnet.clone(),
                security_groups: input.security_groups.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(cidr: &str) -> SubnetInput {
        SubnetInput {
            az: "us-east-1a".into(),
            subnet: "s1".into(),
            cidr: cidr.into(),
            security_groups: vec!["g1".into()],
        }
    }

    fn zones() -> BTreeMap<String, String> {
        BTreeMap::from([("us-east-1a".to_string(), "z1".to_string())])
    }

    #[test]
    fn lays_out_reserved_and_static_ranges() {
        let networks = NetworksGenerator::new(vec![input("10.0.16.0/20")], zones())
            .generate()
            .unwrap();
        assert_eq!(networks.len(), 1);
        let subnet = &networks[0].subnets[0];
        assert_eq!(subnet.az, "z1");
        assert_eq!(subnet.gateway, "10.0.16.1");
        assert_eq!(subnet.reserved, ["10.0.16.2-10.0.16.3", "10.0.31.255"]);
        assert_eq!(subnet.static_ips, ["10.0.31.190-10.0.31.254"]);
    }

    #[test]
    fn static_pool_width_is_configurable() {
        let networks = NetworksGenerator::new(vec![input("10.0.16.0/24")], zones())
            .with_static_pool_size(10)
            .generate()
            .unwrap();
        assert_eq!(networks[0].subnets[0].static_ips, ["10.0.16.245-10.0.16.254"]);
    }

    #[test]
    fn empty_static_pool_is_rejected() {
        let err = NetworksGenerator::new(vec![input("10.0.16.0/20")], zones())
            .with_static_pool_size(0)
            .generate()
            .unwrap_err();
        assert!(matches!(err, BblError::Range(_)));
    }

    #[test]
    fn tiny_blocks_name_the_subnet() {
        let err = NetworksGenerator::new(vec![input("10.0.16.0/30")], zones())
            .generate()
            .unwrap_err();
        assert!(matches!(err, BblError::Range(_)));
        assert!(format!("{err}").contains("s1"));
    }

    #[test]
    fn default_alias_mirrors_private() {
        let networks = NetworksGenerator::new(vec![input("10.0.16.0/20")], zones())
            .with_default_alias(true)
            .generate()
            .unwrap();
        assert_eq!(networks[0].name, "private");
        assert_eq!(networks[1].name, "default");
        assert_eq!(networks[0].subnets, networks[1].subnets);
    }

    #[test]
    fn v6_subnets_use_compressed_text() {
        let networks = NetworksGenerator::new(vec![input("2001:db8:cf::/80")], zones())
            .generate()
            .unwrap();
        let subnet = &networks[0].subnets[0];
        assert_eq!(subnet.gateway, "2001:db8:cf::1");
        assert_eq!(subnet.reserved[1], "2001:db8:cf::ffff:ffff:ffff");
    }
}
