use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cloudconfig::networks::{
    DEFAULT_STATIC_POOL_SIZE, Network, NetworksGenerator, SubnetInput,
};
use crate::error::Result;

const EPHEMERAL_DISK_MB: u32 = 10240;

const VM_TYPES: &[(&str, &str)] = &[
    ("default", "m3.medium"),
    ("small", "m3.medium"),
    ("medium", "m3.large"),
    ("large", "m3.xlarge"),
    ("xlarge", "m3.2xlarge"),
    ("m3.medium", "m3.medium"),
    ("m3.large", "m3.large"),
    ("m3.xlarge", "m3.xlarge"),
    ("m3.2xlarge", "m3.2xlarge"),
    ("c3.large", "c3.large"),
    ("c3.xlarge", "c3.xlarge"),
    ("c3.2xlarge", "c3.2xlarge"),
    ("c3.4xlarge", "c3.4xlarge"),
    ("r3.xlarge", "r3.xlarge"),
    ("t2.nano", "t2.nano"),
    ("t2.micro", "t2.micro"),
    ("t2.small", "t2.small"),
    ("t2.medium", "t2.medium"),
    ("t2.large", "t2.large"),
];

const DISK_TYPES: &[(&str, u32)] = &[
    ("default", 1024),
    ("1GB", 1024),
    ("5GB", 5120),
    ("10GB", 10240),
    ("50GB", 51200),
    ("100GB", 102400),
    ("500GB", 512000),
    ("1TB", 1048576),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfigInput {
    pub azs: Vec<String>,
    pub subnets: Vec<SubnetInput>,
    #[serde(default)]
    pub lbs: Vec<LoadBalancerExtension>,
}

/// A load balancer VMs can be attached to through a VM extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerExtension {
    pub name: String,
    pub elb_name: String,
    #[serde(default)]
    pub security_groups: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudConfig {
    pub azs: Vec<AvailabilityZone>,
    pub vm_types: Vec<VmType>,
    pub disk_types: Vec<DiskType>,
    pub compilation: Compilation,
    pub networks: Vec<Network>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vm_extensions: Vec<VmExtension>,
}

impl CloudConfig {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_bw::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityZone {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_properties: Option<AzCloudProperties>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzCloudProperties {
    pub availability_zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmType {
    pub name: String,
    pub cloud_properties: VmTypeCloudProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmTypeCloudProperties {
    pub instance_type: String,
    pub ephemeral_disk: EphemeralDisk,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralDisk {
    pub size: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskType {
    pub name: String,
    pub disk_size: u32,
    pub cloud_properties: DiskCloudProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskCloudProperties {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compilation {
    pub workers: u32,
    pub network: String,
    pub az: String,
    pub reuse_compilation_vms: bool,
    pub vm_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmExtension {
    pub name: String,
    pub cloud_properties: VmExtensionCloudProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmExtensionCloudProperties {
    pub elbs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<String>,
}

/// Label of the `index`-th (0-based) availability zone: `z1`, `z2`, ...
pub fn az_label(index: usize) -> String {
    format!("z{}", index + 1)
}

pub fn vm_types() -> Vec<VmType> {
    VM_TYPES
        .iter()
        .map(|(name, instance_type)| VmType {
            name: name.to_string(),
            cloud_properties: VmTypeCloudProperties {
                instance_type: instance_type.to_string(),
                ephemeral_disk: EphemeralDisk {
                    size: EPHEMERAL_DISK_MB,
                    kind: "gp2".to_string(),
                },
            },
        })
        .collect()
}

pub fn disk_types() -> Vec<DiskType> {
    DISK_TYPES
        .iter()
        .map(|(name, size)| DiskType {
            name: name.to_string(),
            disk_size: *size,
            cloud_properties: DiskCloudProperties {
                kind: "gp2".to_string(),
            },
        })
        .collect()
}

pub fn compilation() -> Compilation {
    Compilation {
        workers: 6,
        network: "private".to_string(),
        az: az_label(0),
        reuse_compilation_vms: true,
        vm_type: "c3.large".to_string(),
    }
}

fn vip_network() -> Network {
    Network {
        name: "vip".to_string(),
        kind: "vip".to_string(),
        subnets: Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct CloudConfigGenerator {
    static_pool_size: u32,
}

impl Default for CloudConfigGenerator {
    fn default() -> Self {
        Self {
            static_pool_size: DEFAULT_STATIC_POOL_SIZE,
        }
    }
}

impl CloudConfigGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_static_pool_size(mut self, size: u32) -> Self {
        self.static_pool_size = size;
        self
    }

    pub fn generate(&self, input: &CloudConfigInput) -> Result<CloudConfig> {
        let az_associations: BTreeMap<String, String> = input
            .azs
            .iter()
            .enumerate()
            .map(|(index, az)| (az.clone(), az_label(index)))
            .collect();

        let mut networks = NetworksGenerator::new(input.subnets.clone(), az_associations)
            .with_static_pool_size(self.static_pool_size)
            .with_default_alias(true)
            .generate()?;
        networks.push(vip_network());

        let azs = input
            .azs
            .iter()
            .enumerate()
            .map(|(index, az)| AvailabilityZone {
                name: az_label(index),
                cloud_properties: Some(AzCloudProperties {
                    availability_zone: az.clone(),
                }),
            })
            .collect();

        let vm_extensions = input
            .lbs
            .iter()
            .map(|lb| VmExtension {
                name: lb.name.clone(),
                cloud_properties: VmExtensionCloudProperties {
                    elbs: vec![lb.elb_name.clone()],
                    security_groups: lb.security_groups.clone(),
                },
            })
            .collect();

        debug!(
            azs = input.azs.len(),
            subnets = input.subnets.len(),
            lbs = input.lbs.len(),
            "generated cloud-config"
        );

        Ok(CloudConfig {
            azs,
            vm_types: vm_types(),
            disk_types: disk_types(),
            compilation: compilation(),
            networks,
            vm_extensions,
        })
    }

    /// The IaaS-neutral document the ops-file generator patches: `az_count`
    /// zones without cloud properties and manual networks without subnets.
    pub fn base(&self, az_count: usize) -> CloudConfig {
        let manual = |name: &str| Network {
            name: name.to_string(),
            kind: "manual".to_string(),
            subnets: Vec::new(),
        };

        CloudConfig {
            azs: (0..az_count)
                .map(|index| AvailabilityZone {
                    name: az_label(index),
                    cloud_properties: None,
                })
                .collect(),
            vm_types: vm_types(),
            disk_types: disk_types(),
            compilation: compilation(),
            networks: vec![manual("private"), manual("default"), vip_network()],
            vm_extensions: Vec::new(),
        }
    }
}
