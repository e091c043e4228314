//! BOSH cloud-config derived from the stack's network layout.

pub mod generator;
pub mod networks;
pub mod ops;

pub use generator::{CloudConfig, CloudConfigGenerator, CloudConfigInput, LoadBalancerExtension};
pub use networks::{Network, NetworkSubnet, NetworksGenerator, SubnetInput};
pub use ops::{Op, OpKind, OpsGenerator, apply_ops};
