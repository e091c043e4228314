//! IPv4/IPv6 address and CIDR arithmetic used to lay out subnets.

pub mod cidr;
pub mod ip;

pub use cidr::CidrBlock;
pub use ip::{Ip, IpFamily};
