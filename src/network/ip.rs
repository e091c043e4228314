use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{BblError, Result};

/// Address family of an [`Ip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    pub fn bits(&self) -> u32 {
        match self {
            IpFamily::V4 => 32,
            IpFamily::V6 => 128,
        }
    }

    fn mask(&self) -> u128 {
        match self {
            IpFamily::V4 => u32::MAX as u128,
            IpFamily::V6 => u128::MAX,
        }
    }
}

/// An IPv4 or IPv6 address held as the low bits of a 128-bit integer.
///
/// Arithmetic wraps inside the address space of the family, so stepping past
/// `255.255.255.255` lands on `0.0.0.0`. Callers that care about crossing the
/// boundary use [`Ip::checked_add`] / [`Ip::checked_sub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ip {
    family: IpFamily,
    value: u128,
}

impl Ip {
    pub fn v4(addr: Ipv4Addr) -> Self {
        Self {
            family: IpFamily::V4,
            value: u32::from(addr) as u128,
        }
    }

    pub fn v6(addr: Ipv6Addr) -> Self {
        Self {
            family: IpFamily::V6,
            value: u128::from(addr),
        }
    }

    /// Parses dotted-quad or colon-hex text. Scope zones (`fe80::1%eth0`) and
    /// surplus octets are rejected.
    pub fn parse(text: &str) -> Result<Self> {
        text.parse::<IpAddr>()
            .map(Self::from)
            .map_err(|_| BblError::parse("IP address", text))
    }

    pub fn family(&self) -> IpFamily {
        self.family
    }

    pub fn to_u128(&self) -> u128 {
        self.value
    }

    pub fn add(&self, n: u128) -> Self {
        self.with_value(self.value.wrapping_add(n))
    }

    pub fn subtract(&self, n: u128) -> Self {
        self.with_value(self.value.wrapping_sub(n))
    }

    pub fn checked_add(&self, n: u128) -> Option<Self> {
        let value = self.value.checked_add(n)?;
        (value <= self.family.mask()).then(|| self.with_value(value))
    }

    pub fn checked_sub(&self, n: u128) -> Option<Self> {
        self.value.checked_sub(n).map(|value| self.with_value(value))
    }

    fn with_value(&self, value: u128) -> Self {
        Self {
            family: self.family,
            value: value & self.family.mask(),
        }
    }
}

impl From<IpAddr> for Ip {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => Ip::v4(v4),
            IpAddr::V6(v6) => Ip::v6(v6),
        }
    }
}

impl From<Ip> for IpAddr {
    fn from(ip: Ip) -> Self {
        match ip.family {
            IpFamily::V4 => IpAddr::V4(Ipv4Addr::from(ip.value as u32)),
            IpFamily::V6 => IpAddr::V6(Ipv6Addr::from(ip.value)),
        }
    }
}

impl FromStr for Ip {
    type Err = BblError;

    fn from_str(s: &str) -> Result<Self> {
        Ip::parse(s)
    }
}

// std renders IPv6 per RFC 5952: the longest zero run collapses to `::`,
// the earliest run wins a tie, and a lone zero group is never collapsed.
impl fmt::Display for Ip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        IpAddr::from(*self).fmt(f)
    }
}

impl Serialize for Ip {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ip {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ip::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_families() {
        assert_eq!(Ip::parse("10.0.16.1").unwrap().family(), IpFamily::V4);
        assert_eq!(Ip::parse("2001:db8::1").unwrap().family(), IpFamily::V6);
    }

    #[test]
    fn rejects_zones_and_surplus_digits() {
        for bad in ["fe80::1%eth0", "1.2.3.4.5", "256.0.0.1", "10.0.0", "", "1.2.3.4 "] {
            let err = Ip::parse(bad).expect_err(bad);
            assert!(format!("{err}").contains("cannot parse IP address"));
        }
    }

    #[test]
    fn add_and_subtract_carry_across_octets() {
        let ip = Ip::parse("10.0.0.255").unwrap();
        assert_eq!(ip.add(1).to_string(), "10.0.1.0");
        assert_eq!(ip.add(1).subtract(2).to_string(), "10.0.0.254");
    }

    #[test]
    fn v4_wraps_inside_family() {
        let top = Ip::parse("255.255.255.255").unwrap();
        assert_eq!(top.add(1).to_string(), "0.0.0.0");
        assert!(top.checked_add(1).is_none());
        assert!(Ip::parse("0.0.0.0").unwrap().checked_sub(1).is_none());
    }

    #[test]
    fn v6_display_is_compressed() {
        let ip = Ip::parse("2001:0db8:0000:0000:0001:0000:0000:0001").unwrap();
        assert_eq!(ip.to_string(), "2001:db8::1:0:0:1");
        let ip = Ip::parse("2001:db8:0:1:1:1:1:1").unwrap();
        assert_eq!(ip.to_string(), "2001:db8:0:1:1:1:1:1");
    }
}
