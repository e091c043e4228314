use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;

use crate::error::{BblError, Result};
use crate::network::ip::{Ip, IpFamily};

/// A CIDR range anchored at the address it was written with.
///
/// The first IP is the parsed address itself (not masked down to the network
/// boundary), so `10.0.16.7/20` starts at `10.0.16.7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CidrBlock {
    first_ip: Ip,
    prefix_len: u8,
}

impl CidrBlock {
    pub fn parse(text: &str) -> Result<Self> {
        let (address, prefix) = text
            .split_once('/')
            .filter(|(_, prefix)| !prefix.contains('/'))
            .ok_or_else(|| cidr_parse_error(text))?;

        let first_ip = Ip::parse(address).map_err(|_| cidr_parse_error(text))?;
        let digits = prefix.strip_prefix('-').unwrap_or(prefix);
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(cidr_parse_error(text));
        }

        let bits = first_ip.family().bits();
        let prefix_len = prefix
            .parse::<u8>()
            .ok()
            .filter(|len| IpNet::new(IpAddr::from(first_ip), *len).is_ok())
            .ok_or_else(|| {
                BblError::Range(format!(
                    "mask bits out of range in CIDR block {text}: {prefix} (expected 0..={bits})"
                ))
            })?;

        Ok(Self {
            first_ip,
            prefix_len,
        })
    }

    pub fn family(&self) -> IpFamily {
        self.first_ip.family()
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn host_bits(&self) -> u32 {
        self.family().bits() - self.prefix_len as u32
    }

    /// Number of addresses in the block, `2^(family bits - prefix)`.
    /// Saturates at `u128::MAX` for `::/0`, the one block too large to count.
    pub fn size(&self) -> u128 {
        1u128.checked_shl(self.host_bits()).unwrap_or(u128::MAX)
    }

    pub fn first_ip(&self) -> Ip {
        self.first_ip
    }

    pub fn last_ip(&self) -> Ip {
        let span = match self.host_bits() {
            128 => u128::MAX,
            bits => (1u128 << bits) - 1,
        };
        self.first_ip.add(span)
    }

    pub fn nth_ip(&self, k: u128) -> Ip {
        self.first_ip.add(k)
    }

    pub fn contains(&self, ip: &Ip) -> bool {
        if ip.family() != self.family() {
            return false;
        }
        let offset = ip.to_u128().wrapping_sub(self.first_ip.to_u128());
        match self.host_bits() {
            128 => true,
            bits => ip.to_u128() >= self.first_ip.to_u128() && offset < (1u128 << bits),
        }
    }

    /// The canonical network this block falls in, host bits cleared.
    pub fn to_ipnet(&self) -> IpNet {
        IpNet::new(IpAddr::from(self.first_ip), self.prefix_len)
            .map(|net| net.trunc())
            .unwrap_or_else(|_| IpNet::from(IpAddr::from(self.first_ip)))
    }
}

fn cidr_parse_error(text: &str) -> BblError {
    BblError::parse("CIDR block", text)
}

impl FromStr for CidrBlock {
    type Err = BblError;

    fn from_str(s: &str) -> Result<Self> {
        CidrBlock::parse(s)
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.first_ip, self.prefix_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_v4_bounds() {
        let block = CidrBlock::parse("10.0.16.0/20").unwrap();
        assert_eq!(block.first_ip().to_string(), "10.0.16.0");
        assert_eq!(block.nth_ip(6).to_string(), "10.0.16.6");
        assert_eq!(block.last_ip().to_string(), "10.0.31.255");
        assert_eq!(block.size(), 4096);
    }

    #[test]
    fn computes_v6_bounds() {
        let block = CidrBlock::parse("2001:db8:cf::/80").unwrap();
        assert_eq!(block.first_ip().to_string(), "2001:db8:cf::");
        assert_eq!(block.nth_ip(6).to_string(), "2001:db8:cf::6");
        assert_eq!(block.last_ip().to_string(), "2001:db8:cf::ffff:ffff:ffff");
    }

    #[test]
    fn whole_v6_space_saturates_size() {
        let block = CidrBlock::parse("::/0").unwrap();
        assert_eq!(block.size(), u128::MAX);
        assert_eq!(
            block.last_ip().to_string(),
            "ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff"
        );
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in [
            "some-bad-cidr-block",
            "10.0.0.0",
            "10.0.0.0/",
            "/24",
            "10.0.0.0/24/1",
            "10.0.0.0/x",
            "10.0.0/24",
        ] {
            let err = CidrBlock::parse(bad).expect_err(bad);
            assert!(
                matches!(err, BblError::Parse { .. }),
                "{bad} should be a parse error, got {err:?}"
            );
            assert!(format!("{err}").contains("cannot parse CIDR block"));
        }
    }

    #[test]
    fn rejects_out_of_range_prefix() {
        for bad in [
            "10.0.0.0/33",
            "10.0.0.0/-1",
            "2001:db8::/129",
            "10.0.0.0/300",
            "10.0.0.0/99999999999999999999",
            "10.0.0.0/-99999999999999999999",
        ] {
            let err = CidrBlock::parse(bad).expect_err(bad);
            assert!(matches!(err, BblError::Range(_)), "{bad}: {err:?}");
        }
    }

    #[test]
    fn containment_and_ipnet() {
        let block = CidrBlock::parse("10.0.16.0/20").unwrap();
        assert!(block.contains(&Ip::parse("10.0.31.255").unwrap()));
        assert!(!block.contains(&Ip::parse("10.0.32.0").unwrap()));
        assert!(!block.contains(&Ip::parse("::1").unwrap()));
        assert_eq!(block.to_ipnet().to_string(), "10.0.16.0/20");
    }
}
