//! Random IP addresses within a CIDR range for `random_ip`.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use rand::Rng;

use super::{with_secure_rng, RandomError};

/// IP address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    /// IPv4.
    V4,
    /// IPv6.
    V6,
}

impl AddressType {
    /// The range covering every address of this family.
    pub fn default_cidr(self) -> &'static str {
        match self {
            Self::V4 => "0.0.0.0/0",
            Self::V6 => "::/0",
        }
    }

    fn max_prefix(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }
}

impl FromStr for AddressType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ipv4" => Ok(Self::V4),
            "ipv6" => Ok(Self::V6),
            other => Err(format!("unsupported address type {:?}", other)),
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => f.write_str("ipv4"),
            Self::V6 => f.write_str("ipv6"),
        }
    }
}

/// A parsed `address/prefix` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cidr {
    /// Any address inside the range.
    pub address: IpAddr,
    /// Number of fixed leading bits.
    pub prefix: u8,
}

impl Cidr {
    /// Parse `range` and check that it belongs to `family`.
    pub fn parse(range: &str, family: AddressType) -> Result<Self, RandomError> {
        let invalid = |reason: String| RandomError::InvalidCidr {
            range: range.to_string(),
            reason,
        };

        let (addr, prefix) = range
            .split_once('/')
            .ok_or_else(|| invalid("expected address/prefix".to_string()))?;
        let address: IpAddr = addr
            .parse()
            .map_err(|e| invalid(format!("bad address: {}", e)))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|e| invalid(format!("bad prefix length: {}", e)))?;

        let actual = match address {
            IpAddr::V4(_) => AddressType::V4,
            IpAddr::V6(_) => AddressType::V6,
        };
        if actual != family {
            return Err(invalid(format!(
                "address is {} but address_type is {}",
                actual, family
            )));
        }
        if prefix > family.max_prefix() {
            return Err(invalid(format!(
                "prefix length {} exceeds {}",
                prefix,
                family.max_prefix()
            )));
        }

        Ok(Self { address, prefix })
    }
}

/// An address inside `cidr` with the host bits drawn from `rng`.
pub fn random_address_with<R: Rng + ?Sized>(rng: &mut R, cidr: Cidr) -> IpAddr {
    match cidr.address {
        IpAddr::V4(net) => {
            let mask = u32::MAX.checked_shl(32 - cidr.prefix as u32).unwrap_or(0);
            let host: u32 = rng.gen();
            let addr = (u32::from(net) & mask) | (host & !mask);
            IpAddr::V4(Ipv4Addr::from(addr))
        },
        IpAddr::V6(net) => {
            let mask = u128::MAX.checked_shl(128 - cidr.prefix as u32).unwrap_or(0);
            let host: u128 = rng.gen();
            let addr = (u128::from(net) & mask) | (host & !mask);
            IpAddr::V6(Ipv6Addr::from(addr))
        },
    }
}

/// A random address of `family` inside `range`, or anywhere when no range is given.
pub fn random_address(family: AddressType, range: Option<&str>) -> Result<IpAddr, RandomError> {
    let cidr = Cidr::parse(range.unwrap_or(family.default_cidr()), family)?;
    with_secure_rng(|rng| Ok(random_address_with(rng, cidr)))
}
