//! IP address values for the `ip` extension.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::net::IpAddr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid IP address literal `{0}`")]
pub struct ParseIPAddrError(pub String);

/// A CIDR prefix: an address plus a prefix length.
///
/// A bare address parses as a /32 (IPv4) or /128 (IPv6) prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IPAddr {
    addr: IpAddr,
    prefix: u8,
}

impl IPAddr {
    pub fn parse(literal: &str) -> Result<Self, ParseIPAddrError> {
        let err = || ParseIPAddrError(literal.to_string());
        let (addr_text, prefix_text) = match literal.split_once('/') {
            Some((a, p)) => (a, Some(p)),
            None => (literal, None),
        };
        let addr: IpAddr = addr_text.parse().map_err(|_| err())?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        let prefix = match prefix_text {
            Some(p) => {
                // Reject forms like "/ 8", "/+8", "/08" the integer parser
                // would otherwise wave through or misread.
                if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(err());
                }
                p.parse::<u8>().map_err(|_| err())?
            }
            None => max,
        };
        if prefix > max {
            return Err(err());
        }
        Ok(IPAddr { addr, prefix })
    }

    pub fn is_ipv4(&self) -> bool {
        self.addr.is_ipv4()
    }

    pub fn is_ipv6(&self) -> bool {
        self.addr.is_ipv6()
    }

    pub fn is_loopback(&self) -> bool {
        self.addr.is_loopback()
    }

    pub fn is_multicast(&self) -> bool {
        self.addr.is_multicast()
    }

    /// True iff `self`'s prefix lies entirely inside `range`'s prefix.
    pub fn in_range(&self, range: &IPAddr) -> bool {
        if self.addr.is_ipv4() != range.addr.is_ipv4() || self.prefix < range.prefix {
            return false;
        }
        match (self.network_bits(range.prefix), range.network_bits(range.prefix)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// The address's top `prefix` bits, widened to u128; `None` when the
    /// requested prefix cannot apply to this address family.
    fn network_bits(&self, prefix: u8) -> Option<u128> {
        match self.addr {
            IpAddr::V4(v4) => {
                if prefix > 32 {
                    return None;
                }
                let bits = u32::from(v4);
                let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
                Some(u128::from(bits & mask))
            }
            IpAddr::V6(v6) => {
                let bits = u128::from(v6);
                let mask = if prefix == 0 {
                    0
                } else {
                    u128::MAX << (128 - prefix)
                };
                Some(bits & mask)
            }
        }
    }

    fn is_single_address(&self) -> bool {
        self.prefix == if self.addr.is_ipv4() { 32 } else { 128 }
    }
}

impl Display for IPAddr {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.is_single_address() {
            write!(f, "{}", self.addr)
        } else {
            write!(f, "{}/{}", self.addr, self.prefix)
        }
    }
}
