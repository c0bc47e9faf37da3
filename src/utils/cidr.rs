use std::str::FromStr;
use std::sync::Once;

use log::warn;

use crate::utils::address::{classify, parse_v4, AddressFamily, Ipv4Address};

static IPV6_CIDR_WARNING: Once = Once::new();

/// An IPv4 block in `base/prefix` notation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Ipv4Cidr {
    pub(crate) base: Ipv4Address,
    pub(crate) prefix: u8,
}

/// CIDR entry of an access list.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum CidrBlock {
    V4(Ipv4Cidr),
    /// IPv6 blocks are recognised but never match.
    V6,
}

impl Ipv4Cidr {
    const SEPARATOR: char = '/';
    const MAX_PREFIX: u8 = 32;

    pub(crate) fn parse(text: &str) -> Option<Self> {
        let (base, prefix) = text.split_once(Self::SEPARATOR)?;
        let base = parse_v4(base).ok()?;
        if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let prefix = u8::from_str(prefix).ok()?;
        if prefix > Self::MAX_PREFIX {
            return None;
        }
        Some(Self { base, prefix })
    }

    /// All ones with the low `32 - prefix` bits cleared.
    pub(crate) fn mask(&self) -> u32 {
        u32::MAX
            .checked_shl(u32::from(Self::MAX_PREFIX - self.prefix))
            .unwrap_or(0)
    }

    pub(crate) fn contains(&self, candidate: Ipv4Address) -> bool {
        let mask = self.mask();
        candidate.0 & mask == self.base.0 & mask
    }
}

impl CidrBlock {
    pub(crate) fn parse(text: &str) -> Option<Self> {
        if let Some(cidr) = Ipv4Cidr::parse(text) {
            return Some(CidrBlock::V4(cidr));
        }
        let (base, _) = text.split_once(Ipv4Cidr::SEPARATOR)?;
        match classify(base) {
            AddressFamily::V6(_) => Some(CidrBlock::V6),
            _ => None,
        }
    }

    pub(crate) fn matches(&self, candidate: AddressFamily) -> bool {
        match (self, candidate) {
            (CidrBlock::V4(cidr), AddressFamily::V4(addr)) => cidr.contains(addr),
            (_, AddressFamily::V6(_)) => {
                IPV6_CIDR_WARNING.call_once(|| {
                    warn!("IPv6 CIDR matching is not implemented, such entries never match IPv6 addresses");
                });
                false
            }
            _ => false,
        }
    }
}

/// Checks whether `candidate` lies in the IPv4 block described by `cidr_text`.
///
/// Anything that isn't an IPv4 candidate inside a well-formed IPv4 block yields `false`.
///
/// # Examples
///
/// ```
/// use ip_access_gate::in_cidr;
///
/// assert!(in_cidr("69.36.132.253", "69.36.132.252/31"));
/// assert!(!in_cidr("69.36.132.254", "69.36.132.252/31"));
/// ```
#[must_use]
pub fn in_cidr(candidate: &str, cidr_text: &str) -> bool {
    CidrBlock::parse(cidr_text).is_some_and(|block| block.matches(classify(candidate)))
}
