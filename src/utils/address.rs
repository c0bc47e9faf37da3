use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::GateError;

/// IPv4 address as a 32 bit integer in natural (big-endian) order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Ipv4Address(pub u32);

/// IPv6 address as four 32 bit words in network order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ipv6Address(pub [u32; 4]);

/// Result of classifying a piece of text as an IP address.
///
/// Produced once per candidate and passed down to every rule, so that
/// the text is never validated twice.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AddressFamily {
    /// A strictly valid dotted-quad IPv4 address.
    V4(Ipv4Address),
    /// A strictly valid IPv6 address, embedded IPv4 tails included.
    V6(Ipv6Address),
    /// Anything else.
    Invalid,
}

/// Parses a dotted-quad IPv4 address.
///
/// Octets must be decimal, in `0..=255` and without leading zeros.
///
/// # Errors
///
/// Will return [`GateError::InvalidAddress`] if the text is not a valid IPv4 address.
pub fn parse_v4(text: &str) -> Result<Ipv4Address, GateError> {
    Ipv4Addr::from_str(text)
        .map(|addr| Ipv4Address(u32::from(addr)))
        .map_err(|_| GateError::InvalidAddress(text.to_owned()))
}

/// Parses an IPv6 address into its four 32 bit words.
///
/// Compressed (`::`) and IPv4-mapped (`::ffff:192.1.56.200`) notations are accepted.
///
/// # Errors
///
/// Will return [`GateError::InvalidAddress`] if the text is not a valid IPv6 address.
pub fn parse_v6(text: &str) -> Result<Ipv6Address, GateError> {
    let addr = Ipv6Addr::from_str(text).map_err(|_| GateError::InvalidAddress(text.to_owned()))?;
    let octets = addr.octets();
    let mut words = [0_u32; 4];
    for (word, chunk) in words.iter_mut().zip(octets.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(Ipv6Address(words))
}

/// Classifies a piece of text, trying IPv4 first and IPv6 second.
#[must_use]
pub fn classify(text: &str) -> AddressFamily {
    if let Ok(v4) = parse_v4(text) {
        AddressFamily::V4(v4)
    } else if let Ok(v6) = parse_v6(text) {
        AddressFamily::V6(v6)
    } else {
        AddressFamily::Invalid
    }
}

/// Positional value of a dotted quad.
///
/// Only used to place text that isn't a valid IPv4 address within a range.
///
/// Every component is one to three decimal digits; values above 255 carry
/// into the next position (`1.2.3.256` has the same value as `1.2.4.0`).
/// For a valid IPv4 address this is the same number [`parse_v4`] returns.
pub(crate) fn dotted_value(text: &str) -> Option<u64> {
    let mut parts = text.split('.');
    let mut value = 0_u64;
    for _ in 0..4 {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        value = value * 256 + u64::from_str(part).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(value)
}
