use crate::utils::address::{classify, dotted_value, parse_v4, AddressFamily};
use crate::utils::cidr::CidrBlock;

/// A single access list entry.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Rule {
    /// Line starting with `#`.
    Comment,
    /// A single IPv4 or IPv6 address.
    Exact(AddressFamily),
    /// Inclusive `start-end` range.
    Range(IpRange),
    /// `base/prefix` block.
    Cidr(CidrBlock),
    /// Anything that couldn't be understood; never matches.
    Invalid,
}

/// Both bounds of a range, kept as text and in every numeric form a candidate may need.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct IpRange {
    pub(crate) start: String,
    pub(crate) end: String,
    v4: Option<(u32, u32)>,
    dotted: Option<(u64, u64)>,
    v6: Option<([u32; 4], [u32; 4])>,
}

impl Rule {
    const COMMENT: char = '#';
    const RANGE_SEPARATOR: char = '-';
    const CIDR_SEPARATOR: char = '/';

    pub(crate) fn new(line: &str) -> Self {
        let line = line.trim();

        if line.starts_with(Self::COMMENT) {
            return Rule::Comment;
        }

        let family = classify(line);
        if family != AddressFamily::Invalid {
            return Rule::Exact(family);
        }

        // separators are only meaningful past the first character
        if line.find(Self::RANGE_SEPARATOR).is_some_and(|pos| pos > 0) {
            let mut bounds = line.split(Self::RANGE_SEPARATOR);
            let start = bounds.next().unwrap_or_default().trim();
            let end = bounds.next().unwrap_or_default().trim();
            return Rule::Range(IpRange::new(start, end));
        }

        if line.find(Self::CIDR_SEPARATOR).is_some_and(|pos| pos > 0) {
            if let Some(block) = CidrBlock::parse(line) {
                return Rule::Cidr(block);
            }
        }

        Rule::Invalid
    }

    /// Checks a candidate address against this entry.
    ///
    /// `family` must be the classification of `candidate`.
    pub(crate) fn matches(&self, candidate: &str, family: AddressFamily) -> bool {
        match self {
            Rule::Comment | Rule::Invalid => false,
            Rule::Exact(addr) => family != AddressFamily::Invalid && *addr == family,
            Rule::Range(range) => range.contains(candidate, family),
            Rule::Cidr(block) => block.matches(family),
        }
    }
}

impl IpRange {
    fn new(start: &str, end: &str) -> Self {
        let v4 = parse_v4(start)
            .ok()
            .zip(parse_v4(end).ok())
            .map(|(s, e)| (s.0, e.0));
        let dotted = dotted_value(start).zip(dotted_value(end));
        let v6 = match (classify(start), classify(end)) {
            (AddressFamily::V6(s), AddressFamily::V6(e)) => Some((s.0, e.0)),
            _ => None,
        };
        Self {
            start: start.to_owned(),
            end: end.to_owned(),
            v4,
            dotted,
            v6,
        }
    }

    fn contains(&self, candidate: &str, family: AddressFamily) -> bool {
        // textual equality with either bound needs no conversion at all
        if candidate == self.start || (!self.end.is_empty() && candidate == self.end) {
            return true;
        }

        match family {
            AddressFamily::V6(addr) => self.v6.is_some_and(|(start, end)| {
                // each word is bounded on its own, this is not a 128 bit comparison
                addr.0
                    .iter()
                    .zip(start.iter().zip(end.iter()))
                    .all(|(word, (lo, hi))| lo <= word && word <= hi)
            }),
            // a valid address only falls between two valid bounds
            AddressFamily::V4(addr) => self
                .v4
                .is_some_and(|(start, end)| start <= addr.0 && addr.0 <= end),
            // components above 255 carry over, so `1.2.3.256` sits right after `1.2.3.255`
            AddressFamily::Invalid => match (dotted_value(candidate), self.dotted) {
                (Some(value), Some((start, end))) => start <= value && value <= end,
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::address::{classify, parse_v4, AddressFamily};
    use crate::utils::cidr::{CidrBlock, Ipv4Cidr};
    use crate::utils::ip_rule::Rule;

    fn matches(rule: &str, candidate: &str) -> bool {
        Rule::new(rule).matches(candidate, classify(candidate))
    }

    #[test]
    fn test_new_rules() {
        assert_eq!(Rule::new("# office"), Rule::Comment);
        assert_eq!(Rule::new("  #1.1.1.1"), Rule::Comment);
        assert_eq!(Rule::new("1.1.1.1"), Rule::Exact(classify("1.1.1.1")));
        assert_eq!(Rule::new(" 1.1.1.1 "), Rule::Exact(classify("1.1.1.1")));
        assert_eq!(Rule::new("aaaa::ffff"), Rule::Exact(classify("aaaa::ffff")));
        assert_eq!(
            Rule::new("1.1.1.1/32"),
            Rule::Cidr(CidrBlock::V4(Ipv4Cidr {
                base: parse_v4("1.1.1.1").unwrap(),
                prefix: 32
            }))
        );
        assert_eq!(Rule::new("aaaa::/16"), Rule::Cidr(CidrBlock::V6));
        assert_eq!(Rule::new("hello"), Rule::Invalid);
        assert_eq!(Rule::new(""), Rule::Invalid);
        assert_eq!(Rule::new("-1.1.1.1"), Rule::Invalid);
        assert_eq!(Rule::new("/24"), Rule::Invalid);
        assert_eq!(Rule::new("1.1.1.1/40"), Rule::Invalid);

        if let Rule::Range(range) = Rule::new("1.1.1.1-1.1.1.8") {
            assert_eq!(range.start, "1.1.1.1");
            assert_eq!(range.end, "1.1.1.8");
        } else {
            panic!("expected a range");
        }

        // extra bounds are ignored
        if let Rule::Range(range) = Rule::new("1.1.1.1-1.1.1.8-1.1.1.9") {
            assert_eq!(range.start, "1.1.1.1");
            assert_eq!(range.end, "1.1.1.8");
        } else {
            panic!("expected a range");
        }
    }

    #[test]
    fn test_exact_rules() {
        assert!(matches("69.36.132.250", "69.36.132.250"));
        assert!(!matches("69.36.132.250", "69.36.132.251"));
        assert!(matches("0:0:0:0:0:ffff:192.1.56.200", "0:0:0:0:0:ffff:192.1.56.200"));
        assert!(matches("::ffff:192.1.56.200", "0:0:0:0:0:ffff:192.1.56.200"));
        // families never mix
        assert!(!matches("192.1.56.200", "::ffff:192.1.56.200"));
        assert!(!matches("::1", "hello"));
    }

    #[test]
    fn test_ipv4_range_rules() {
        let rule = "69.36.132.255-69.36.132.257";
        assert!(matches(rule, "69.36.132.255"));
        assert!(matches(rule, "69.36.132.256"));
        assert!(matches(rule, "69.36.132.257"));
        assert!(!matches(rule, "69.36.132.249"));
        assert!(!matches(rule, "69.36.132.254"));
        assert!(!matches(rule, "69.36.133.2"));

        let rule = "10.0.0.1 - 10.0.0.255";
        assert!(matches(rule, "10.0.0.1"));
        assert!(matches(rule, "10.0.0.128"));
        assert!(!matches(rule, "10.0.0.0"));
        assert!(!matches(rule, "10.0.1.0"));
    }

    #[test]
    fn test_malformed_bound_never_admits_valid_addresses() {
        let rule = "10.0.0.1-10.0.0.999";
        assert!(matches(rule, "10.0.0.1"));
        assert!(!matches(rule, "10.0.0.2"));
        assert!(!matches(rule, "10.0.3.200"));
        assert!(!matches(rule, "10.0.0.255"));

        let rule = "69.36.132.255-69.36.132.257";
        assert!(!matches(rule, "69.36.133.0"));
        assert!(!matches(rule, "69.36.133.1"));
        // out of range components are only compared positionally
        assert!(matches(rule, "69.36.132.256"));
        assert!(!matches(rule, "69.36.132.258"));
    }

    #[test]
    fn test_range_bounds_compare_as_unsigned() {
        let rule = "127.255.255.250-128.0.0.5";
        assert!(matches(rule, "127.255.255.255"));
        assert!(matches(rule, "128.0.0.0"));
        assert!(!matches(rule, "128.0.0.6"));

        let rule = "200.0.0.0-255.255.255.255";
        assert!(matches(rule, "250.1.2.3"));
        assert!(!matches(rule, "100.1.2.3"));
    }

    #[test]
    fn test_range_fast_path() {
        // textual equality short-circuits even when the other bound is garbage
        assert!(matches("1.1.1.1-garbage", "1.1.1.1"));
        assert!(matches("garbage-1.1.1.1", "1.1.1.1"));
        assert!(!matches("1.1.1.0-garbage", "1.1.1.1"));
        // an empty end only compares the start
        assert!(matches("1.1.1.1-", "1.1.1.1"));
        assert!(!matches("1.1.1.1-", "1.1.1.2"));
    }

    #[test]
    fn test_ipv6_range_rules() {
        let rule = "0:0:0:0:0:ffff:192.1.56.10-0:0:0:0:0:ffff:192.1.56.101";
        assert!(matches(rule, "0:0:0:0:0:ffff:192.1.56.100"));
        assert!(matches(rule, "::ffff:192.1.56.10"));
        assert!(matches(rule, "0:0:0:0:0:ffff:192.1.56.101"));
        assert!(!matches(rule, "0:0:0:0:0:ffff:192.1.56.1"));
        assert!(!matches(rule, "0:0:0:0:0:ffff:192.1.56.102"));
        // an IPv4 candidate never falls in an IPv6 range
        assert!(!matches(rule, "192.1.56.100"));
    }

    #[test]
    fn test_ipv6_range_is_bounded_word_by_word() {
        let rule = "1:0:0:0:0:0:0:5-2:0:0:0:0:0:0:9";
        // numerically between the bounds, but the last word is below its own start
        assert!(!matches(rule, "1:ffff:0:0:0:0:0:0"));
        assert!(!matches(rule, "2:0:0:0:0:0:0:1"));
        // every word within bounds
        assert!(matches(rule, "1:0:0:0:0:0:0:7"));
        assert!(matches(rule, "2:0:0:0:0:0:0:5"));

        // words are 32 bits wide: `::2:0` has last word 0x0002_0000
        let rule = "::1:fff0-::2:10";
        assert!(matches(rule, "::2:0"));
        assert!(matches(rule, "::1:fff5"));
        assert!(!matches(rule, "::2:11"));

        let rule = "0:0:0:1:0:0:0:0-0:0:0:2:0:0:0:ffff";
        assert!(matches(rule, "0:0:0:1:0:0:0:ffff"));
        assert!(!matches(rule, "0:0:0:1:0:0:1:0"));
    }

    #[test]
    fn test_mixed_family_ranges() {
        assert!(!matches("1.1.1.1-::5", "1.1.1.2"));
        assert!(!matches("::1-1.1.1.1", "::2"));
        assert!(!matches("1.1.1.1-1.1.1.9", "::2"));
    }

    #[test]
    fn test_cidr_and_invalid_rules() {
        assert!(matches("69.36.132.252/31", "69.36.132.253"));
        assert!(!matches("69.36.132.252/31", "69.36.132.254"));
        assert!(!matches("aaaa::/16", "aaaa::1"));
        assert!(!matches("hello", "hello"));
        assert!(!Rule::Comment.matches("1.1.1.1", classify("1.1.1.1")));
        assert!(!Rule::new("# 1.1.1.1").matches("# 1.1.1.1", AddressFamily::Invalid));
    }
}
