use std::fs::File;
use std::io::{BufRead, BufReader};

use log::debug;

use crate::request::RequestContext;
use crate::utils::address::classify;
use crate::utils::ip_rule::Rule;
use crate::GateError;

/// Ordered list of permitted addresses, ranges and CIDR blocks.
///
/// Each line is one of:
/// - a single address (`1.1.1.1`, `aaaa::ffff`)
/// - an inclusive range (`1.1.1.1-1.1.1.8`)
/// - an IPv4 CIDR block (`1.1.1.1/32`)
/// - a comment (`# office network`)
///
/// Lines that fit none of these are kept for display but never match.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct AccessList {
    lines: Vec<String>,
    rules: Vec<Rule>,
}

impl AccessList {
    /// Parses an access list from its raw lines.
    ///
    /// Parsing never fails: entries that can't be understood simply never match.
    ///
    /// # Examples
    ///
    /// ```
    /// use ip_access_gate::AccessList;
    ///
    /// let list = AccessList::parse(["# office", "1.1.1.1-1.1.1.8", "10.0.0.0/8"]);
    /// assert_eq!(list.lines().len(), 3);
    /// ```
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = AccessList::default();
        for line in lines {
            let line = line.as_ref();
            let rule = Rule::new(line);
            if rule == Rule::Invalid {
                debug!("access list entry '{line}' is not an address, range or CIDR");
            }
            list.lines.push(line.to_owned());
            list.rules.push(rule);
        }
        list
    }

    /// Loads an access list from a text file with one entry per line.
    ///
    /// # Errors
    ///
    /// Will return a [`GateError::Io`] if the file can't be read.
    pub fn from_file(file_path: &str) -> Result<Self, GateError> {
        let file = File::open(file_path)?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<String>, _>>()?;
        Ok(Self::parse(lines))
    }

    /// The raw lines, in their original order.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// An access list is empty when it has no lines at all.
    ///
    /// A list made only of comments is not empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Checks if an address is permitted by at least one entry of the list.
    ///
    /// Returns `false` for an empty candidate or an empty list.
    ///
    /// # Examples
    ///
    /// ```
    /// use ip_access_gate::AccessList;
    ///
    /// let list = AccessList::parse(["69.36.132.252/31", "69.36.132.250"]);
    /// assert!(list.is_permitted("69.36.132.253"));
    /// assert!(!list.is_permitted("69.36.132.254"));
    /// ```
    #[must_use]
    pub fn is_permitted(&self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }

        let family = classify(candidate);
        self.rules
            .iter()
            .filter(|rule| **rule != Rule::Comment)
            .any(|rule| rule.matches(candidate, family))
    }

    /// Checks the remote address of a request.
    ///
    /// A request without a remote address is never permitted.
    #[must_use]
    pub fn is_permitted_request(&self, request: &RequestContext) -> bool {
        request
            .remote_addr()
            .is_some_and(|addr| self.is_permitted(addr))
    }
}

/// Checks an address against raw access list lines.
///
/// # Examples
///
/// ```
/// use ip_access_gate::is_permitted;
///
/// assert!(is_permitted("69.36.132.250", &["69.36.132.250"]));
/// assert!(!is_permitted("69.36.132.250", &[] as &[&str]));
/// ```
#[must_use]
pub fn is_permitted<S: AsRef<str>>(candidate: &str, rules: &[S]) -> bool {
    AccessList::parse(rules).is_permitted(candidate)
}
