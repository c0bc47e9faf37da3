use std::fmt::{Display, Formatter};

use crate::location::LocationOption;

/// Error that may arise while configuring or persisting an access gate.
///
/// Matching never produces an error: a malformed access list entry simply never matches.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum GateError {
    /// The supplied text is not a valid IP address.
    InvalidAddress(String),
    /// The pattern of a protected location is not a valid regular expression.
    InvalidPattern(usize, String),
    /// The value supplied for the option `--bypass` is invalid.
    InvalidBypassValue(usize, String),
    /// The value supplied for the option `--log-level` is invalid.
    InvalidLogLevelValue(usize, String),
    /// An unknown option has been specified for a protected location.
    UnknownOption(usize, String),
    /// An empty option has been specified for a protected location.
    EmptyOption(usize, String),
    /// The same option has been specified multiple times for the same location.
    DuplicatedOption(usize, String),
    /// A configuration line carries options but no location pattern.
    MissingLocation(usize),
    /// The settings store could not be read or written.
    Storage(String),
    /// A configuration file could not be read.
    Io(String),
}

impl Display for GateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (l, err_info) = match self {
            GateError::InvalidAddress(addr) => (None, format!("invalid IP address '{addr}'")),
            GateError::InvalidPattern(l, pattern) => {
                (Some(l), format!("invalid location pattern '{pattern}'"))
            }
            GateError::InvalidBypassValue(l, val) => (
                Some(l),
                format!(
                    "incorrect value for option '{} {val}'",
                    LocationOption::BYPASS
                ),
            ),
            GateError::InvalidLogLevelValue(l, val) => (
                Some(l),
                format!(
                    "incorrect value for option '{} {val}'",
                    LocationOption::LOG_LEVEL
                ),
            ),
            GateError::UnknownOption(l, opt) => (
                Some(l),
                format!("the specified option '{opt}' doesn't exist"),
            ),
            GateError::EmptyOption(l, opt) => {
                (Some(l), format!("the supplied option '{opt}' is empty"))
            }
            GateError::DuplicatedOption(l, opt) => (
                Some(l),
                format!("duplicated option '{opt}' for the same location"),
            ),
            GateError::MissingLocation(l) => {
                (Some(l), "no location pattern supplied".to_string())
            }
            GateError::Storage(msg) => (None, format!("settings storage failure: {msg}")),
            GateError::Io(msg) => (None, format!("cannot read configuration: {msg}")),
        };

        match l {
            Some(l) => write!(f, "Access gate error at line {l} - {err_info}"),
            None => write!(f, "Access gate error - {err_info}"),
        }
    }
}

impl std::error::Error for GateError {}

impl From<rusqlite::Error> for GateError {
    fn from(err: rusqlite::Error) -> Self {
        GateError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        GateError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::GateError;

    #[test]
    fn test_gate_errors_display() {
        assert_eq!(
            GateError::InvalidAddress("1.2.3".to_owned()).to_string(),
            "Access gate error - invalid IP address '1.2.3'"
        );
        assert_eq!(
            GateError::InvalidPattern(3, "wp-(admin".to_owned()).to_string(),
            "Access gate error at line 3 - invalid location pattern 'wp-(admin'"
        );
        assert_eq!(
            GateError::InvalidBypassValue(4, ",".to_owned()).to_string(),
            "Access gate error at line 4 - incorrect value for option '--bypass ,'"
        );
        assert_eq!(
            GateError::InvalidLogLevelValue(28, "none".to_owned()).to_string(),
            "Access gate error at line 28 - incorrect value for option '--log-level none'"
        );
        assert_eq!(
            GateError::UnknownOption(2, "--proto".to_owned()).to_string(),
            "Access gate error at line 2 - the specified option '--proto' doesn't exist"
        );
        assert_eq!(
            GateError::EmptyOption(9, "--bypass".to_owned()).to_string(),
            "Access gate error at line 9 - the supplied option '--bypass' is empty"
        );
        assert_eq!(
            GateError::DuplicatedOption(1, "--log-level".to_owned()).to_string(),
            "Access gate error at line 1 - duplicated option '--log-level' for the same location"
        );
        assert_eq!(
            GateError::MissingLocation(7).to_string(),
            "Access gate error at line 7 - no location pattern supplied"
        );
        assert_eq!(
            GateError::Storage("disk I/O error".to_owned()).to_string(),
            "Access gate error - settings storage failure: disk I/O error"
        );
    }

    #[test]
    fn test_gate_error_from_io() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        assert_eq!(
            GateError::from(err),
            GateError::Io("no such file".to_owned())
        );
    }
}
