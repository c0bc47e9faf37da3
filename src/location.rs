use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};

use regex::Regex;

use crate::{GateError, LogLevel};

/// Locations guarded by the access list unless configured otherwise.
pub const DEFAULT_LOCATIONS: [&str; 5] = [
    "wp-login.php",
    "wp-admin",
    "wp-activate.php",
    "wp-links-opml.php",
    "wp-trackback.php",
];

/// Bypass tokens of the default locations.
pub const DEFAULT_BYPASSES: [(&str, &[&str]); 1] = [("wp-login.php", &["?action=postpass"])];

/// Options associated to a protected location in a configuration file.
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum LocationOption {
    /// Substrings of the path that lift the protection
    Bypass(Vec<String>),
    /// Log level for decisions taken on this location
    LogLevel(LogLevel),
}

impl LocationOption {
    pub(crate) const BYPASS: &'static str = "--bypass";
    pub(crate) const LOG_LEVEL: &'static str = "--log-level";

    const SEPARATOR: char = ',';

    fn new(l: usize, option: &str, value: &str) -> Result<Self, GateError> {
        Ok(match option {
            LocationOption::BYPASS => {
                let tokens: Vec<String> = value
                    .split(Self::SEPARATOR)
                    .map(ToOwned::to_owned)
                    .collect();
                if tokens.iter().any(String::is_empty) {
                    return Err(GateError::InvalidBypassValue(l, value.to_owned()));
                }
                Self::Bypass(tokens)
            }
            LocationOption::LOG_LEVEL => Self::LogLevel(LogLevel::from_str_with_line(l, value)?),
            x => return Err(GateError::UnknownOption(l, x.to_owned())),
        })
    }

    fn to_option_str(&self) -> &'static str {
        match self {
            LocationOption::Bypass(_) => LocationOption::BYPASS,
            LocationOption::LogLevel(_) => LocationOption::LOG_LEVEL,
        }
    }
}

/// A location of the site that only listed addresses may reach.
#[derive(Debug, Clone)]
pub struct ProtectedLocation {
    pattern: String,
    regex: Regex,
    bypasses: Vec<String>,
    log_level: Option<LogLevel>,
}

impl ProtectedLocation {
    const SEPARATOR: char = ' ';
    const OPTION_PREFIX: &'static str = "--";

    /// Creates a protected location from a pattern and its bypass tokens.
    ///
    /// The pattern is a regular expression searched anywhere in the request path,
    /// so `wp-admin` also protects `/blog/wp-admin/edit.php`.
    /// A bypass token lifts the protection when it appears anywhere in the path.
    ///
    /// # Errors
    ///
    /// Will return a [`GateError::InvalidPattern`] if `pattern` is not a valid regular expression.
    pub fn new(pattern: &str, bypasses: &[&str]) -> Result<Self, GateError> {
        Self::with_line(0, pattern, bypasses.iter().map(|b| (*b).to_owned()).collect(), None)
    }

    fn with_line(
        l: usize,
        pattern: &str,
        bypasses: Vec<String>,
        log_level: Option<LogLevel>,
    ) -> Result<Self, GateError> {
        let regex =
            Regex::new(pattern).map_err(|_| GateError::InvalidPattern(l, pattern.to_owned()))?;
        Ok(Self {
            pattern: pattern.to_owned(),
            regex,
            bypasses,
            log_level,
        })
    }

    /// Parses a configuration line such as `wp-login.php --bypass ?action=postpass --log-level db`.
    pub(crate) fn from_line(l: usize, line: &str) -> Result<Self, GateError> {
        let mut parts = line.split(Self::SEPARATOR).filter(|s| !s.is_empty());

        let pattern = parts.next().ok_or(GateError::MissingLocation(l))?;
        if pattern.starts_with(Self::OPTION_PREFIX) {
            return Err(GateError::MissingLocation(l));
        }

        let mut seen = HashSet::new();
        let mut bypasses = Vec::new();
        let mut log_level = None;
        while let Some(option_str) = parts.next() {
            let value = parts
                .next()
                .ok_or(GateError::EmptyOption(l, option_str.to_owned()))?;
            let option = LocationOption::new(l, option_str, value)?;
            if !seen.insert(option.to_option_str()) {
                return Err(GateError::DuplicatedOption(
                    l,
                    option.to_option_str().to_owned(),
                ));
            }
            match option {
                LocationOption::Bypass(tokens) => bypasses = tokens,
                LocationOption::LogLevel(level) => log_level = Some(level),
            }
        }

        Self::with_line(l, pattern, bypasses, log_level)
    }

    /// Overrides the gate log level for decisions taken on this location.
    #[must_use]
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = Some(log_level);
        self
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn bypasses(&self) -> &[String] {
        &self.bypasses
    }

    #[must_use]
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
    }

    /// Checks if the pattern matches anywhere in `path`.
    ///
    /// The test is loose on purpose: it errs towards protecting too much.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Checks if any bypass token appears in `path`.
    #[must_use]
    pub fn is_bypassed(&self, path: &str) -> bool {
        self.bypasses.iter().any(|token| path.contains(token.as_str()))
    }
}

impl PartialEq for ProtectedLocation {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.bypasses == other.bypasses
            && self.log_level == other.log_level
    }
}

impl Eq for ProtectedLocation {}

/// Static configuration of an [`AccessGate`](crate::AccessGate): the protected locations.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GateConfig {
    locations: Vec<ProtectedLocation>,
}

impl GateConfig {
    const COMMENT: char = '#';

    /// Creates a configuration from an explicit set of locations.
    #[must_use]
    pub fn new(locations: Vec<ProtectedLocation>) -> Self {
        Self { locations }
    }

    /// Loads the protected locations from a file, one location per line.
    ///
    /// # Errors
    ///
    /// Will return a [`GateError`] if the file can't be read or a line is not properly formatted.
    ///
    /// # Examples
    ///
    /// ```
    /// use ip_access_gate::GateConfig;
    ///
    /// let config = GateConfig::from_file("./samples/locations.txt").unwrap();
    /// assert_eq!(config.locations().len(), 5);
    /// ```
    ///
    /// Sample file content:
    ///
    /// ``` txt
    /// # guarded by the access list
    /// wp-login.php --bypass ?action=postpass --log-level all
    /// wp-admin
    /// wp-trackback.php --log-level off
    /// ```
    pub fn from_file(file_path: &str) -> Result<Self, GateError> {
        let file = File::open(file_path)?;
        let mut locations = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(Self::COMMENT) {
                continue;
            }
            locations.push(ProtectedLocation::from_line(i + 1, trimmed)?);
        }
        Ok(Self { locations })
    }

    #[must_use]
    pub fn locations(&self) -> &[ProtectedLocation] {
        &self.locations
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        let locations = DEFAULT_LOCATIONS
            .iter()
            .map(|pattern| {
                let bypasses = DEFAULT_BYPASSES
                    .iter()
                    .find(|(location, _)| location == pattern)
                    .map_or(&[][..], |(_, tokens)| *tokens);
                ProtectedLocation::new(pattern, bypasses)
                    .expect("built-in location patterns are valid regular expressions")
            })
            .collect();
        Self { locations }
    }
}
