use crate::GateError;

/// Where the allow/deny decisions taken on protected locations end up.
///
/// The gate has its own level (`Off` unless changed with `AccessGate::set_log_level`),
/// and a location line can override it with `--log-level off|db|console|all`.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Default)]
pub enum LogLevel {
    /// Nothing is recorded.
    #[default]
    Off,
    /// Rows in the `requests` table.
    Db,
    /// One line per decision on stdout.
    Console,
    /// Both a row and a line.
    All,
}

impl LogLevel {
    /// Parses the value of a `--log-level` option found at line `l` of a locations file.
    pub(crate) fn from_str_with_line(l: usize, s: &str) -> Result<Self, GateError> {
        match s {
            "off" => Ok(Self::Off),
            "db" => Ok(Self::Db),
            "console" => Ok(Self::Console),
            "all" => Ok(Self::All),
            x => Err(GateError::InvalidLogLevelValue(l, x.to_owned())),
        }
    }

    // console and database sinks are independent
    pub(crate) fn to_console(self) -> bool {
        matches!(self, LogLevel::Console | LogLevel::All)
    }

    pub(crate) fn to_db(self) -> bool {
        matches!(self, LogLevel::Db | LogLevel::All)
    }
}
