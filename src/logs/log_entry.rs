use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, Local, SecondsFormat, SubsecRound};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;

use crate::request::RequestContext;
use crate::{GateAction, LogLevel};

/// A decision taken by the gate on a protected location.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LogEntry {
    pub(crate) timestamp: LogTimestamp,
    pub(crate) action: GateAction,
    pub(crate) source: Option<LogIp>,
    pub(crate) location: String,
    pub(crate) path: String,
    pub(crate) log_level: LogLevel,
}

impl LogEntry {
    pub(crate) fn new(
        request: &RequestContext,
        location: &str,
        action: GateAction,
        log_level: LogLevel,
    ) -> LogEntry {
        LogEntry {
            timestamp: LogTimestamp::now(),
            action,
            source: request.remote_addr().and_then(LogIp::from_remote_addr),
            location: location.to_owned(),
            path: request.path().to_owned(),
            log_level,
        }
    }
}

impl Display for LogEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let source = self
            .source
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        write!(
            f,
            "{} {} {} {} {}",
            self.timestamp, self.action, source, self.location, self.path
        )
    }
}

/// Local time of a decision, second precision.
#[derive(PartialEq, Debug, Clone)]
pub(crate) struct LogTimestamp(DateTime<Local>);

impl LogTimestamp {
    pub(crate) fn now() -> LogTimestamp {
        LogTimestamp::from_date_time(Local::now())
    }

    // subseconds are dropped so that a timestamp survives the trip to the database
    pub(crate) fn from_date_time(date_time: DateTime<Local>) -> LogTimestamp {
        LogTimestamp(date_time.trunc_subsecs(0))
    }
}

impl Display for LogTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Secs, false))
    }
}

impl ToSql for LogTimestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.to_string().into())
    }
}

impl FromSql for LogTimestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        DateTime::<Local>::from_str(value.as_str()?)
            .map(LogTimestamp)
            .map_err(|_| FromSqlError::InvalidType)
    }
}

/// Source address of a request, when it is a valid IP.
#[derive(PartialEq, Debug, Clone, Copy)]
pub(crate) struct LogIp(IpAddr);

impl LogIp {
    pub(crate) fn from_remote_addr(remote_addr: &str) -> Option<LogIp> {
        IpAddr::from_str(remote_addr).ok().map(LogIp)
    }
}

impl Display for LogIp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for LogIp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.to_string().into())
    }
}

impl FromSql for LogIp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        LogIp::from_remote_addr(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}
