use std::fmt::{Display, Formatter};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;

/// Verdict reached by the gate for a request.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub enum GateAction {
    /// The request may proceed.
    #[default]
    Allow,
    /// The request hit a protected location from an address outside the access list.
    ///
    /// The caller is expected to terminate it with a *403 Forbidden*.
    Deny,
}

impl Display for GateAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GateAction::Allow => write!(f, "ALLOW"),
            GateAction::Deny => write!(f, "DENY"),
        }
    }
}

impl ToSql for GateAction {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.to_string().into())
    }
}

impl FromSql for GateAction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "ALLOW" => Ok(GateAction::Allow),
            "DENY" => Ok(GateAction::Deny),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}
