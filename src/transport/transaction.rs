//! Transaction and savepoint control. The teacher crate's
//! `sync/transaction.rs` only models a zero-sized `Transaction` guard with
//! `commit`/`rollback`; this driver needs the richer set of primitives
//! (spec.md §4.2.2), so the guard is dropped in favour of plain methods on
//! [`crate::transport::connection::Connection`] that this module supplies
//! as free functions taking `&mut Connection`, avoiding a borrow-holding
//! guard type that would fight the connection's own `&mut self` methods.

use crate::error::{Error, Result};
use crate::transport::connection::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    fn as_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }

    fn from_server_string(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "READ-UNCOMMITTED" => Some(IsolationLevel::ReadUncommitted),
            "READ-COMMITTED" => Some(IsolationLevel::ReadCommitted),
            "REPEATABLE-READ" => Some(IsolationLevel::RepeatableRead),
            "SERIALIZABLE" => Some(IsolationLevel::Serializable),
            _ => None,
        }
    }
}

pub fn begin(conn: &mut Connection) -> Result<()> {
    conn.run_simple_query("START TRANSACTION")
}

pub fn commit(conn: &mut Connection) -> Result<()> {
    conn.run_simple_query("COMMIT")
}

pub fn rollback(conn: &mut Connection) -> Result<()> {
    conn.run_simple_query("ROLLBACK")
}

/// `level = None` is a programming error: the underlying `SET SESSION
/// TRANSACTION ISOLATION LEVEL` statement has no "unset" form.
pub fn set_isolation_level(conn: &mut Connection, level: Option<IsolationLevel>) -> Result<()> {
    let level = level.ok_or_else(|| Error::ApiUsage("isolation level must be specified".into()))?;
    conn.run_simple_query(&format!("SET SESSION TRANSACTION ISOLATION LEVEL {}", level.as_sql()))?;
    conn.cached_isolation_level = Some(level);
    Ok(())
}

pub fn get_isolation_level(conn: &mut Connection) -> Result<IsolationLevel> {
    if let Some(level) = conn.cached_isolation_level {
        return Ok(level);
    }
    let rows = conn.query_simple_scalar("SELECT @@SESSION.transaction_isolation")?;
    let level = rows
        .and_then(|s| IsolationLevel::from_server_string(&s.replace('_', "-")))
        .ok_or_else(|| Error::internal("server returned an unrecognised isolation level"))?;
    conn.cached_isolation_level = Some(level);
    Ok(level)
}

fn validate_savepoint_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['`', '\'', '"', ' ']) {
        return Err(Error::ApiUsage(format!("invalid savepoint name '{name}'")));
    }
    Ok(())
}

pub fn savepoint(conn: &mut Connection, name: &str) -> Result<()> {
    validate_savepoint_name(name)?;
    conn.run_simple_query(&format!("SAVEPOINT `{name}`"))
}

pub fn rollback_to_savepoint(conn: &mut Connection, name: &str) -> Result<()> {
    validate_savepoint_name(name)?;
    conn.run_simple_query(&format!("ROLLBACK TO SAVEPOINT `{name}`"))
}

pub fn release_savepoint(conn: &mut Connection, name: &str) -> Result<()> {
    validate_savepoint_name(name)?;
    conn.run_simple_query(&format!("RELEASE SAVEPOINT `{name}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savepoint_names_reject_quotes_backticks_and_spaces() {
        assert!(validate_savepoint_name("ok_name").is_ok());
        assert!(validate_savepoint_name("bad name").is_err());
        assert!(validate_savepoint_name("bad`name").is_err());
        assert!(validate_savepoint_name("").is_err());
    }

    #[test]
    fn isolation_level_server_strings_are_case_and_separator_insensitive() {
        assert_eq!(
            IsolationLevel::from_server_string("REPEATABLE-READ"),
            Some(IsolationLevel::RepeatableRead)
        );
        assert_eq!(
            IsolationLevel::from_server_string("read-committed"),
            Some(IsolationLevel::ReadCommitted)
        );
        assert_eq!(IsolationLevel::from_server_string("bogus"), None);
    }
}
