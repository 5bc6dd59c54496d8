//! The driver-layer connection façade: a boxed `SqlDriver` trait object
//! owning one transport `Connection`, translating a string-keyed
//! configuration bag into `ConnectionParams`, and converting every
//! transport-layer `Result` at the boundary into a stored `DriverError`
//! plus a boolean return — per the propagation policy this driver follows
//! (errors never cross the driver boundary as exceptions; callers poll
//! `last_error()`). Grounded on the teacher crate's top-level `Pool`/`Conn`
//! split in spirit, collapsed here to a single owned connection since this
//! driver has no pooling layer.

use std::collections::HashMap;

use crate::driver::error::{DriverError, ErrorCategory};
use crate::driver::record::Record;
use crate::driver::value::{sql_to_native, SqlValue};
use crate::transport::connection::Connection as TransportConnection;
use crate::transport::metadata::{IndexInfo, TableInfo, TableKind};
use crate::transport::options::params_from_generic_bag;
use crate::protocol::column::FieldMeta;

/// The uniform surface consumers drive: open/close lifecycle, query and
/// execute, and schema introspection, all returning engine-agnostic types.
/// A trait rather than a concrete struct so `factory::create_mysql_driver`
/// can hand back a boxed instance without naming the MySQL-specific type.
pub trait SqlDriver {
    fn open(&mut self, params: &HashMap<String, String>) -> bool;
    fn close(&mut self);
    fn is_open_error(&self) -> bool;
    fn last_error(&self) -> Option<&DriverError>;

    fn query(&mut self, sql: &str) -> Option<Vec<Record>>;
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Option<u64>;

    fn databases(&mut self, like: Option<&str>) -> Option<Vec<String>>;
    fn tables(&mut self, database: Option<&str>, like: Option<&str>, kind: Option<TableKind>) -> Option<Vec<TableInfo>>;
    fn columns(&mut self, table: &str, database: Option<&str>) -> Option<Vec<FieldMeta>>;
    fn indexes(&mut self, table: &str) -> Option<Vec<IndexInfo>>;
}

pub struct MysqlConnection {
    inner: Option<TransportConnection>,
    last_error: Option<DriverError>,
    open_error: bool,
}

impl MysqlConnection {
    pub fn new() -> Self {
        MysqlConnection {
            inner: None,
            last_error: None,
            open_error: false,
        }
    }

    fn record_error(&mut self, error: DriverError) {
        tracing::warn!(category = ?error.category, message = %error.message, "mysql driver operation failed");
        self.last_error = Some(error);
    }

    /// Runs `f` against the open transport connection, recording and
    /// translating any failure into a `DriverError`. Returns `None` if no
    /// connection is open or `f` failed; the error is always retrievable
    /// via `last_error()` afterwards.
    fn with_conn<T>(&mut self, f: impl FnOnce(&mut TransportConnection) -> crate::error::Result<T>) -> Option<T> {
        let Some(conn) = self.inner.as_mut() else {
            self.record_error(DriverError::driver_internal("no open connection"));
            return None;
        };
        match f(conn) {
            Ok(value) => Some(value),
            Err(err) => {
                self.record_error(DriverError::from(&err));
                None
            }
        }
    }
}

impl Default for MysqlConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDriver for MysqlConnection {
    fn open(&mut self, params: &HashMap<String, String>) -> bool {
        let params = params_from_generic_bag(params);
        match TransportConnection::connect(params) {
            Ok(conn) => {
                self.inner = Some(conn);
                self.open_error = false;
                true
            }
            Err(err) => {
                self.record_error(DriverError::from(&err));
                self.open_error = true;
                false
            }
        }
    }

    fn close(&mut self) {
        if let Some(mut conn) = self.inner.take() {
            // A transport-level error on disconnect doesn't overwrite
            // whatever error state already existed — see module docs.
            if let Err(err) = conn.disconnect() {
                if self.last_error.is_none() {
                    self.record_error(DriverError::from(&err));
                }
            }
        }
    }

    fn is_open_error(&self) -> bool {
        self.open_error
    }

    fn last_error(&self) -> Option<&DriverError> {
        self.last_error.as_ref()
    }

    fn query(&mut self, sql: &str) -> Option<Vec<Record>> {
        let sql = sql.to_string();
        self.with_conn(move |conn| {
            let result = conn.query(&sql)?;
            let metas = result.fields.clone();
            Ok(result
                .all_rows()
                .iter()
                .map(|row| Record::from_native(&metas, row))
                .collect())
        })
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Option<u64> {
        if params.is_empty() {
            let sql = sql.to_string();
            return self.with_conn(move |conn| {
                conn.run_simple_query(&sql)?;
                Ok(conn.affected_rows)
            });
        }

        let natives: Vec<_> = params.iter().map(sql_to_native).collect();
        let sql = sql.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let affected = conn.execute(&mut stmt, &natives)?;
            conn.close_statement(stmt)?;
            Ok(affected)
        })
    }

    fn databases(&mut self, like: Option<&str>) -> Option<Vec<String>> {
        let like = like.map(str::to_string);
        self.with_conn(move |conn| conn.databases(like.as_deref()))
    }

    fn tables(&mut self, database: Option<&str>, like: Option<&str>, kind: Option<TableKind>) -> Option<Vec<TableInfo>> {
        let database = database.map(str::to_string);
        let like = like.map(str::to_string);
        self.with_conn(move |conn| conn.tables(database.as_deref(), like.as_deref(), kind))
    }

    fn columns(&mut self, table: &str, database: Option<&str>) -> Option<Vec<FieldMeta>> {
        let table = table.to_string();
        let database = database.map(str::to_string);
        self.with_conn(move |conn| conn.columns(&table, database.as_deref()))
    }

    fn indexes(&mut self, table: &str) -> Option<Vec<IndexInfo>> {
        let table = table.to_string();
        self.with_conn(move |conn| conn.indexes(&table))
    }
}

impl Drop for MysqlConnection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operating_without_an_open_connection_records_driver_internal() {
        let mut conn = MysqlConnection::new();
        assert!(conn.query("SELECT 1").is_none());
        assert_eq!(conn.last_error().unwrap().category, ErrorCategory::DriverInternal);
    }

    #[test]
    fn fresh_connection_has_no_open_error() {
        let conn = MysqlConnection::new();
        assert!(!conn.is_open_error());
        assert!(conn.last_error().is_none());
    }
}
