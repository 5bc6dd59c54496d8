//! A prepared statement handle. Grounded on the teacher crate's
//! `protocol/command/prepared.rs` `PreparedStatement`, but holding only the
//! data a caller needs between calls — the I/O itself lives on
//! [`crate::transport::connection::Connection`] so a `Statement` never
//! needs a back-reference to the connection that created it (every method
//! that drives wire traffic takes `&mut Connection` explicitly).

use crate::error::{Error, Result};
use crate::protocol::column::FieldMeta;

#[derive(Debug)]
pub struct Statement {
    statement_id: u32,
    param_count: usize,
    result_fields: Vec<FieldMeta>,
    closed: bool,
}

impl Statement {
    pub(crate) fn new(statement_id: u32, param_count: usize, result_fields: Vec<FieldMeta>) -> Self {
        Statement {
            statement_id,
            param_count,
            result_fields,
            closed: false,
        }
    }

    pub fn statement_id(&self) -> u32 {
        self.statement_id
    }

    pub fn param_count(&self) -> usize {
        self.param_count
    }

    pub fn result_fields(&self) -> &[FieldMeta] {
        &self.result_fields
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
    }

    pub(crate) fn check_arity(&self, given: usize) -> Result<()> {
        if self.closed {
            return Err(Error::ApiUsage("statement was already closed".into()));
        }
        if given != self.param_count {
            return Err(Error::bind(
                crate::error::code::BIND_ARITY_MISMATCH,
                format!("statement expects {} parameters, got {given}", self.param_count),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::ColumnType;
    use crate::protocol::value::NativeValue;

    fn field() -> FieldMeta {
        FieldMeta {
            name: "id".into(),
            org_name: "id".into(),
            table: "t".into(),
            org_table: "t".into(),
            database: "db".into(),
            catalog: "def".into(),
            native_type: ColumnType::MYSQL_TYPE_LONG,
            charset: 33,
            declared_length: 11,
            max_observed_length: 0,
            flags: crate::constant::ColumnFlags::empty(),
            decimals: 0,
            default_value: NativeValue::null(ColumnType::MYSQL_TYPE_LONG),
        }
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let stmt = Statement::new(1, 2, vec![field()]);
        assert!(stmt.check_arity(2).is_ok());
        assert!(stmt.check_arity(1).is_err());
    }

    #[test]
    fn closed_statement_rejects_further_use() {
        let mut stmt = Statement::new(1, 0, vec![]);
        stmt.mark_closed();
        assert!(stmt.check_arity(0).is_err());
    }
}
