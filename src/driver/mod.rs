//! The engine-agnostic layer consumers talk to: SqlValue/Record
//! conversions, the named-placeholder rewriter, the statement assembler,
//! the connection façade, and the error-category taxonomy built on top of
//! the transport layer's wire-level types.

pub mod connection;
pub mod error;
pub mod factory;
pub mod placeholder;
pub mod record;
pub mod statement_builder;
pub mod value;

pub use connection::{MysqlConnection, SqlDriver};
pub use error::{DriverError, ErrorCategory};
pub use factory::create_mysql_driver;
pub use placeholder::{rewrite_placeholders, PlaceholderOptions, RewrittenQuery};
pub use record::{Record, RecordField};
pub use value::{SqlData, SqlValue, TypeHint};
