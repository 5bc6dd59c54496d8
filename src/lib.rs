pub mod constant;
pub mod driver;
pub mod error;
pub mod protocol;
pub mod transport;

pub use driver::{create_mysql_driver, DriverError, ErrorCategory, MysqlConnection, Record, SqlDriver, SqlValue};
pub use error::{Error, Result};
pub use transport::{Connection, ConnectionParams};
