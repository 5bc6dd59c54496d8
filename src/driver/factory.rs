//! The exported factory hook: registers this crate as the `"MYSQL"` driver
//! by handing back a boxed [`SqlDriver`]. Grounded on the teacher crate's
//! top-level constructor functions (`Pool::new`/`Conn::new`) — collapsed
//! here to a single zero-argument factory since configuration happens
//! later, through `SqlDriver::open`.

use crate::driver::connection::{MysqlConnection, SqlDriver};

pub const DRIVER_NAME: &str = "MYSQL";

pub fn create_mysql_driver() -> Box<dyn SqlDriver> {
    Box::new(MysqlConnection::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_returns_a_closed_driver() {
        let mut driver = create_mysql_driver();
        assert!(!driver.is_open_error());
        assert!(driver.last_error().is_none());
    }
}
