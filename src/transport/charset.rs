//! Character set configuration: the pre-connect option and the post-connect
//! live `SET NAMES` path. Grounded on the teacher crate's handshake-time
//! charset negotiation in `sync/conn.rs`'s connect routine, generalised to
//! also support changing charset mid-session.

use crate::error::Result;
use crate::transport::connection::Connection;

pub fn set_pre_connect_charset(params: &mut crate::transport::options::ConnectionParams, charset: &str) {
    params.client_charset = charset.to_string();
}

/// Change the connection's active character set. Requires an established
/// connection; issues `SET NAMES` and updates the cached value on success.
pub fn set_charset(conn: &mut Connection, charset: &str) -> Result<()> {
    conn.run_simple_query(&format!("SET NAMES '{charset}'"))?;
    conn.active_charset = charset.to_string();
    Ok(())
}

/// The live, server-reported charset when connected; otherwise the
/// configured-but-not-yet-applied value.
pub fn get_charset(conn: &Connection) -> &str {
    &conn.active_charset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::options::ConnectionParams;

    #[test]
    fn pre_connect_charset_updates_params() {
        let mut params = ConnectionParams::default();
        set_pre_connect_charset(&mut params, "latin1");
        assert_eq!(params.client_charset, "latin1");
    }
}
