//! The wire-protocol layer: packet framing, the handshake/auth exchange,
//! value encode/decode, and command builders. Nothing above this module
//! knows about TCP/TLS streams or connection state — that lives in
//! `crate::transport`.

pub mod bind;
pub mod column;
pub mod command;
pub mod handshake;
pub mod packet;
pub mod primitive;
pub mod response;
pub mod time;
pub mod value;

pub use bind::{decode_execute_row, encode_execute_params, estimated_buffer_size};
pub use column::{ColumnDefinition, FieldMeta};
pub use command::{CommandResponse, PrepareOk, decode_text_row, is_end_of_rows_marker};
pub use handshake::{
    AuthSwitchRequest, CachingSha2PasswordFastAuthResult, HandshakeResponse41, InitialHandshake,
    auth_caching_sha2_password, auth_mysql_native_password, read_auth_switch_request,
    read_caching_sha2_password_fast_auth_result, read_initial_handshake, write_auth_switch_response,
    write_handshake_response,
};
pub use response::{ErrPayload, GenericResponse, OkPayload, classify_generic_response};
pub use value::{MysqlTime, MysqlTimeType, NativeData, NativeValue, NullBitmap};
