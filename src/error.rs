//! Protocol-layer error codes and the crate-wide [`Error`]/[`Result`] types.
//!
//! The numeric ranges below name the protocol-layer failure classes called
//! out by the design notes: data conversion (10000+), time parsing (10100+),
//! parameter binding (10200+), string/literal rendering (10300+), and
//! internal/logic errors (19000+). They are never surfaced as bare
//! integers — callers match on [`Error`] variants; the constants exist so
//! the numeric space stays documented and stable for anyone cross
//! referencing a wire capture or a log line.

pub mod code {
    pub const DATA_OUT_OF_RANGE: u32 = 10000;
    pub const DATA_INVALID_FORMAT: u32 = 10001;
    pub const DATA_UNSUPPORTED_TYPE: u32 = 10002;

    pub const TIME_PARSE_EMPTY: u32 = 10100;
    pub const TIME_PARSE_INVALID_FORMAT: u32 = 10101;
    pub const TIME_PARSE_OUT_OF_RANGE: u32 = 10102;
    pub const TIME_FORMAT_INVALID_STRUCT: u32 = 10103;

    pub const BIND_ARITY_MISMATCH: u32 = 10200;
    pub const BIND_UNSUPPORTED_VALUE: u32 = 10201;

    pub const STRING_RENDER_NO_HANDLE: u32 = 10300;
    pub const STRING_RENDER_UNREPRESENTABLE: u32 = 10301;

    pub const LOGIC_INVARIANT_BROKEN: u32 = 19000;
}

pub type Result<T> = core::result::Result<T, Error>;

/// Errors produced by the protocol and transport layers.
///
/// This is distinct from [`crate::driver::error::DriverError`], which
/// classifies failures into the engine-agnostic category table consumers
/// see; `Error` is the lower-level sum type that `DriverError` is built
/// from.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server error {error_code} ({sql_state}): {message}")]
    Server {
        error_code: u16,
        sql_state: String,
        message: String,
    },

    #[error("unexpected end of packet")]
    UnexpectedEof,

    #[error("malformed packet")]
    InvalidPacket,

    #[error("unknown column type 0x{0:02x}")]
    UnknownColumnType(u8),

    #[error("invalid configuration: {0}")]
    BadConfig(String),

    #[error("unsupported authentication plugin: {0}")]
    UnsupportedAuthPlugin(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("data conversion error [{code}]: {message}")]
    DataConversion { code: u32, message: String },

    #[error("time conversion error [{code}]: {message}")]
    TimeConversion { code: u32, message: String },

    #[error("parameter binding error [{code}]: {message}")]
    Bind { code: u32, message: String },

    #[error("literal rendering error [{code}]: {message}")]
    StringRender { code: u32, message: String },

    #[error("driver misuse: {0}")]
    ApiUsage(String),

    #[error("internal driver error [{code}]: {message}")]
    Internal { code: u32, message: String },
}

impl Error {
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            code: code::LOGIC_INVARIANT_BROKEN,
            message: message.into(),
        }
    }

    pub fn data(code: u32, message: impl Into<String>) -> Self {
        Error::DataConversion {
            code,
            message: message.into(),
        }
    }

    pub fn time(code: u32, message: impl Into<String>) -> Self {
        Error::TimeConversion {
            code,
            message: message.into(),
        }
    }

    pub fn bind(code: u32, message: impl Into<String>) -> Self {
        Error::Bind {
            code,
            message: message.into(),
        }
    }

    /// True for failures that leave the connection itself unusable (as
    /// opposed to a query-scoped failure like a constraint violation).
    pub fn is_connection_broken(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Tls(_) | Error::InvalidPacket | Error::UnexpectedEof)
    }
}
