//! The connection layer: option parsing, stream/TLS handling, the
//! connection handshake and command round-trip, and the session-level
//! conveniences (transactions, charset, schema introspection) built on top
//! of it. Nothing above this module speaks raw packets; nothing below it
//! knows about SQL placeholders or the uniform value API — that's
//! `crate::driver`.

pub mod charset;
pub mod connection;
pub mod metadata;
pub mod options;
pub mod result;
pub mod statement;
pub mod stream;
pub mod transaction;

pub use connection::Connection;
pub use metadata::{IndexColumnDef, IndexInfo, TableInfo, TableKind};
pub use options::{ConnectionParams, SslMode, SslOptions};
pub use result::ResultState;
pub use statement::Statement;
pub use stream::Stream;
pub use transaction::IsolationLevel;
