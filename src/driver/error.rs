//! The engine-agnostic error category table and `DriverError`, built from
//! the lower-level [`crate::error::Error`] via SQLSTATE-prefix
//! classification. Grounded on the teacher crate's `error.rs` (a
//! `thiserror` sum type wrapping I/O and protocol failures); the category
//! table itself has no teacher analogue since the teacher exposes its
//! `Error` enum directly rather than classifying into a driver-manager
//! style taxonomy, so it's grounded on the Connector/J-style SQLSTATE
//! class mapping instead.

use crate::error::Error as TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NoError,
    Connectivity,
    Permissions,
    Syntax,
    DataRelated,
    Constraint,
    Transaction,
    Resource,
    FeatureNotSupported,
    DriverInternal,
    DatabaseInternal,
    Unknown,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{category:?}: {message}")]
pub struct DriverError {
    pub category: ErrorCategory,
    pub message: String,
}

impl DriverError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        DriverError {
            category,
            message: message.into(),
        }
    }

    pub fn feature_not_supported(message: impl Into<String>) -> Self {
        DriverError::new(ErrorCategory::FeatureNotSupported, message)
    }

    pub fn driver_internal(message: impl Into<String>) -> Self {
        DriverError::new(ErrorCategory::DriverInternal, message)
    }
}

/// `08*` is a MySQL/SQL-standard connection-exception class; error codes
/// the protocol layer raises on its own (never carrying a SQLSTATE, e.g.
/// I/O failure) are classified directly from the `Error` variant instead.
fn classify_sql_state(sql_state: &str) -> Option<ErrorCategory> {
    let class = sql_state.get(0..2)?;
    match class {
        "08" => Some(ErrorCategory::Connectivity),
        "28" if sql_state == "28000" => Some(ErrorCategory::Permissions),
        "21" | "22" => Some(ErrorCategory::DataRelated),
        "23" => Some(ErrorCategory::Constraint),
        "3D" | "3F" => Some(ErrorCategory::Syntax),
        "40" => Some(ErrorCategory::Transaction),
        "42" => Some(ErrorCategory::Syntax),
        _ => None,
    }
}

/// A native errno MySQL uses for "commands out of sync" under the generic
/// `HY000` SQLSTATE; used to split that bucket into DriverInternal vs.
/// DatabaseInternal.
const ER_COMMANDS_OUT_OF_SYNC: u16 = 1047;

impl From<&TransportError> for DriverError {
    fn from(err: &TransportError) -> Self {
        let message = err.to_string();
        let category = match err {
            TransportError::Server { error_code, sql_state, .. } => {
                if sql_state == "HY000" {
                    if *error_code == ER_COMMANDS_OUT_OF_SYNC {
                        ErrorCategory::DriverInternal
                    } else {
                        ErrorCategory::DatabaseInternal
                    }
                } else {
                    classify_sql_state(sql_state).unwrap_or(ErrorCategory::Unknown)
                }
            }
            TransportError::Io(_) | TransportError::UnexpectedEof | TransportError::InvalidPacket | TransportError::Tls(_) => {
                ErrorCategory::Connectivity
            }
            TransportError::UnsupportedAuthPlugin(_) => ErrorCategory::FeatureNotSupported,
            TransportError::BadConfig(_) => ErrorCategory::DriverInternal,
            TransportError::UnknownColumnType(_)
            | TransportError::DataConversion { .. }
            | TransportError::TimeConversion { .. }
            | TransportError::Bind { .. }
            | TransportError::StringRender { .. } => ErrorCategory::DataRelated,
            TransportError::ApiUsage(_) | TransportError::Internal { .. } => ErrorCategory::DriverInternal,
        };
        if category == ErrorCategory::FeatureNotSupported {
            DriverError::feature_not_supported(message)
        } else {
            DriverError::new(category, message)
        }
    }
}

impl From<TransportError> for DriverError {
    fn from(err: TransportError) -> Self {
        DriverError::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_sqlstate_class_maps_correctly() {
        let err = TransportError::Server {
            error_code: 2002,
            sql_state: "08001".into(),
            message: "cannot connect".into(),
        };
        assert_eq!(DriverError::from(&err).category, ErrorCategory::Connectivity);
    }

    #[test]
    fn access_denied_maps_to_permissions() {
        let err = TransportError::Server {
            error_code: 1045,
            sql_state: "28000".into(),
            message: "Access denied".into(),
        };
        assert_eq!(DriverError::from(&err).category, ErrorCategory::Permissions);
    }

    #[test]
    fn generic_hy000_commands_out_of_sync_is_driver_internal() {
        let err = TransportError::Server {
            error_code: ER_COMMANDS_OUT_OF_SYNC,
            sql_state: "HY000".into(),
            message: "Commands out of sync".into(),
        };
        assert_eq!(DriverError::from(&err).category, ErrorCategory::DriverInternal);
    }

    #[test]
    fn generic_hy000_other_errno_is_database_internal() {
        let err = TransportError::Server {
            error_code: 1105,
            sql_state: "HY000".into(),
            message: "unknown error".into(),
        };
        assert_eq!(DriverError::from(&err).category, ErrorCategory::DatabaseInternal);
    }

    #[test]
    fn constraint_violation_maps_correctly() {
        let err = TransportError::Server {
            error_code: 1062,
            sql_state: "23000".into(),
            message: "Duplicate entry".into(),
        };
        assert_eq!(DriverError::from(&err).category, ErrorCategory::Constraint);
    }

    #[test]
    fn io_error_is_connectivity() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(DriverError::from(TransportError::Io(io)).category, ErrorCategory::Connectivity);
    }
}
