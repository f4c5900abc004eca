/* src/error.rs */

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for operations that may fail with `GeoGuardError`.
pub type Result<T> = std::result::Result<T, GeoGuardError>;

/// Errors raised while building the guard or querying the geo database.
#[derive(Error, Debug)]
pub enum GeoGuardError {
    /// The database file could not be read.
    #[error("Failed to read geo database `{path}`: {source}")]
    DatabaseIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The database buffer is truncated or an index pointer is out of range.
    #[error("Invalid geo database: {0}")]
    InvalidDatabase(String),

    /// The lookup key is not a dotted IPv4 address.
    #[error("Invalid IP address format: {0}")]
    InvalidIp(String),

    /// A configured header name is not a legal HTTP header name.
    #[error("Invalid header name `{name}`: {reason}")]
    InvalidHeaderName { name: String, reason: String },
}
