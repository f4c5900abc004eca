/* src/config.rs */

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::headers::HeaderNames;
use crate::policy::Rules;

/// Middleware configuration. Immutable once the guard is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Location of the ip2region xdb file.
    pub db_path: PathBuf,
    /// Database content supplied in memory; wins over `db_path`.
    #[serde(skip)]
    pub db_bytes: Option<Vec<u8>>,
    pub headers: HeaderNames,
    /// Trusted forwarded-address header, e.g. `X-Forwarded-For`.
    pub ip_from_header: Option<String>,
    pub ban: Rules,
    pub whitelist: Rules,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("ip2region.xdb"),
            db_bytes: None,
            headers: HeaderNames::default(),
            ip_from_header: None,
            ban: Rules::default(),
            whitelist: Rules::default(),
        }
    }
}

impl Config {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the xdb database file location.
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Set the database content directly, bypassing `db_path`.
    pub fn with_db_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.db_bytes = Some(bytes);
        self
    }

    /// Set the names of the emitted geo headers.
    pub fn with_headers(mut self, headers: HeaderNames) -> Self {
        self.headers = headers;
        self
    }

    /// Set the trusted forwarded-address header.
    pub fn with_ip_from_header(mut self, header: impl Into<String>) -> Self {
        self.ip_from_header = Some(header.into());
        self
    }

    /// Set the ban rules.
    pub fn with_ban(mut self, ban: Rules) -> Self {
        self.ban = ban;
        self
    }

    /// Set the whitelist rules.
    pub fn with_whitelist(mut self, whitelist: Rules) -> Self {
        self.whitelist = whitelist;
        self
    }
}
