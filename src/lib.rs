/* src/lib.rs */
//! # GeoGuard
//!
//! HTTP middleware that classifies each request by the geographic origin of its
//! client address, using an offline ip2region `xdb` database loaded into memory.
//!
//! ## Features
//!
//! - Client address from a trusted forwarded-address header or the peer socket
//! - In-memory xdb lookups memoized in a concurrent TTL cache
//! - `X-Ip2Region-*` headers (names configurable) added to every forwarded request
//! - Ban list and closed whitelist over country, province, city and user agent
//! - Tower layer and axum extractor via the `axum` feature (on by default)
//!
//! ## Examples
//!
//! ```rust,no_run
//! use geoguard::{Config, Decision, GeoGuard, Rules};
//! use http::HeaderMap;
//!
//! let config = Config::default()
//!     .with_db_path("ip2region.xdb")
//!     .with_ip_from_header("X-Forwarded-For")
//!     .with_ban(Rules::enabled().with_country("美国"));
//! let guard = GeoGuard::new(config).unwrap();
//!
//! let mut headers = HeaderMap::new();
//! let verdict = guard.inspect(&mut headers, "1.1.1.1:9999");
//! assert_ne!(verdict.decision, Decision::Reject);
//! ```

pub mod address;
pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod guard;
pub mod headers;
pub mod policy;
pub mod xdb;

#[cfg(feature = "axum")]
pub mod middleware;

#[cfg(test)]
pub(crate) mod testing;

pub use address::AddressResolver;
pub use cache::{GeoCache, TtlCache};
pub use config::Config;
pub use error::{GeoGuardError, Result};
pub use geo::{GeoRecord, GeoResolver};
pub use guard::{GeoGuard, Verdict};
pub use headers::{HeaderAnnotator, HeaderNames, NOT_FOUND};
pub use policy::{Decision, PolicyEngine, RuleField, Rules};
pub use xdb::{GeoLookup, XdbHeader, XdbSearcher};

#[cfg(feature = "axum")]
pub use middleware::{ClientGeo, GeoGuardLayer, GeoGuardService};
