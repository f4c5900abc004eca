/* src/geo.rs */

use std::sync::Arc;

use serde::Serialize;

use crate::cache::GeoCache;
use crate::xdb::GeoLookup;

/// Normalized geo attributes of one address.
///
/// The all-empty value stands for "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeoRecord {
    pub country: String,
    /// Administrative region. Parsed but not emitted as a header.
    pub region: String,
    pub province: String,
    pub city: String,
    pub isp: String,
}

impl GeoRecord {
    /// Parse a `country|region|province|city|isp` answer.
    ///
    /// Anything other than exactly five fields yields `None`; partial answers are never used.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut fields = raw.split('|');
        let record = Self {
            country: fields.next()?.to_string(),
            region: fields.next()?.to_string(),
            province: fields.next()?.to_string(),
            city: fields.next()?.to_string(),
            isp: fields.next()?.to_string(),
        };
        if fields.next().is_some() {
            return None;
        }
        Some(record)
    }

    /// Whether this is the not-found record.
    pub fn is_empty(&self) -> bool {
        self.country.is_empty()
            && self.region.is_empty()
            && self.province.is_empty()
            && self.city.is_empty()
            && self.isp.is_empty()
    }
}

/// Geo lookup routed through a TTL cache.
///
/// Never fails: lookup errors and malformed answers resolve to the empty record,
/// and only well-formed, non-empty answers are cached.
#[derive(Clone)]
pub struct GeoResolver {
    lookup: Arc<dyn GeoLookup>,
    cache: Arc<GeoCache>,
}

impl GeoResolver {
    /// Create a resolver over `lookup`, memoizing into `cache`.
    pub fn new(lookup: Arc<dyn GeoLookup>, cache: Arc<GeoCache>) -> Self {
        Self { lookup, cache }
    }

    /// Swap the cache, keeping the lookup.
    pub fn with_cache(mut self, cache: Arc<GeoCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The cache shared by every resolution.
    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }

    /// Resolve `ip`, returning the empty record when it is not found.
    pub fn resolve(&self, ip: &str) -> GeoRecord {
        if let Some(record) = self.cache.get(ip) {
            tracing::debug!(ip, "geo cache hit");
            return record;
        }

        let raw = match self.lookup.search(ip) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::trace!(ip, error = %err, "geo lookup failed");
                return GeoRecord::default();
            }
        };

        match GeoRecord::parse(&raw) {
            Some(record) if record.is_empty() => {
                tracing::trace!(ip, "empty geo answer");
                GeoRecord::default()
            }
            Some(record) => {
                tracing::debug!(ip, country = %record.country, "geo cache miss, stored");
                self.cache.set(ip, record.clone());
                record
            }
            None => {
                tracing::trace!(ip, raw = %raw, "malformed geo answer");
                GeoRecord::default()
            }
        }
    }
}

impl std::fmt::Debug for GeoResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoResolver")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}
