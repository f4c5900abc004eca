/* src/guard.rs */

use std::sync::Arc;

use http::HeaderMap;
use http::header::USER_AGENT;

use crate::address::AddressResolver;
use crate::cache::GeoCache;
use crate::config::Config;
use crate::error::Result;
use crate::geo::{GeoRecord, GeoResolver};
use crate::headers::HeaderAnnotator;
use crate::policy::{Decision, PolicyEngine};
use crate::xdb::{GeoLookup, XdbSearcher};

/// What the guard concluded about one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub ip: String,
    pub record: GeoRecord,
    pub decision: Decision,
}

/// Framework-independent request classifier.
///
/// Resolves the client address, looks it up, annotates the headers and evaluates
/// the policy. Forwarding or rejecting is left to the caller.
#[derive(Debug, Clone)]
pub struct GeoGuard {
    address: AddressResolver,
    geo: GeoResolver,
    annotator: HeaderAnnotator,
    policy: PolicyEngine,
}

impl GeoGuard {
    /// Build a guard, loading the database from `db_bytes` or `db_path`.
    ///
    /// A database that cannot be loaded is a hard error.
    pub fn new(mut config: Config) -> Result<Self> {
        let (searcher, source) = match config.db_bytes.take() {
            Some(bytes) => (XdbSearcher::from_bytes(bytes)?, "memory".to_string()),
            None => (
                XdbSearcher::from_file(&config.db_path)?,
                config.db_path.display().to_string(),
            ),
        };
        tracing::info!(
            %source,
            bytes = searcher.len(),
            version = searcher.header().version,
            "loaded ip2region database"
        );
        Self::with_lookup(&config, Arc::new(searcher))
    }

    /// Build a guard around an already loaded database, which may be shared.
    pub fn with_lookup(config: &Config, lookup: Arc<dyn GeoLookup>) -> Result<Self> {
        let mut address = AddressResolver::new();
        if let Some(header) = &config.ip_from_header {
            address = address.with_trusted_header(header.clone());
        }

        Ok(Self {
            address,
            geo: GeoResolver::new(lookup, Arc::new(GeoCache::default())),
            annotator: HeaderAnnotator::new(&config.headers)?,
            policy: PolicyEngine::new(config.ban.clone(), config.whitelist.clone()),
        })
    }

    /// Replace the lookup cache, e.g. to change its TTL.
    pub fn with_cache(mut self, cache: GeoCache) -> Self {
        self.geo = self.geo.with_cache(Arc::new(cache));
        self
    }

    /// The cached geo resolver.
    pub fn geo(&self) -> &GeoResolver {
        &self.geo
    }

    /// Classify a request. Headers are annotated whatever the decision.
    pub fn inspect(&self, headers: &mut HeaderMap, remote_addr: &str) -> Verdict {
        let ip = self.address.resolve(headers, remote_addr);
        let record = self.geo.resolve(&ip);
        self.annotator.annotate(headers, &record);

        let user_agent = headers.get(USER_AGENT).map_or(&[][..], |value| value.as_bytes());
        let decision = self.policy.evaluate_bytes(&record, user_agent);

        Verdict {
            ip,
            record,
            decision,
        }
    }
}
