/* src/policy.rs */

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geo::GeoRecord;

/// Outcome of policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Answer 403 and stop.
    Reject,
    /// Matched the whitelist; forward.
    Allow,
    /// No policy applies; forward.
    Continue,
}

/// Rule field that produced a match, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleField {
    Country,
    Province,
    City,
    UserAgent,
}

/// One named policy set, used for both ban and whitelist.
///
/// Values match by exact string equality, with no case or whitespace folding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Rules {
    pub enabled: bool,
    pub country: HashSet<String>,
    pub province: HashSet<String>,
    pub city: HashSet<String>,
    pub user_agent: HashSet<String>,
}

impl Rules {
    /// An enabled, empty rule set.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Add a country value to match.
    pub fn with_country(mut self, value: impl Into<String>) -> Self {
        self.country.insert(value.into());
        self
    }

    /// Add a province value to match.
    pub fn with_province(mut self, value: impl Into<String>) -> Self {
        self.province.insert(value.into());
        self
    }

    /// Add a city value to match.
    pub fn with_city(mut self, value: impl Into<String>) -> Self {
        self.city.insert(value.into());
        self
    }

    /// Add a user agent value to match.
    pub fn with_user_agent(mut self, value: impl Into<String>) -> Self {
        self.user_agent.insert(value.into());
        self
    }

    /// First field matching the record or user agent, ignoring `enabled`.
    pub fn matches(&self, record: &GeoRecord, user_agent: &str) -> Option<RuleField> {
        self.first_match(record, Some(user_agent))
    }

    // `None` is a user agent no rule can name, such as non-UTF-8 bytes.
    fn first_match(&self, record: &GeoRecord, user_agent: Option<&str>) -> Option<RuleField> {
        if self.country.contains(&record.country) {
            return Some(RuleField::Country);
        }
        if self.province.contains(&record.province) {
            return Some(RuleField::Province);
        }
        if self.city.contains(&record.city) {
            return Some(RuleField::City);
        }
        if user_agent.is_some_and(|ua| self.user_agent.contains(ua)) {
            return Some(RuleField::UserAgent);
        }
        None
    }
}

/// Ban list first, then the whitelist as a closed gate.
#[derive(Debug, Clone, Default)]
pub struct PolicyEngine {
    ban: Rules,
    whitelist: Rules,
}

impl PolicyEngine {
    /// Create an engine from the ban and whitelist rule sets.
    pub fn new(ban: Rules, whitelist: Rules) -> Self {
        Self { ban, whitelist }
    }

    /// Decide on a request from its geo record and user agent.
    pub fn evaluate(&self, record: &GeoRecord, user_agent: &str) -> Decision {
        self.decide(record, Some(user_agent))
    }

    /// Decide on a request from the raw `User-Agent` header bytes.
    ///
    /// Bytes that are not UTF-8 never equal a user agent rule.
    pub fn evaluate_bytes(&self, record: &GeoRecord, user_agent: &[u8]) -> Decision {
        self.decide(record, std::str::from_utf8(user_agent).ok())
    }

    fn decide(&self, record: &GeoRecord, user_agent: Option<&str>) -> Decision {
        if self.ban.enabled {
            if let Some(field) = self.ban.first_match(record, user_agent) {
                tracing::debug!(?field, "request matched ban rules");
                return Decision::Reject;
            }
        }

        if self.whitelist.enabled {
            return match self.whitelist.first_match(record, user_agent) {
                Some(field) => {
                    tracing::debug!(?field, "request matched whitelist");
                    Decision::Allow
                }
                None => {
                    tracing::debug!("request not in whitelist");
                    Decision::Reject
                }
            };
        }

        Decision::Continue
    }
}
