/* src/headers.rs */

use http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::error::{GeoGuardError, Result};
use crate::geo::GeoRecord;

/// Value written to every geo header when the address was not found.
pub const NOT_FOUND: &str = "NotFound";

/// Names of the headers carrying the geo attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderNames {
    pub country: String,
    pub province: String,
    pub city: String,
    pub isp: String,
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            country: "X-Ip2Region-Country".to_string(),
            province: "X-Ip2Region-Province".to_string(),
            city: "X-Ip2Region-City".to_string(),
            isp: "X-Ip2Region-Isp".to_string(),
        }
    }
}

/// Validated header names, ready to write.
#[derive(Debug, Clone)]
pub struct HeaderAnnotator {
    country: HeaderName,
    province: HeaderName,
    city: HeaderName,
    isp: HeaderName,
}

impl HeaderAnnotator {
    /// Validate the configured header names.
    pub fn new(names: &HeaderNames) -> Result<Self> {
        Ok(Self {
            country: parse_name(&names.country)?,
            province: parse_name(&names.province)?,
            city: parse_name(&names.city)?,
            isp: parse_name(&names.isp)?,
        })
    }

    /// Append the four geo headers. Existing values are kept.
    pub fn annotate(&self, headers: &mut HeaderMap, record: &GeoRecord) {
        let values = if record.is_empty() {
            [NOT_FOUND; 4]
        } else {
            [
                record.country.as_str(),
                record.province.as_str(),
                record.city.as_str(),
                record.isp.as_str(),
            ]
        };
        let names = [&self.country, &self.province, &self.city, &self.isp];

        for (name, value) in names.into_iter().zip(values) {
            headers.append(name.clone(), header_value(value));
        }
    }
}

fn parse_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|err| GeoGuardError::InvalidHeaderName {
        name: name.to_string(),
        reason: err.to_string(),
    })
}

// Raw bytes keep non-ASCII region names intact.
fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_bytes(value.as_bytes()).unwrap_or_else(|_| {
        let cleaned: String = value.chars().filter(|c| !c.is_control()).collect();
        HeaderValue::from_bytes(cleaned.as_bytes()).unwrap_or(HeaderValue::from_static(""))
    })
}
