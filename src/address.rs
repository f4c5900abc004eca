/* src/address.rs */

use http::HeaderMap;

/// Resolves the client address of a request.
///
/// With a trusted header configured, the first element of its comma-separated
/// value wins. Otherwise, or when that header is missing or empty, the transport
/// peer address is used with its port removed.
///
/// No IP syntax validation happens here; the geo lookup rejects bad keys.
#[derive(Debug, Clone, Default)]
pub struct AddressResolver {
    /// Header populated by a trusted proxy, e.g. `X-Forwarded-For` or `X-Real-IP`.
    pub trusted_header: Option<String>,
}

impl AddressResolver {
    /// Create a resolver that only looks at the peer address.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trusted forwarded-address header. An empty name disables it.
    pub fn with_trusted_header(mut self, header: impl Into<String>) -> Self {
        let header = header.into();
        self.trusted_header = if header.is_empty() { None } else { Some(header) };
        self
    }

    /// Resolve the client address from request headers and the raw peer address.
    pub fn resolve(&self, headers: &HeaderMap, remote_addr: &str) -> String {
        if let Some(ip) = self.from_trusted_header(headers) {
            return ip;
        }

        match split_host_port(remote_addr) {
            Some(host) => host.to_string(),
            None => remote_addr.to_string(),
        }
    }

    fn from_trusted_header(&self, headers: &HeaderMap) -> Option<String> {
        let name = self.trusted_header.as_deref()?;
        let value = headers.get(name)?;
        let value = String::from_utf8_lossy(value.as_bytes());
        if value.is_empty() {
            return None;
        }

        // "client, proxy1, proxy2"
        let first = value.split(',').next().unwrap_or_default();
        Some(first.trim().to_string())
    }
}

/// Strip the port from a `host:port` or `[v6]:port` address.
///
/// Returns `None` when the input is not in either form.
pub fn split_host_port(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let end = rest.find(']')?;
        let host = &rest[..end];
        if !rest[end + 1..].starts_with(':') || host.contains('[') {
            return None;
        }
        return Some(host);
    }

    let colon = addr.rfind(':')?;
    let host = &addr[..colon];
    if host.contains(':') || host.contains('[') || host.contains(']') {
        return None;
    }
    Some(host)
}
