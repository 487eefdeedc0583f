use std::borrow::Cow;
use std::net::IpAddr;
use url::form_urlencoded;

/// Strict syntactic check of an IPv4 or IPv6 address, no name resolution is attempted.
///
/// IPv4 octets with leading zeros and IPv6 zone identifiers are rejected.
pub fn validate_ip(candidate: &str) -> Option<IpAddr> {
    candidate.parse().ok()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    /// Anything other than "csv" is JSON
    fn from_param(value: &str) -> Self {
        match value {
            "csv" => Self::Csv,
            _ => Self::Json,
        }
    }
}

/// Parameters common to all lookup endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupQuery {
    pub ip: Option<String>,
    pub format: OutputFormat,
}

impl LookupQuery {
    pub fn parse(query: Option<&str>) -> Self {
        let mut lookup_query = Self::default();
        let Some(query) = query else {
            return lookup_query;
        };
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "ip" => lookup_query.ip = Some(value.into_owned()),
                "format" => lookup_query.format = OutputFormat::from_param(&value),
                _ => {}
            }
        }
        lookup_query
    }

    /// The address to look up: explicit `ip` unless it is missing or empty, otherwise the
    /// client address. The result is returned as is, validation is up to the caller.
    pub fn ip_or<'a>(&'a self, client_ip: impl FnOnce() -> String) -> Cow<'a, str> {
        match self.ip.as_deref() {
            Some(ip) if !ip.is_empty() => Cow::Borrowed(ip),
            _ => Cow::Owned(client_ip()),
        }
    }
}
