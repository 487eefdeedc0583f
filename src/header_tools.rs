use hyper::header::{HeaderMap, USER_AGENT};
use std::net::IpAddr;

pub const USER_AGENT_PLACEHOLDER: &str = "-";

/// Works out the client address of a request: forwarding headers first, the TCP peer otherwise.
#[derive(Debug, Clone, Default)]
pub struct ClientIp {
    header_names: Vec<String>,
    recursive: bool,
}

impl ClientIp {
    pub fn new(header_names: Vec<String>, recursive: bool) -> Self {
        Self {
            header_names,
            recursive,
        }
    }

    pub fn from_headers(&self, headers: &HeaderMap) -> Option<IpAddr> {
        self.header_names
            .iter()
            .filter_map(|name| {
                let values = headers.get_all(name.as_str());
                let mut it_values = values.iter();
                if self.recursive {
                    it_values.next()
                } else {
                    it_values.next_back()
                }
            })
            .next()
            .and_then(|value| {
                let value = value.to_str().ok()?;
                let mut split = value.split(',');
                if self.recursive {
                    split.next()
                } else {
                    split.next_back()
                }
            })
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    }

    pub fn infer(&self, headers: &HeaderMap, socket_ip_addr: IpAddr) -> String {
        self.from_headers(headers)
            .unwrap_or(socket_ip_addr)
            .to_canonical()
            .to_string()
    }
}

pub fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(USER_AGENT_PLACEHOLDER)
}
