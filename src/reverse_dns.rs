use dns_lookup::{getnameinfo, LookupError, LookupErrorKind};
#[cfg(test)]
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReverseDnsError {
    #[error("No PTR record found")]
    NotFound,
    #[error("{0}")]
    Resolution(String),
    #[error(transparent)]
    Task(#[from] tokio::task::JoinError),
}

impl From<LookupError> for ReverseDnsError {
    fn from(error: LookupError) -> Self {
        match error.kind() {
            LookupErrorKind::NoName => Self::NotFound,
            _ => Self::Resolution(std::io::Error::from(error).to_string()),
        }
    }
}

pub enum Resolver {
    /// The host resolver, i.e. getnameinfo(3) with whatever the OS is configured to use
    System,
    #[cfg(test)]
    Fixed(HashMap<IpAddr, String>),
    #[cfg(test)]
    Failing(String),
}

impl Resolver {
    pub async fn reverse_lookup(&self, address: IpAddr) -> Result<String, ReverseDnsError> {
        match self {
            Self::System => {
                tokio::task::spawn_blocking(move || system_reverse_lookup(address)).await?
            }
            #[cfg(test)]
            Self::Fixed(table) => table.get(&address).cloned().ok_or(ReverseDnsError::NotFound),
            #[cfg(test)]
            Self::Failing(message) => Err(ReverseDnsError::Resolution(message.clone())),
        }
    }
}

fn system_reverse_lookup(address: IpAddr) -> Result<String, ReverseDnsError> {
    let socket_address = SocketAddr::new(address, 0);
    let (host, _service) = getnameinfo(&socket_address, libc::NI_NAMEREQD)?;
    Ok(host)
}
