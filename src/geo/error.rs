use maxminddb::MaxMindDBError;
use std::net::IpAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("address {0} is not found in the database")]
    AddressNotFound(IpAddr),
    #[error(transparent)]
    MaxMindDBError(#[from] MaxMindDBError),
}

impl GeoError {
    pub fn from_max_mind_db(address: IpAddr, error: MaxMindDBError) -> Self {
        match error {
            MaxMindDBError::AddressNotFoundError(_) => Self::AddressNotFound(address),
            error => error.into(),
        }
    }
}
