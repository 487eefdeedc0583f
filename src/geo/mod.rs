pub use error::GeoError;
pub use records::{AsnRecord, CityRecord, CountryRecord};

mod error;
pub mod max_mind_db;
#[cfg(test)]
pub mod mmdb_writer;
mod records;

use enum_dispatch::enum_dispatch;
use serde::Deserialize;
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;

#[enum_dispatch]
pub enum Geo {
    MaxMindDb(max_mind_db::MaxMindDbGeo),
    #[cfg(test)]
    InMemory(in_memory::InMemoryGeo),
}

#[enum_dispatch(Geo)]
pub trait GeoTrait: Send + Sync {
    fn lookup_city(&self, address: IpAddr) -> Result<CityRecord, GeoError>;
    fn lookup_asn(&self, address: IpAddr) -> Result<AsnRecord, GeoError>;
    fn lookup_country(&self, address: IpAddr) -> Result<CountryRecord, GeoError>;
}

/// Lookup category, each one is served by its own database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    City,
    Asn,
    Country,
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::City => "City",
            Self::Asn => "ASN",
            Self::Country => "Country",
        })
    }
}

/// Outcome of opening a database at start-up.
///
/// Anything but `Loaded` makes every lookup of the category fail as unavailable.
pub enum DatabaseStatus {
    Loaded(Geo),
    Unavailable(String),
    Disabled,
}

impl DatabaseStatus {
    pub fn get(&self) -> Option<&Geo> {
        match self {
            Self::Loaded(geo) => Some(geo),
            Self::Unavailable(_) | Self::Disabled => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

impl From<Geo> for DatabaseStatus {
    fn from(geo: Geo) -> Self {
        Self::Loaded(geo)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(deny_unknown_fields)]
pub enum GeoConfig {
    #[serde(
        alias = "maxminddb",
        alias = "maxmind",
        alias = "MaxMind",
        alias = "Max Mind"
    )]
    MaxMindDb { path: PathBuf },
    #[serde(alias = "disabled", alias = "none")]
    Disabled,
}

impl GeoConfig {
    pub fn max_mind_db<P: Into<PathBuf>>(path: P) -> Self {
        Self::MaxMindDb { path: path.into() }
    }

    /// Opens the database, failures are logged and turned into [DatabaseStatus::Unavailable].
    pub fn load(&self, kind: DatabaseKind) -> DatabaseStatus {
        match self {
            Self::MaxMindDb { path } => match max_mind_db::MaxMindDbGeo::from_file(path) {
                Ok(geo) => {
                    log::info!(
                        r#"{kind} database "{}" loaded from "{}""#,
                        geo.database_type(),
                        path.display()
                    );
                    Geo::MaxMindDb(geo).into()
                }
                Err(error) => {
                    log::warn!(
                        r#"{kind} database is not available, cannot open "{}": {error}"#,
                        path.display()
                    );
                    DatabaseStatus::Unavailable(error.to_string())
                }
            },
            Self::Disabled => {
                log::info!("{kind} database is disabled");
                DatabaseStatus::Disabled
            }
        }
    }
}
