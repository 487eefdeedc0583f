use crate::geo::GeoConfig;
#[cfg(not(feature = "multi-thread"))]
use crate::unavailable::Unavailable;

use hyper::HeaderMap;
use serde::Deserialize;
use std::net::SocketAddr;
#[cfg(feature = "multi-thread")]
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
#[cfg(feature = "multi-thread")]
use thiserror::Error;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "Config::default_host")]
    pub host: SocketAddr,
    #[serde(default)]
    pub threads: ConfigThreads,
    #[serde(default = "Config::default_log_level")]
    pub log_level: log::Level,
    #[serde(default = "Config::default_request_log")]
    pub request_log: PathBuf,
    /// Directory served at `/`, without it only the API is served
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default)]
    pub ip_headers: Vec<String>,
    #[serde(default = "Config::default_ip_headers_recursive")]
    pub ip_headers_recursive: bool,
    #[serde(default, with = "http_serde::header_map")]
    pub response_headers: HeaderMap,
    #[serde(default)]
    pub databases: DatabasesConfig,
}

impl Config {
    fn default_host() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 8000))
    }

    fn default_log_level() -> log::Level {
        log::Level::Info
    }

    fn default_request_log() -> PathBuf {
        "requests.log".into()
    }

    fn default_ip_headers_recursive() -> bool {
        true
    }
}

/// One database per lookup category, each can be loaded or disabled independently.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabasesConfig {
    #[serde(default = "DatabasesConfig::default_city")]
    pub city: GeoConfig,
    #[serde(default = "DatabasesConfig::default_asn")]
    pub asn: GeoConfig,
    #[serde(default = "DatabasesConfig::default_country")]
    pub country: GeoConfig,
}

impl DatabasesConfig {
    fn default_city() -> GeoConfig {
        GeoConfig::max_mind_db("DB/GeoLite2-City.mmdb")
    }

    fn default_asn() -> GeoConfig {
        GeoConfig::max_mind_db("DB/GeoLite2-ASN.mmdb")
    }

    fn default_country() -> GeoConfig {
        GeoConfig::max_mind_db("DB/GeoLite2-Country.mmdb")
    }
}

impl Default for DatabasesConfig {
    fn default() -> Self {
        Self {
            city: Self::default_city(),
            asn: Self::default_asn(),
            country: Self::default_country(),
        }
    }
}

#[cfg(feature = "multi-thread")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(try_from = "ConfigThreadsDe")]
pub enum ConfigThreads {
    #[default]
    Cores,
    Custom(NonZeroUsize),
}

#[cfg(feature = "multi-thread")]
#[derive(Deserialize)]
#[serde(untagged)]
enum ConfigThreadsDe {
    Number(NonZeroUsize),
    Keyword(String),
}

#[cfg(feature = "multi-thread")]
#[derive(Debug, Error)]
#[error(r#"threads must be a positive integer or "cores", not "{0}""#)]
pub struct ConfigThreadsError(String);

#[cfg(feature = "multi-thread")]
impl TryFrom<ConfigThreadsDe> for ConfigThreads {
    type Error = ConfigThreadsError;

    fn try_from(value: ConfigThreadsDe) -> Result<Self, Self::Error> {
        match value {
            ConfigThreadsDe::Number(threads) => Ok(Self::Custom(threads)),
            ConfigThreadsDe::Keyword(s) if s.trim().eq_ignore_ascii_case("cores") => {
                Ok(Self::Cores)
            }
            ConfigThreadsDe::Keyword(s) => Err(ConfigThreadsError(s)),
        }
    }
}

#[cfg(not(feature = "multi-thread"))]
pub type ConfigThreads = Unavailable;

pub fn parse_config<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let toml_string = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&toml_string)?;
    Ok(config)
}
