#![allow(dead_code)]

use serde::Deserialize;
use thiserror::Error;

/// Marks a config item which cannot be used with the current set of Cargo features.
///
/// Any value given in the config file is an error, absence of the key is fine.
#[derive(Debug, Deserialize, Default, PartialEq, Eq)]
#[serde(try_from = "UnavailableDe")]
pub struct Unavailable;

#[derive(Debug, Deserialize)]
struct UnavailableDe(toml::Value);

#[derive(Debug, Error)]
#[error("This configuration item is not supported by this build of geoapi, rebuild it with the appropriate Cargo features")]
struct UnavailableError;

impl TryFrom<UnavailableDe> for Unavailable {
    type Error = UnavailableError;

    fn try_from(_: UnavailableDe) -> Result<Self, Self::Error> {
        Err(UnavailableError)
    }
}
