//! Response payloads. Field order is both the JSON key order and the CSV column order.

use crate::geo::{AsnRecord, CityRecord, CountryRecord};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoResult {
    pub ip: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub continent: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub postal_code: Option<String>,
    pub subdivision: Option<String>,
    pub accuracy_radius_km: Option<u16>,
}

impl GeoResult {
    pub fn new(ip: &str, record: CityRecord) -> Self {
        let CityRecord {
            city,
            country,
            continent,
            latitude,
            longitude,
            timezone,
            postal_code,
            subdivision,
            accuracy_radius_km,
        } = record;
        Self {
            ip: ip.to_owned(),
            city,
            country,
            continent,
            latitude,
            longitude,
            timezone,
            postal_code,
            subdivision,
            accuracy_radius_km,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsnResult {
    pub ip: String,
    pub autonomous_system_number: Option<u32>,
    pub autonomous_system_organization: Option<String>,
}

impl AsnResult {
    pub fn new(ip: &str, record: AsnRecord) -> Self {
        Self {
            ip: ip.to_owned(),
            autonomous_system_number: record.autonomous_system_number,
            autonomous_system_organization: record.autonomous_system_organization,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryResult {
    pub ip: String,
    pub country: Option<String>,
    pub iso_code: Option<String>,
    pub continent: Option<String>,
}

impl CountryResult {
    pub fn new(ip: &str, record: CountryRecord) -> Self {
        Self {
            ip: ip.to_owned(),
            country: record.country,
            iso_code: record.iso_code,
            continent: record.continent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PtrResult {
    pub ip: String,
    pub ptr_record: String,
}

/// One element of a batch response, failures are reported in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Found(GeoResult),
    Failed { ip: String, error: String },
}

/// Flat CSV shape of [BatchEntry]: all [GeoResult] columns followed by `error`.
#[derive(Debug, Default, Serialize)]
pub struct BatchCsvRow<'a> {
    pub ip: &'a str,
    pub city: Option<&'a str>,
    pub country: Option<&'a str>,
    pub continent: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<&'a str>,
    pub postal_code: Option<&'a str>,
    pub subdivision: Option<&'a str>,
    pub accuracy_radius_km: Option<u16>,
    pub error: Option<&'a str>,
}

impl<'a> From<&'a BatchEntry> for BatchCsvRow<'a> {
    fn from(entry: &'a BatchEntry) -> Self {
        match entry {
            BatchEntry::Found(result) => Self {
                ip: &result.ip,
                city: result.city.as_deref(),
                country: result.country.as_deref(),
                continent: result.continent.as_deref(),
                latitude: result.latitude,
                longitude: result.longitude,
                timezone: result.timezone.as_deref(),
                postal_code: result.postal_code.as_deref(),
                subdivision: result.subdivision.as_deref(),
                accuracy_radius_km: result.accuracy_radius_km,
                error: None,
            },
            BatchEntry::Failed { ip, error } => Self {
                ip,
                error: Some(error),
                ..Default::default()
            },
        }
    }
}
