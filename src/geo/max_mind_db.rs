use crate::geo::{AsnRecord, CityRecord, CountryRecord, GeoError, GeoTrait};

use maxminddb::geoip2;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;

const NAMES_LANGUAGE: &str = "en";

fn english_name(names: Option<&BTreeMap<&str, &str>>) -> Option<String> {
    names?.get(NAMES_LANGUAGE).map(|name| name.to_string())
}

pub struct MaxMindDbGeo {
    maxminddb_reader: maxminddb::Reader<Vec<u8>>,
}

impl MaxMindDbGeo {
    pub fn from_file<P: AsRef<Path>>(filepath: P) -> Result<Self, GeoError> {
        Ok(Self {
            maxminddb_reader: maxminddb::Reader::open_readfile(filepath)?,
        })
    }

    pub fn database_type(&self) -> &str {
        &self.maxminddb_reader.metadata.database_type
    }

    fn lookup<'de, T>(&'de self, address: IpAddr) -> Result<T, GeoError>
    where
        T: Deserialize<'de>,
    {
        // IPv4-only databases refuse IPv4-mapped IPv6 addresses
        self.maxminddb_reader
            .lookup(address.to_canonical())
            .map_err(|error| GeoError::from_max_mind_db(address, error))
    }
}

impl GeoTrait for MaxMindDbGeo {
    fn lookup_city(&self, address: IpAddr) -> Result<CityRecord, GeoError> {
        let city: geoip2::City = self.lookup(address)?;
        let location = city.location.as_ref();
        Ok(CityRecord {
            city: english_name(city.city.as_ref().and_then(|c| c.names.as_ref())),
            country: english_name(city.country.as_ref().and_then(|c| c.names.as_ref())),
            continent: english_name(city.continent.as_ref().and_then(|c| c.names.as_ref())),
            latitude: location.and_then(|l| l.latitude),
            longitude: location.and_then(|l| l.longitude),
            timezone: location.and_then(|l| l.time_zone).map(str::to_owned),
            postal_code: city.postal.and_then(|p| p.code).map(str::to_owned),
            subdivision: english_name(
                city.subdivisions
                    .as_ref()
                    .and_then(|subdivisions| subdivisions.last())
                    .and_then(|s| s.names.as_ref()),
            ),
            accuracy_radius_km: location.and_then(|l| l.accuracy_radius),
        })
    }

    fn lookup_asn(&self, address: IpAddr) -> Result<AsnRecord, GeoError> {
        let asn: geoip2::Asn = self.lookup(address)?;
        Ok(AsnRecord {
            autonomous_system_number: asn.autonomous_system_number,
            autonomous_system_organization: asn
                .autonomous_system_organization
                .map(str::to_owned),
        })
    }

    fn lookup_country(&self, address: IpAddr) -> Result<CountryRecord, GeoError> {
        let country: geoip2::Country = self.lookup(address)?;
        Ok(CountryRecord {
            country: english_name(country.country.as_ref().and_then(|c| c.names.as_ref())),
            iso_code: country
                .country
                .as_ref()
                .and_then(|c| c.iso_code)
                .map(str::to_owned),
            continent: english_name(country.continent.as_ref().and_then(|c| c.names.as_ref())),
        })
    }
}
