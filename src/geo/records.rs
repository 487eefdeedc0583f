/// What the City database knows about an address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityRecord {
    pub city: Option<String>,
    pub country: Option<String>,
    pub continent: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub postal_code: Option<String>,
    /// The most specific subdivision, e.g. a county rather than a state
    pub subdivision: Option<String>,
    pub accuracy_radius_km: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsnRecord {
    pub autonomous_system_number: Option<u32>,
    pub autonomous_system_organization: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryRecord {
    pub country: Option<String>,
    pub iso_code: Option<String>,
    pub continent: Option<String>,
}
