//! Writer of small MaxMind DB (format 2.0) files for the tests.
//!
//! The tree is an IPv6 one with 24-bit records, IPv4 networks live under `::/96` the way
//! MaxMind's own databases store them. Values are given as JSON and mapped onto the
//! MaxMind data types: strings, doubles, unsigned integers, maps, arrays and booleans.

use serde_json::{json, Value};
use std::net::IpAddr;

const RECORD_SIZE: u16 = 24;
const DATA_SECTION_SEPARATOR: [u8; 16] = [0; 16];
const METADATA_START_MARKER: &[u8] = b"\xab\xcd\xefMaxMind.com";

const TYPE_STRING: u8 = 2;
const TYPE_DOUBLE: u8 = 3;
const TYPE_UINT32: u8 = 6;
const TYPE_MAP: u8 = 7;
const TYPE_INT32: u8 = 8;
const TYPE_UINT64: u8 = 9;
const TYPE_ARRAY: u8 = 11;
const TYPE_BOOLEAN: u8 = 14;

#[derive(Clone, Copy)]
enum Record {
    Empty,
    Node(usize),
    Data(usize),
}

pub struct MmdbWriter {
    database_type: String,
    nodes: Vec<[Record; 2]>,
    data: Vec<u8>,
}

impl MmdbWriter {
    pub fn new(database_type: &str) -> Self {
        Self {
            database_type: database_type.to_owned(),
            nodes: vec![[Record::Empty; 2]],
            data: vec![],
        }
    }

    /// Networks must not overlap, `network` is `address/prefix`
    pub fn insert(&mut self, network: &str, value: Value) -> &mut Self {
        let (address, prefix) = network.split_once('/').unwrap();
        let address: IpAddr = address.parse().unwrap();
        let prefix: usize = prefix.parse().unwrap();
        let (bits, prefix) = match address {
            IpAddr::V4(address) => (u128::from(u32::from(address)), prefix + 96),
            IpAddr::V6(address) => (u128::from(address), prefix),
        };
        assert!((1..=128).contains(&prefix), "bad prefix in {network}");

        let offset = self.data.len();
        encode(&value, &mut self.data);

        let mut node = 0;
        for depth in 0..prefix {
            let bit = ((bits >> (127 - depth)) & 1) as usize;
            if depth + 1 == prefix {
                self.nodes[node][bit] = Record::Data(offset);
                break;
            }
            node = match self.nodes[node][bit] {
                Record::Node(next) => next,
                Record::Empty => {
                    let next = self.nodes.len();
                    self.nodes.push([Record::Empty; 2]);
                    self.nodes[node][bit] = Record::Node(next);
                    next
                }
                Record::Data(_) => panic!("{network} overlaps an inserted network"),
            };
        }
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let node_count = self.nodes.len();
        let record_value = |record: Record| match record {
            Record::Empty => node_count,
            Record::Node(node) => node,
            Record::Data(offset) => node_count + DATA_SECTION_SEPARATOR.len() + offset,
        };

        let mut buf = vec![];
        for children in &self.nodes {
            for record in children {
                let value = u32::try_from(record_value(*record)).unwrap();
                assert!(value < 1 << RECORD_SIZE, "database is too large");
                buf.extend_from_slice(&value.to_be_bytes()[1..]);
            }
        }
        buf.extend_from_slice(&DATA_SECTION_SEPARATOR);
        buf.extend_from_slice(&self.data);
        buf.extend_from_slice(METADATA_START_MARKER);
        let metadata = json!({
            "binary_format_major_version": 2,
            "binary_format_minor_version": 0,
            "build_epoch": 1_700_000_000_u64,
            "database_type": self.database_type,
            "description": {"en": format!("{} test database", self.database_type)},
            "ip_version": 6,
            "languages": ["en"],
            "node_count": node_count,
            "record_size": RECORD_SIZE
        });
        encode(&metadata, &mut buf);
        buf
    }
}

fn control(buf: &mut Vec<u8>, type_number: u8, size: usize) {
    let (size_bits, extra): (u8, Vec<u8>) = match size {
        0..=28 => (size as u8, vec![]),
        29..=284 => (29, vec![(size - 29) as u8]),
        285..=65_820 => (30, ((size - 285) as u16).to_be_bytes().to_vec()),
        _ => (31, ((size - 65_821) as u32).to_be_bytes()[1..].to_vec()),
    };
    if type_number <= TYPE_MAP {
        buf.push(type_number << 5 | size_bits);
    } else {
        // Extended type
        buf.push(size_bits);
        buf.push(type_number - 7);
    }
    buf.extend_from_slice(&extra);
}

fn encode_uint(buf: &mut Vec<u8>, type_number: u8, value: u64) {
    let bytes = value.to_be_bytes();
    let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
    control(buf, type_number, bytes.len() - leading_zeros);
    buf.extend_from_slice(&bytes[leading_zeros..]);
}

fn encode_str(buf: &mut Vec<u8>, s: &str) {
    control(buf, TYPE_STRING, s.len());
    buf.extend_from_slice(s.as_bytes());
}

fn encode(value: &Value, buf: &mut Vec<u8>) {
    match value {
        Value::String(s) => encode_str(buf, s),
        Value::Bool(b) => control(buf, TYPE_BOOLEAN, usize::from(*b)),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                match u32::try_from(u) {
                    Ok(u) => encode_uint(buf, TYPE_UINT32, u.into()),
                    Err(_) => encode_uint(buf, TYPE_UINT64, u),
                }
            } else if let Some(i) = n.as_i64() {
                control(buf, TYPE_INT32, 4);
                buf.extend_from_slice(&i32::try_from(i).unwrap().to_be_bytes());
            } else {
                control(buf, TYPE_DOUBLE, 8);
                buf.extend_from_slice(&n.as_f64().unwrap().to_be_bytes());
            }
        }
        Value::Array(items) => {
            control(buf, TYPE_ARRAY, items.len());
            for item in items {
                encode(item, buf);
            }
        }
        Value::Object(map) => {
            control(buf, TYPE_MAP, map.len());
            for (key, value) in map {
                encode_str(buf, key);
                encode(value, buf);
            }
        }
        Value::Null => panic!("MaxMind DB has no null type"),
    }
}

/// City records with the networks and names of MaxMind's GeoIP2-City test database
pub fn city_database() -> Vec<u8> {
    MmdbWriter::new("GeoIP2-City")
        .insert(
            "81.2.69.160/27",
            json!({
                "city": {"geoname_id": 2643743, "names": {"de": "London", "en": "London"}},
                "continent": {"code": "EU", "geoname_id": 6255148, "names": {"en": "Europe"}},
                "country": {
                    "geoname_id": 2635167,
                    "iso_code": "GB",
                    "names": {"en": "United Kingdom", "fr": "Royaume-Uni"}
                },
                "location": {
                    "accuracy_radius": 10,
                    "latitude": 51.5142,
                    "longitude": -0.0931,
                    "time_zone": "Europe/London"
                },
                "subdivisions": [
                    {"geoname_id": 6269131, "iso_code": "ENG", "names": {"en": "England"}}
                ]
            }),
        )
        .insert(
            "2.125.160.216/29",
            json!({
                "city": {"geoname_id": 2655045, "names": {"en": "Boxford"}},
                "continent": {"code": "EU", "geoname_id": 6255148, "names": {"en": "Europe"}},
                "country": {"geoname_id": 2635167, "iso_code": "GB", "names": {"en": "United Kingdom"}},
                "location": {
                    "accuracy_radius": 100,
                    "latitude": 51.75,
                    "longitude": -1.25,
                    "time_zone": "Europe/London"
                },
                "postal": {"code": "OX1"},
                "subdivisions": [
                    {"geoname_id": 6269131, "iso_code": "ENG", "names": {"en": "England"}},
                    {"geoname_id": 3333217, "iso_code": "WBK", "names": {"en": "West Berkshire"}}
                ]
            }),
        )
        .insert(
            "2a02:cf40::/29",
            json!({
                "continent": {"code": "EU", "geoname_id": 6255148, "names": {"en": "Europe"}},
                "country": {"geoname_id": 3144096, "iso_code": "NO", "names": {"en": "Norway"}},
                "location": {"accuracy_radius": 100, "latitude": 62.0, "longitude": 10.0}
            }),
        )
        .insert("198.51.100.0/24", json!({"location": "not a map"}))
        .to_bytes()
}

/// ASN records with the networks of MaxMind's GeoLite2-ASN test database
pub fn asn_database() -> Vec<u8> {
    MmdbWriter::new("GeoLite2-ASN")
        .insert(
            "1.128.0.0/11",
            json!({
                "autonomous_system_number": 1221,
                "autonomous_system_organization": "Telstra Pty Ltd"
            }),
        )
        .insert(
            "2600:6000::/20",
            json!({
                "autonomous_system_number": 237,
                "autonomous_system_organization": "Merit Network Inc."
            }),
        )
        .to_bytes()
}

/// Country records with the networks of MaxMind's GeoIP2-Country test database
pub fn country_database() -> Vec<u8> {
    MmdbWriter::new("GeoIP2-Country")
        .insert(
            "81.2.69.160/27",
            json!({
                "continent": {"code": "EU", "geoname_id": 6255148, "names": {"en": "Europe"}},
                "country": {"geoname_id": 2635167, "iso_code": "GB", "names": {"en": "United Kingdom"}}
            }),
        )
        .insert(
            "216.160.83.56/29",
            json!({
                "continent": {"code": "NA", "geoname_id": 6255149, "names": {"en": "North America"}},
                "country": {"geoname_id": 6252001, "iso_code": "US", "names": {"en": "United States"}}
            }),
        )
        .to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_accepts_the_output() {
        let reader = maxminddb::Reader::from_source(asn_database()).unwrap();
        assert_eq!(reader.metadata.database_type, "GeoLite2-ASN");
        assert_eq!(reader.metadata.ip_version, 6);
        assert_eq!(reader.metadata.record_size, RECORD_SIZE);
        assert_eq!(reader.metadata.languages, vec!["en".to_string()]);
    }

    #[test]
    fn long_strings_use_extended_sizes() {
        for len in [28, 29, 284, 285, 70_000] {
            let name = "x".repeat(len);
            let bytes = MmdbWriter::new("GeoLite2-ASN")
                .insert(
                    "1.0.0.0/8",
                    json!({"autonomous_system_organization": name}),
                )
                .to_bytes();
            let reader = maxminddb::Reader::from_source(bytes).unwrap();
            let asn: maxminddb::geoip2::Asn = reader.lookup("1.2.3.4".parse().unwrap()).unwrap();
            assert_eq!(asn.autonomous_system_organization, Some(name.as_str()));
        }
    }
}
