use crate::config::Config;
use crate::geo::{DatabaseKind, DatabaseStatus, Geo, GeoError, GeoTrait};
use crate::header_tools::{user_agent, ClientIp};
use crate::ip_input::{validate_ip, LookupQuery, OutputFormat};
use crate::request_log::{Outcome, RequestLog};
use crate::response::{self, make_error_response};
use crate::results::{AsnResult, BatchCsvRow, BatchEntry, CountryResult, GeoResult, PtrResult};
use crate::reverse_dns::{Resolver, ReverseDnsError};
use crate::static_files::StaticFiles;

use hyper::body::HttpBody;
use hyper::{header::HeaderMap, Body, Method, Request, Response, StatusCode, Uri};
use serde::Serialize;
use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const GEOLOCATE: &str = "/geolocate";
pub const GEOLOCATE_BATCH: &str = "/geolocate/batch";
pub const ASN: &str = "/asn";
pub const COUNTRY: &str = "/country";
pub const REVERSE_DNS: &str = "/reverse_dns";

/// Placeholder for the ip column when a request fails before any address is known
const NO_IP: &str = "-";

/// Largest accepted `/geolocate/batch` body, anything bigger is a 400
pub const MAX_BATCH_BODY_SIZE: usize = 2 * 1024 * 1024;

fn not_found_in(kind: &DatabaseKind) -> String {
    match kind {
        DatabaseKind::City => "database".to_owned(),
        kind => format!("{kind} database"),
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid IP address format.")]
    InvalidIp,
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("IP address not found in {}.", not_found_in(.0))]
    AddressNotFound(DatabaseKind),
    #[error("PTR record not found for this IP.")]
    PtrNotFound,
    #[error("{0} database is not available.")]
    DatabaseUnavailable(DatabaseKind),
    #[error("Not Found")]
    PathNotFound,
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    fn lookup(kind: DatabaseKind, error: GeoError) -> Self {
        match error {
            GeoError::AddressNotFound(_) => Self::AddressNotFound(kind),
            error => Self::Internal(error.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidIp | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::AddressNotFound(_) | Self::PtrNotFound | Self::PathNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::DatabaseUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            Self::InvalidIp => Outcome::InvalidIp,
            Self::AddressNotFound(_) | Self::PtrNotFound | Self::PathNotFound => {
                Outcome::NotFound
            }
            Self::DatabaseUnavailable(_) => Outcome::DatabaseNotAvailable,
            error => Outcome::Error(error.to_string()),
        }
    }
}

impl From<ReverseDnsError> for ServiceError {
    fn from(error: ReverseDnsError) -> Self {
        match error {
            ReverseDnsError::NotFound => Self::PtrNotFound,
            error => Self::Internal(error.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum InvalidConfigError {
    #[error(r#"cannot open request log "{path}": {error}"#)]
    RequestLog {
        path: PathBuf,
        error: std::io::Error,
    },
}

/// Everything a request needs, opened once at start-up and read-only afterwards.
pub struct GeoApiService {
    client_ip: ClientIp,
    response_headers: HeaderMap,
    city: DatabaseStatus,
    asn: DatabaseStatus,
    country: DatabaseStatus,
    resolver: Resolver,
    request_log: RequestLog,
    static_files: Option<StaticFiles>,
}

impl GeoApiService {
    pub fn from_config(config: Config) -> Result<Self, InvalidConfigError> {
        let Config {
            request_log: request_log_path,
            static_dir,
            ip_headers,
            ip_headers_recursive,
            response_headers,
            databases,
            ..
        } = config;

        let request_log =
            RequestLog::open(&request_log_path).map_err(|error| InvalidConfigError::RequestLog {
                path: request_log_path.clone(),
                error,
            })?;

        let static_files = match static_dir {
            Some(static_dir) => {
                let static_files = StaticFiles::new(&static_dir);
                if static_files.is_none() {
                    log::warn!(
                        r#"static directory "{}" does not exist, only the API is served"#,
                        static_dir.display()
                    );
                }
                static_files
            }
            None => {
                log::info!("static_dir is not set, only the API is served");
                None
            }
        };

        Ok(Self {
            client_ip: ClientIp::new(ip_headers, ip_headers_recursive),
            response_headers,
            city: databases.city.load(DatabaseKind::City),
            asn: databases.asn.load(DatabaseKind::Asn),
            country: databases.country.load(DatabaseKind::Country),
            resolver: Resolver::System,
            request_log,
            static_files,
        })
    }
}

impl GeoApiService {
    fn database(&self, kind: DatabaseKind) -> Result<&Geo, ServiceError> {
        match kind {
            DatabaseKind::City => &self.city,
            DatabaseKind::Asn => &self.asn,
            DatabaseKind::Country => &self.country,
        }
        .get()
        .ok_or(ServiceError::DatabaseUnavailable(kind))
    }

    fn logged<T>(
        &self,
        endpoint: &str,
        ip: &str,
        user_agent: &str,
        result: Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let outcome = match &result {
            Ok(_) => Outcome::Success,
            Err(error) => error.outcome(),
        };
        self.request_log.record(endpoint, ip, &outcome, user_agent);
        result
    }

    /// Availability is checked first, so an unloaded database answers 503 to any input
    fn lookup<R>(
        &self,
        kind: DatabaseKind,
        ip: &str,
        lookup: impl FnOnce(&Geo, IpAddr) -> Result<R, GeoError>,
    ) -> Result<R, ServiceError> {
        let geo = self.database(kind)?;
        let address = validate_ip(ip).ok_or(ServiceError::InvalidIp)?;
        lookup(geo, address).map_err(|error| ServiceError::lookup(kind, error))
    }

    fn geolocate(
        &self,
        request: &Request<Body>,
        socket_ip_addr: IpAddr,
    ) -> Result<Response<Body>, ServiceError> {
        let query = LookupQuery::parse(request.uri().query());
        let ip = query.ip_or(|| self.client_ip.infer(request.headers(), socket_ip_addr));
        let result = self
            .lookup(DatabaseKind::City, &ip, Geo::lookup_city)
            .map(|record| GeoResult::new(&ip, record));
        let result = self.logged(GEOLOCATE, &ip, user_agent(request.headers()), result)?;
        match query.format {
            OutputFormat::Json => response::json(&result),
            OutputFormat::Csv => response::csv([result]),
        }
    }

    fn geolocate_batch_entry(&self, geo: &Geo, ip: String, user_agent: &str) -> BatchEntry {
        let result = validate_ip(&ip)
            .ok_or(ServiceError::InvalidIp)
            .and_then(|address| {
                geo.lookup_city(address)
                    .map_err(|error| ServiceError::lookup(DatabaseKind::City, error))
            });
        match self.logged(GEOLOCATE_BATCH, &ip, user_agent, result) {
            Ok(record) => BatchEntry::Found(GeoResult::new(&ip, record)),
            Err(error) => BatchEntry::Failed {
                ip,
                error: error.to_string(),
            },
        }
    }

    async fn geolocate_batch(
        &self,
        request: Request<Body>,
    ) -> Result<Response<Body>, ServiceError> {
        let query = LookupQuery::parse(request.uri().query());
        let user_agent = user_agent(request.headers()).to_owned();

        let ips = match read_ip_list(request.into_body()).await {
            Ok(ips) => ips,
            Err(error) => return self.logged(GEOLOCATE_BATCH, NO_IP, &user_agent, Err(error)),
        };

        let geo = match self.database(DatabaseKind::City) {
            Ok(geo) => geo,
            Err(error) => {
                let outcome = error.outcome();
                for ip in &ips {
                    self.request_log
                        .record(GEOLOCATE_BATCH, ip, &outcome, &user_agent);
                }
                return Err(error);
            }
        };

        let entries: Vec<BatchEntry> = ips
            .into_iter()
            .map(|ip| self.geolocate_batch_entry(geo, ip, &user_agent))
            .collect();

        match query.format {
            OutputFormat::Json => response::json(&entries),
            OutputFormat::Csv => response::csv(entries.iter().map(BatchCsvRow::from)),
        }
    }

    fn simple_lookup<R, T>(
        &self,
        endpoint: &str,
        kind: DatabaseKind,
        request: &Request<Body>,
        socket_ip_addr: IpAddr,
        lookup: impl FnOnce(&Geo, IpAddr) -> Result<R, GeoError>,
        into_result: impl FnOnce(&str, R) -> T,
    ) -> Result<Response<Body>, ServiceError>
    where
        T: Serialize,
    {
        let query = LookupQuery::parse(request.uri().query());
        let ip = query.ip_or(|| self.client_ip.infer(request.headers(), socket_ip_addr));
        let result = self
            .lookup(kind, &ip, lookup)
            .map(|record| into_result(&ip, record));
        let result = self.logged(endpoint, &ip, user_agent(request.headers()), result)?;
        response::json(&result)
    }

    async fn reverse_dns(
        &self,
        request: &Request<Body>,
        socket_ip_addr: IpAddr,
    ) -> Result<Response<Body>, ServiceError> {
        let query = LookupQuery::parse(request.uri().query());
        let ip = query.ip_or(|| self.client_ip.infer(request.headers(), socket_ip_addr));
        let result = match validate_ip(&ip) {
            Some(address) => self
                .resolver
                .reverse_lookup(address)
                .await
                .map_err(ServiceError::from),
            None => Err(ServiceError::InvalidIp),
        };
        let ptr_record = self.logged(REVERSE_DNS, &ip, user_agent(request.headers()), result)?;
        response::json(&PtrResult {
            ip: ip.into_owned(),
            ptr_record,
        })
    }

    async fn route(
        &self,
        socket_ip_addr: IpAddr,
        request: Request<Body>,
    ) -> Result<Response<Body>, ServiceError> {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();
        match (&method, path.as_str()) {
            (&Method::GET, GEOLOCATE) => self.geolocate(&request, socket_ip_addr),
            (&Method::POST, GEOLOCATE_BATCH) => self.geolocate_batch(request).await,
            (&Method::GET, ASN) => self.simple_lookup(
                ASN,
                DatabaseKind::Asn,
                &request,
                socket_ip_addr,
                Geo::lookup_asn,
                AsnResult::new,
            ),
            (&Method::GET, COUNTRY) => self.simple_lookup(
                COUNTRY,
                DatabaseKind::Country,
                &request,
                socket_ip_addr,
                Geo::lookup_country,
                CountryResult::new,
            ),
            (&Method::GET, REVERSE_DNS) => self.reverse_dns(&request, socket_ip_addr).await,
            (_, GEOLOCATE | GEOLOCATE_BATCH | ASN | COUNTRY | REVERSE_DNS) => {
                Err(ServiceError::MethodNotAllowed)
            }
            (&Method::GET | &Method::HEAD, path) => match &self.static_files {
                Some(static_files) => static_files.response(path, method == Method::HEAD).await,
                None => Err(ServiceError::PathNotFound),
            },
            _ => Err(ServiceError::MethodNotAllowed),
        }
    }

    /// Never fails: errors are turned into JSON error responses
    pub async fn response(&self, socket_ip_addr: IpAddr, request: Request<Body>) -> Response<Body> {
        let mut response = self
            .route(socket_ip_addr, request)
            .await
            .unwrap_or_else(make_error_response);
        let headers = response.headers_mut();
        for (name, value) in &self.response_headers {
            headers.insert(name, value.clone());
        }
        response
    }
}

fn body_too_large() -> ServiceError {
    ServiceError::InvalidBody(format!(
        "body is larger than {MAX_BATCH_BODY_SIZE} bytes"
    ))
}

async fn read_ip_list(mut body: Body) -> Result<Vec<String>, ServiceError> {
    // Content-Length is known up front, a chunked body is checked as it arrives
    if body.size_hint().lower() > MAX_BATCH_BODY_SIZE as u64 {
        return Err(body_too_large());
    }
    let mut bytes = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|e| ServiceError::InvalidBody(e.to_string()))?;
        if bytes.len() + chunk.len() > MAX_BATCH_BODY_SIZE {
            return Err(body_too_large());
        }
        bytes.extend_from_slice(&chunk);
    }
    serde_json::from_slice(&bytes).map_err(|e| {
        ServiceError::InvalidBody(format!(
            "expected a JSON array of IP address strings, {e}"
        ))
    })
}

pub fn log_response(socket_ip_addr: IpAddr, method: &Method, uri: &Uri, response: &Response<Body>) {
    log::info!(
        "{} {} {} {}",
        socket_ip_addr,
        method,
        uri,
        response.status(),
    );
}
