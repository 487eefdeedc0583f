use crate::service::ServiceError;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Response, StatusCode};
use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

fn with_content_type(
    status: StatusCode,
    content_type: &'static str,
    body: Vec<u8>,
) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Response<Body>, ServiceError> {
    let body = serde_json::to_vec(value).map_err(|e| ServiceError::Internal(e.to_string()))?;
    Ok(with_content_type(StatusCode::OK, JSON_CONTENT_TYPE, body))
}

/// Header row from the field names of the first row, no rows gives an empty body
pub fn csv_bytes<I, T>(rows: I) -> Result<Vec<u8>, csv::Error>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let mut writer = csv::Writer::from_writer(vec![]);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.into_inner().map_err(|e| e.into_error().into())
}

pub fn csv<I, T>(rows: I) -> Result<Response<Body>, ServiceError>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let body = csv_bytes(rows).map_err(|e| ServiceError::Internal(e.to_string()))?;
    Ok(with_content_type(StatusCode::OK, CSV_CONTENT_TYPE, body))
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    detail: &'a str,
}

pub fn make_error_response(error: ServiceError) -> Response<Body> {
    let detail = error.to_string();
    // Serialising a single string field cannot fail
    let body = serde_json::to_vec(&ErrorDetail { detail: &detail }).unwrap_or_default();
    with_content_type(error.status(), JSON_CONTENT_TYPE, body)
}
