use crate::service::ServiceError;

use hyper::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Body, Response};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const INDEX_FILE: &str = "index.html";

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

/// Read-only file tree served under `/`.
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    /// `None` if `root` is not a directory
    pub fn new<P: Into<PathBuf>>(root: P) -> Option<Self> {
        let root = root.into();
        root.is_dir().then_some(Self { root })
    }

    /// Maps a request path to a file below the root, paths escaping the root give `None`
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let mut path = self.root.clone();
        for segment in request_path.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return None;
            }
            path.push(segment);
        }
        if request_path.ends_with('/') || path == self.root {
            path.push(INDEX_FILE);
        }
        Some(path)
    }

    pub async fn response(
        &self,
        request_path: &str,
        head_only: bool,
    ) -> Result<Response<Body>, ServiceError> {
        let mut path = self.resolve(request_path).ok_or(ServiceError::PathNotFound)?;
        let metadata = tokio::fs::metadata(&path).await.map_err(io_error)?;
        if metadata.is_dir() {
            path.push(INDEX_FILE);
        }
        let content = tokio::fs::read(&path).await.map_err(io_error)?;
        let length = content.len();
        let body = if head_only {
            Body::empty()
        } else {
            Body::from(content)
        };
        let mut response = Response::new(body);
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type(&path)));
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
        Ok(response)
    }
}

fn io_error(error: std::io::Error) -> ServiceError {
    match error.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => ServiceError::PathNotFound,
        _ => ServiceError::Internal(error.to_string()),
    }
}
