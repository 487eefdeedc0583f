pub mod config;
pub mod geo;
pub mod header_tools;
pub mod ip_input;
pub mod request_log;
pub mod response;
pub mod results;
pub mod reverse_dns;
pub mod service;
mod static_files;
mod unavailable;
