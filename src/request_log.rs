//! Append-only, tab-separated log of handled lookups.
//!
//! Every line has the columns timestamp, endpoint, ip, outcome and user-agent.

use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
    InvalidIp,
    DatabaseNotAvailable,
    Error(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::NotFound => f.write_str("not_found"),
            Self::InvalidIp => f.write_str("invalid_ip"),
            Self::DatabaseNotAvailable => f.write_str("database_not_available"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

pub struct LogEntry<'a> {
    pub timestamp: DateTime<Utc>,
    pub endpoint: &'a str,
    pub ip: &'a str,
    pub outcome: &'a Outcome,
    pub user_agent: &'a str,
}

impl LogEntry<'_> {
    /// Single line including the trailing newline, separators inside fields are blanked
    fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\n",
            self.timestamp.format(TIMESTAMP_FORMAT),
            single_field(self.endpoint),
            single_field(self.ip),
            single_field(&self.outcome.to_string()),
            single_field(self.user_agent),
        )
    }
}

fn single_field(s: &str) -> String {
    s.replace(['\t', '\r', '\n'], " ")
}

pub struct RequestLog {
    file: Mutex<File>,
}

impl RequestLog {
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Writes the entry with a single unbuffered write under the lock, so concurrent lines
    /// never interleave. Failures are reported to the process log only.
    pub fn append(&self, entry: &LogEntry<'_>) {
        let line = entry.to_line();
        let result = match self.file.lock() {
            Ok(mut file) => file.write_all(line.as_bytes()),
            Err(poisoned) => poisoned.into_inner().write_all(line.as_bytes()),
        };
        if let Err(error) = result {
            log::error!("cannot write request log entry {line:?}: {error}");
        }
    }

    pub fn record(&self, endpoint: &str, ip: &str, outcome: &Outcome, user_agent: &str) {
        self.append(&LogEntry {
            timestamp: Utc::now(),
            endpoint,
            ip,
            outcome,
            user_agent,
        });
    }
}
