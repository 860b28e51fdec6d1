//! Error-tracker DSN parsing

use crate::core::{LoggerError, Result};
use std::fmt;
use std::str::FromStr;

/// Client identifier sent in the auth header
pub const CLIENT_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A parsed `https://<public_key>@<host>[:port]/<path/>project_id` DSN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    scheme: String,
    public_key: String,
    host: String,
    port: Option<u16>,
    /// Path before the project id; empty or ending with `/`
    path: String,
    project_id: String,
}

impl Dsn {
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Event ingestion URL: `{scheme}://{host}/{path}api/{project}/store/`
    pub fn store_url(&self) -> String {
        let authority = match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        };
        format!(
            "{}://{}/{}api/{}/store/",
            self.scheme, authority, self.path, self.project_id
        )
    }

    /// Value of the `X-Sentry-Auth` header
    pub fn auth_header(&self) -> String {
        format!(
            "Sentry sentry_version=7, sentry_key={}, sentry_client={}",
            self.public_key, CLIENT_NAME
        )
    }
}

impl FromStr for Dsn {
    type Err = LoggerError;

    fn from_str(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| LoggerError::config("tracker", format!("invalid DSN: {}", reason));

        let url = url::Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.username().is_empty() {
            return Err(invalid("missing public key"));
        }
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;

        let segments: Vec<&str> = url
            .path()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        let Some((project_id, prefix)) = segments.split_last() else {
            return Err(invalid("missing project id"));
        };

        let path = prefix.iter().map(|segment| format!("{}/", segment)).collect();

        Ok(Self {
            scheme: url.scheme().to_string(),
            public_key: url.username().to_string(),
            host: host.to_string(),
            port: url.port(),
            path,
            project_id: (*project_id).to_string(),
        })
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}@{}", self.scheme, self.public_key, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        write!(f, "/{}{}", self.path, self.project_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_dsn() {
        let dsn: Dsn = "https://abc123@o42.ingest.example.io/7".parse().unwrap();

        assert_eq!(dsn.public_key(), "abc123");
        assert_eq!(dsn.host(), "o42.ingest.example.io");
        assert_eq!(dsn.project_id(), "7");
        assert_eq!(dsn.store_url(), "https://o42.ingest.example.io/api/7/store/");
    }

    #[test]
    fn test_parse_dsn_with_port_and_path() {
        let dsn: Dsn = "http://key@tracker.local:9000/errors/self-hosted/12".parse().unwrap();

        assert_eq!(
            dsn.store_url(),
            "http://tracker.local:9000/errors/self-hosted/api/12/store/"
        );
        assert_eq!(dsn.to_string(), "http://key@tracker.local:9000/errors/self-hosted/12");
    }

    #[test]
    fn test_auth_header() {
        let dsn: Dsn = "https://abc123@tracker.example.io/7".parse().unwrap();
        let header = dsn.auth_header();

        assert!(header.starts_with("Sentry sentry_version=7, sentry_key=abc123"));
        assert!(header.ends_with(CLIENT_NAME));
    }

    #[test]
    fn test_rejects_malformed_dsn() {
        for raw in [
            "",
            "not a dsn",
            "https://tracker.example.io/7",
            "https://key@tracker.example.io/",
            "ftp://key@tracker.example.io/7",
        ] {
            let err = raw.parse::<Dsn>().unwrap_err();
            assert!(err.is_configuration(), "{raw:?} should be rejected");
        }
    }
}
