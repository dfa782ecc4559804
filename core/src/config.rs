//! Client configuration.
//!
//! Every field has a default pointing at the production gateway, so an empty
//! JSON object is a valid config. Files look like:
//!
//! ```json
//! {
//!   "host": "https://secure.bluefingateway.com:1402",
//!   "timeout_secs": 30,
//!   "account_id": 123456789012,
//!   "dynip_sec_code": "YOUR_CODE_HERE"
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::cleanup::MessageCleanup;
use crate::error::ConfigError;
use crate::params::{ParamValue, Params};

pub const DIRECT_HOST: &str = "https://secure.bluefingateway.com:1402";
pub const DIRECT_PATH: &str = "/gw/sas/direct3.1";
pub const REPORTING_HOST: &str = "https://secure.bluefingateway.com";
pub const REPORTING_PATH: &str = "/gw/reports/transaction1.5";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Where and how long to talk to one gateway interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Scheme, host and port with no trailing slash.
    pub host: String,
    /// Path appended verbatim to `host`.
    pub path: String,
    pub timeout_secs: u64,
    /// Fixed `host` header, e.g. `secure.bluefingateway.com`. When unset the
    /// transport derives it from `host`.
    pub host_header: Option<String>,
}

impl EndpointConfig {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            host_header: None,
        }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.host, self.path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn direct_endpoint() -> EndpointConfig {
    EndpointConfig::new(DIRECT_HOST, DIRECT_PATH)
}

fn reporting_endpoint() -> EndpointConfig {
    EndpointConfig::new(REPORTING_HOST, REPORTING_PATH)
}

/// Flat on-disk shape shared by both configs; missing fields take the
/// mode's defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EndpointOverrides {
    host: Option<String>,
    path: Option<String>,
    timeout_secs: Option<u64>,
    host_header: Option<String>,
}

impl EndpointOverrides {
    fn apply(self, mut endpoint: EndpointConfig) -> EndpointConfig {
        if let Some(host) = self.host {
            endpoint.host = host;
        }
        if let Some(path) = self.path {
            endpoint.path = path;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            endpoint.timeout_secs = timeout_secs;
        }
        if let Some(host_header) = self.host_header {
            endpoint.host_header = Some(host_header);
        }
        endpoint
    }
}

/// Configuration for [`TransactionClient`](crate::TransactionClient).
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionConfig {
    pub endpoint: EndpointConfig,
    /// Sent as `account_id` unless a call overrides it.
    pub account_id: Option<ParamValue>,
    /// Sent as `dynip_sec_code` unless a call overrides it.
    pub dynip_sec_code: Option<String>,
    pub decline_messages: MessageCleanup,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            endpoint: direct_endpoint(),
            account_id: None,
            dynip_sec_code: None,
            decline_messages: MessageCleanup::default(),
        }
    }
}

#[derive(Deserialize)]
struct RawTransactionConfig {
    #[serde(flatten)]
    endpoint: EndpointOverrides,
    #[serde(default)]
    account_id: Option<ParamValue>,
    #[serde(default)]
    dynip_sec_code: Option<String>,
    #[serde(default)]
    decline_messages: Option<MessageCleanup>,
}

impl<'de> Deserialize<'de> for TransactionConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawTransactionConfig::deserialize(deserializer)?;
        Ok(Self {
            endpoint: raw.endpoint.apply(direct_endpoint()),
            account_id: raw.account_id.filter(|id| *id != ParamValue::Null),
            dynip_sec_code: raw.dynip_sec_code,
            decline_messages: raw.decline_messages.unwrap_or_default(),
        })
    }
}

impl TransactionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.endpoint.host = host.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.endpoint.path = path.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.endpoint.timeout_secs = secs;
        self
    }

    pub fn host_header(mut self, host: impl Into<String>) -> Self {
        self.endpoint.host_header = Some(host.into());
        self
    }

    pub fn account_id(mut self, account_id: impl Into<ParamValue>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn dynip_sec_code(mut self, code: impl Into<String>) -> Self {
        self.dynip_sec_code = Some(code.into());
        self
    }

    pub fn decline_messages(mut self, cleanup: MessageCleanup) -> Self {
        self.decline_messages = cleanup;
        self
    }

    /// Parameters merged under every request.
    pub fn default_params(&self) -> Params {
        let mut params = Params::new();
        if let Some(account_id) = &self.account_id {
            params.insert("account_id", account_id.clone());
        }
        if let Some(code) = &self.dynip_sec_code {
            params.insert("dynip_sec_code", code.as_str());
        }
        params
    }
}

/// Configuration for [`ReportingClient`](crate::ReportingClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingConfig {
    pub endpoint: EndpointConfig,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            endpoint: reporting_endpoint(),
        }
    }
}

impl<'de> Deserialize<'de> for ReportingConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let overrides = EndpointOverrides::deserialize(deserializer)?;
        Ok(Self {
            endpoint: overrides.apply(reporting_endpoint()),
        })
    }
}

impl ReportingConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.endpoint.host = host.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.endpoint.path = path.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.endpoint.timeout_secs = secs;
        self
    }

    pub fn host_header(mut self, host: impl Into<String>) -> Self {
        self.endpoint.host_header = Some(host.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_production() {
        let direct = TransactionConfig::default();
        assert_eq!(direct.endpoint.url(), "https://secure.bluefingateway.com:1402/gw/sas/direct3.1");
        assert_eq!(direct.endpoint.timeout(), Duration::from_secs(15));
        assert!(direct.default_params().is_empty());

        let reporting = ReportingConfig::default();
        assert_eq!(reporting.endpoint.url(), "https://secure.bluefingateway.com/gw/reports/transaction1.5");
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(TransactionConfig::from_json_str("{}").unwrap(), TransactionConfig::default());
        assert_eq!(ReportingConfig::from_json_str("{}").unwrap(), ReportingConfig::default());
    }

    #[test]
    fn json_overrides_and_defaults() {
        let config = TransactionConfig::from_json_str(
            r#"{"host":"http://127.0.0.1:3000","timeout_secs":5,"account_id":123456789012,"dynip_sec_code":"SEC"}"#,
        )
        .unwrap();
        assert_eq!(config.endpoint.url(), "http://127.0.0.1:3000/gw/sas/direct3.1");
        assert_eq!(config.endpoint.timeout_secs, 5);

        let params = config.default_params();
        assert_eq!(params.get("account_id"), Some(&ParamValue::Int(123456789012)));
        assert_eq!(params.get("dynip_sec_code"), Some(&ParamValue::from("SEC")));
    }

    #[test]
    fn json_decline_messages_replace_table() {
        let config = TransactionConfig::from_json_str(
            r#"{"decline_messages":[{"prefix":"EXPIRED","replacement":"Card expired."}]}"#,
        )
        .unwrap();
        assert_eq!(config.decline_messages.rules().len(), 1);
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = ReportingConfig::from_json_str(r#"{"timeout_secs":"soon"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = TransactionConfig::from_json_file("/nonexistent/bluefin.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn builder_setters() {
        let config = ReportingConfig::default().host("http://localhost:3000").path("/r").timeout_secs(1);
        assert_eq!(config.endpoint.url(), "http://localhost:3000/r");
        assert_eq!(config.endpoint.timeout(), Duration::from_secs(1));
        assert_eq!(config.endpoint.host_header, None);

        let config = TransactionConfig::default().host_header("secure.bluefingateway.com");
        assert_eq!(config.endpoint.host_header.as_deref(), Some("secure.bluefingateway.com"));
    }

    #[test]
    fn host_header_from_json() {
        let config = ReportingConfig::from_json_str(r#"{"host_header":"secure.bluefingateway.com"}"#).unwrap();
        assert_eq!(config.endpoint.host_header.as_deref(), Some("secure.bluefingateway.com"));
        assert_eq!(config.endpoint.url(), "https://secure.bluefingateway.com/gw/reports/transaction1.5");
    }
}
