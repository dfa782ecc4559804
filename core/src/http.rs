//! HTTP transport seam.
//!
//! # Design
//! Requests and responses are plain data. Clients build an [`HttpRequest`],
//! hand it to a [`Transport`], and interpret the returned [`HttpResponse`];
//! hosts that run their own I/O can skip the transport and call the client's
//! `build_submit` / `parse_submit` halves directly.
//!
//! The request timeout belongs to the transport instance. Nothing here sets
//! process-wide socket state, so clients with different timeouts coexist.

use std::fmt;
use std::time::Duration;

use crate::error::TransportError;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub const USER_AGENT: &str = concat!("RustBluefin/", env!("CARGO_PKG_VERSION"));

/// A form POST described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// A POST of `body` to `url` with the gateway's fixed headers.
    pub fn form_post(url: String, body: String) -> Self {
        Self {
            url,
            headers: vec![
                ("content-type".to_string(), FORM_CONTENT_TYPE.to_string()),
                ("user-agent".to_string(), USER_AGENT.to_string()),
            ],
            body,
        }
    }

    /// Add a header, e.g. a fixed `host` overriding the one derived from `url`.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Executes one request. Non-success statuses are data, not errors; only
/// connection-level failures return `Err`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    timeout: Duration,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").field("timeout", &self.timeout).finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        // Gateway errors travel as 4xx-7xx statuses and must reach the classifier.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut response = builder.send(request.body.as_bytes())?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        // Gateways answer in Latin-1 now and then; the body still has to reach
        // the classifier, so invalid UTF-8 is replaced rather than rejected.
        let bytes = response.body_mut().read_to_vec()?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(HttpResponse { status, headers, body })
    }
}
