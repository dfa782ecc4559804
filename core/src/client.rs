//! Gateway clients for the two API modes.
//!
//! # Design
//! A client holds only immutable configuration (endpoint URL, default
//! parameters, decline wording) plus its transport, so one instance can be
//! shared across threads whenever the transport allows it. Each call is split
//! like the rest of the crate: `build_submit` produces an [`HttpRequest`],
//! `parse_submit` interprets an [`HttpResponse`], and `submit` runs both
//! around the transport. Nothing is retried.

use tracing::{debug, warn};

use crate::classify::{check_decline, StatusPolicy};
use crate::cleanup::MessageCleanup;
use crate::codec::{decode_fields, encode_params, ResponseFields};
use crate::config::{ReportingConfig, TransactionConfig};
use crate::error::{ClientError, GatewayError, Mode, Result};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::params::Params;

/// Client for direct mode transactions: authorize, sale and recurring billing.
#[derive(Debug, Clone)]
pub struct TransactionClient<T = UreqTransport> {
    url: String,
    host_header: Option<String>,
    defaults: Params,
    cleanup: MessageCleanup,
    transport: T,
}

impl TransactionClient<UreqTransport> {
    pub fn new(config: TransactionConfig) -> Self {
        let transport = UreqTransport::new(config.endpoint.timeout());
        Self::with_transport(config, transport)
    }
}

impl Default for TransactionClient<UreqTransport> {
    fn default() -> Self {
        Self::new(TransactionConfig::default())
    }
}

impl<T> TransactionClient<T> {
    pub fn with_transport(config: TransactionConfig, transport: T) -> Self {
        Self {
            url: config.endpoint.url(),
            defaults: config.default_params(),
            host_header: config.endpoint.host_header,
            cleanup: config.decline_messages,
            transport,
        }
    }

    /// Replace the decline message table.
    pub fn with_cleanup(mut self, cleanup: MessageCleanup) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn defaults(&self) -> &Params {
        &self.defaults
    }

    /// Encode `params` over the configured defaults into a form POST.
    pub fn build_submit(&self, params: &Params) -> Result<HttpRequest> {
        let body = encode_params(&params.merged_over(&self.defaults))?;
        Ok(form_request(&self.url, self.host_header.as_deref(), body))
    }

    /// Classify the status, decode the body, then check for a decline.
    pub fn parse_submit(&self, response: HttpResponse) -> Result<ResponseFields> {
        let fields = decode_checked(StatusPolicy::Direct, &response)?;
        check_decline(&fields, &self.cleanup).map_err(rejected)?;
        Ok(fields)
    }
}

impl<T: Transport> TransactionClient<T> {
    /// Send one transaction and return the gateway's response fields.
    #[tracing::instrument(name = "bluefin.submit", skip_all, fields(mode = %Mode::Direct, url = %self.url))]
    pub fn submit(&self, params: &Params) -> Result<ResponseFields> {
        let request = self.build_submit(params)?;
        let response = send(&self.transport, &request)?;
        self.parse_submit(response)
    }
}

/// Client for the read-only data retrieval interface.
#[derive(Debug, Clone)]
pub struct ReportingClient<T = UreqTransport> {
    url: String,
    host_header: Option<String>,
    transport: T,
}

impl ReportingClient<UreqTransport> {
    pub fn new(config: ReportingConfig) -> Self {
        let transport = UreqTransport::new(config.endpoint.timeout());
        Self::with_transport(config, transport)
    }
}

impl Default for ReportingClient<UreqTransport> {
    fn default() -> Self {
        Self::new(ReportingConfig::default())
    }
}

impl<T> ReportingClient<T> {
    pub fn with_transport(config: ReportingConfig, transport: T) -> Self {
        Self {
            url: config.endpoint.url(),
            host_header: config.endpoint.host_header,
            transport,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn build_submit(&self, params: &Params) -> Result<HttpRequest> {
        let body = encode_params(params)?;
        Ok(form_request(&self.url, self.host_header.as_deref(), body))
    }

    pub fn parse_submit(&self, response: HttpResponse) -> Result<ResponseFields> {
        decode_checked(StatusPolicy::Reporting, &response)
    }
}

impl<T: Transport> ReportingClient<T> {
    /// Run one query and return the decoded fields.
    #[tracing::instrument(name = "bluefin.submit", skip_all, fields(mode = %Mode::Reporting, url = %self.url))]
    pub fn submit(&self, params: &Params) -> Result<ResponseFields> {
        let request = self.build_submit(params)?;
        let response = send(&self.transport, &request)?;
        self.parse_submit(response)
    }
}

fn form_request(url: &str, host_header: Option<&str>, body: String) -> HttpRequest {
    let request = HttpRequest::form_post(url.to_string(), body);
    match host_header {
        Some(host) => request.with_header("host", host),
        None => request,
    }
}

fn send<T: Transport>(transport: &T, request: &HttpRequest) -> Result<HttpResponse> {
    debug!(bytes = request.body.len(), "sending gateway request");
    let response = transport.execute(request).map_err(|err| {
        warn!(error = %err, "gateway transport failed");
        ClientError::from(err)
    })?;
    debug!(status = response.status, "gateway responded");
    Ok(response)
}

fn decode_checked(policy: StatusPolicy, response: &HttpResponse) -> Result<ResponseFields> {
    policy.check_status(response.status, &response.body).map_err(rejected)?;
    Ok(decode_fields(&response.body))
}

fn rejected(err: GatewayError) -> ClientError {
    match &err.error_code {
        Some(code) => warn!(kind = %err.kind, code = %code, reason = %err.raw_message, "gateway rejected request"),
        None => warn!(kind = %err.kind, reason = %err.raw_message, "gateway rejected request"),
    }
    ClientError::Gateway(err)
}
