//! Error types for the Bluefin gateway clients.
//!
//! # Design
//! The gateway reports problems on two layers: nonstandard HTTP status ranges
//! for malformed or failed requests, and an in-band `status_code` field for
//! transactions that were processed but declined. Both land in one
//! [`GatewayError`] whose [`ErrorKind`] callers branch on. A declined
//! transaction is a processing error as well, see [`ErrorKind::is_processing`].
//!
//! Failures below the gateway (DNS, TLS, timeouts, connection resets) never
//! reach the classifier and stay in [`TransportError`].

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Which API a failed call was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Direct mode transaction processing.
    Direct,
    /// Data retrieval (reporting) interface.
    Reporting,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Direct => f.write_str("direct"),
            Mode::Reporting => f.write_str("reporting"),
        }
    }
}

/// Classification of a gateway-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Non-success status outside any documented range.
    Generic,
    /// The request was malformed or incomplete. Fix the input before retrying.
    Input,
    /// The gateway failed while processing the request. May be transient.
    Processing,
    /// The transaction was processed and rejected, e.g. bad card number or CVV.
    Declined,
}

impl ErrorKind {
    /// `true` for processing failures, including declines.
    pub fn is_processing(self) -> bool {
        matches!(self, ErrorKind::Processing | ErrorKind::Declined)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Generic => "generic",
            ErrorKind::Input => "input",
            ErrorKind::Processing => "processing",
            ErrorKind::Declined => "declined",
        };
        f.write_str(name)
    }
}

/// Code attached to a gateway error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// The HTTP status the gateway answered with.
    Status(u16),
    /// A response field value, `status_code` or `reason_code2`.
    Field(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Status(status) => write!(f, "{status}"),
            ErrorCode::Field(value) => f.write_str(value),
        }
    }
}

/// A failure reported by the gateway.
///
/// `message` is presentable to end users; `raw_message` is exactly what the
/// gateway sent. They differ only for declines whose text matched a cleanup
/// rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub mode: Mode,
    pub message: String,
    pub raw_message: String,
    pub error_code: Option<ErrorCode>,
}

impl GatewayError {
    /// An error whose message needs no cleanup.
    pub fn new(kind: ErrorKind, mode: Mode, message: impl Into<String>, error_code: Option<ErrorCode>) -> Self {
        let message = message.into();
        Self {
            kind,
            mode,
            raw_message: message.clone(),
            message,
            error_code,
        }
    }

    pub fn is_declined(&self) -> bool {
        self.kind == ErrorKind::Declined
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_code {
            Some(code) => write!(f, "{} (Error Code: {code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Connection-level failure raised by a [`Transport`](crate::http::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP transport failed: {0}")]
    Ureq(#[from] ureq::Error),

    #[error("HTTP transport failed: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Everything `submit` can fail with.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The gateway answered and reported a failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// No usable answer was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The parameters could not be form-encoded.
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
}

impl ClientError {
    pub fn gateway(&self) -> Option<&GatewayError> {
        match self {
            ClientError::Gateway(err) => Some(err),
            _ => None,
        }
    }

    /// Gateway error kind, `None` for transport and encoding failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.gateway().map(|err| err.kind)
    }
}

/// Failure to load client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
