//! Mapping of gateway responses onto [`ErrorKind`].
//!
//! The status ranges are chosen by the gateway operator and have nothing to
//! do with HTTP semantics, so they are kept as literal thresholds per mode.

use crate::cleanup::MessageCleanup;
use crate::codec::ResponseFields;
use crate::error::{ErrorCode, ErrorKind, GatewayError, Mode};

/// Status codes that mark a declined direct mode transaction.
const DECLINED_STATUS_CODES: [&str; 2] = ["F", "0"];

/// HTTP status classification rules for one API mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPolicy {
    Direct,
    Reporting,
}

impl StatusPolicy {
    pub fn mode(self) -> Mode {
        match self {
            StatusPolicy::Direct => Mode::Direct,
            StatusPolicy::Reporting => Mode::Reporting,
        }
    }

    /// Error kind for `status`, `None` when the call succeeded.
    pub fn kind_for(self, status: u16) -> Option<ErrorKind> {
        match self {
            StatusPolicy::Direct => match status {
                600..=699 => Some(ErrorKind::Input),
                700..=799 => Some(ErrorKind::Processing),
                s if s > 200 => Some(ErrorKind::Generic),
                _ => None,
            },
            StatusPolicy::Reporting => match status {
                457 => Some(ErrorKind::Input),
                418..=499 => Some(ErrorKind::Processing),
                s if s > 200 => Some(ErrorKind::Generic),
                _ => None,
            },
        }
    }

    /// Check the HTTP layer of a response.
    ///
    /// The error message is the response body, or `HTTP <status>` when the
    /// gateway sent none.
    pub fn check_status(self, status: u16, body: &str) -> Result<(), GatewayError> {
        let Some(kind) = self.kind_for(status) else {
            return Ok(());
        };
        let body = body.trim();
        let message = if body.is_empty() {
            format!("HTTP {status}")
        } else {
            body.to_string()
        };
        Err(GatewayError::new(kind, self.mode(), message, Some(ErrorCode::Status(status))))
    }
}

/// Check the in-band `status_code` of a decoded direct mode response.
///
/// `auth_msg` is the preferred reason, `reason_code2` the fallback. The
/// message is cleaned with `cleanup`; the original stays in `raw_message`.
pub fn check_decline(fields: &ResponseFields, cleanup: &MessageCleanup) -> Result<(), GatewayError> {
    let status_code = fields.get("status_code").map(String::as_str);
    if !status_code.is_some_and(|code| DECLINED_STATUS_CODES.contains(&code)) {
        return Ok(());
    }

    let reason_code = fields.get("reason_code2");
    let raw_message = fields
        .get("auth_msg")
        .filter(|msg| !msg.is_empty())
        .or(reason_code)
        .cloned()
        .unwrap_or_default();
    let error_code = status_code
        .map(str::to_string)
        .or_else(|| reason_code.cloned())
        .map(ErrorCode::Field);

    Err(GatewayError {
        kind: ErrorKind::Declined,
        mode: Mode::Direct,
        message: cleanup.apply(&raw_message),
        raw_message,
        error_code,
    })
}
