//! Synchronous client for the Bluefin payment gateway.
//!
//! # Overview
//! Two clients cover the gateway's two interfaces:
//! - [`TransactionClient`] talks to direct mode (authorize, sale, recurring).
//! - [`ReportingClient`] talks to the read-only data retrieval interface.
//!
//! Parameters are opaque key/value pairs encoded as a form body; responses are
//! form bodies decoded into [`ResponseFields`]. Gateway failures surface as a
//! [`GatewayError`] tagged with an [`ErrorKind`].
//!
//! ```no_run
//! use bluefin_core::{ErrorKind, Params, TransactionClient, TransactionConfig};
//!
//! let client = TransactionClient::new(
//!     TransactionConfig::default()
//!         .account_id(123456789012_i64)
//!         .dynip_sec_code("YOUR_CODE_HERE"),
//! );
//! let sale = Params::new()
//!     .with("pay_type", "C")
//!     .with("tran_type", "S")
//!     .with("amount", 1.0)
//!     .with("card_number", "4444333322221111")
//!     .with("card_expire", "1212");
//!
//! match client.submit(&sale) {
//!     Ok(fields) => println!("approved: {:?}", fields.get("trans_id")),
//!     Err(err) if err.kind() == Some(ErrorKind::Declined) => println!("declined: {err}"),
//!     Err(err) => eprintln!("failed: {err}"),
//! }
//! ```
//!
//! # Design
//! - Clients are immutable and hold no per-call state.
//! - Each call is split into `build_submit` and `parse_submit` so the I/O
//!   boundary is explicit; `submit` runs both around a [`Transport`].
//! - Timeouts live on the transport instance, never in global state.

pub mod classify;
pub mod cleanup;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod params;

pub use classify::{check_decline, StatusPolicy};
pub use cleanup::{CleanupRule, MessageCleanup};
pub use client::{ReportingClient, TransactionClient};
pub use codec::{decode_fields, encode_params, ResponseFields};
pub use config::{EndpointConfig, ReportingConfig, TransactionConfig};
pub use error::{ClientError, ConfigError, ErrorCode, ErrorKind, GatewayError, Mode, TransportError};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use params::{ParamValue, Params};
