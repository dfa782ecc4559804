//! In-memory emulation of the Bluefin gateway's direct mode and data
//! retrieval endpoints.
//!
//! Status codes follow the gateway's conventions: 6xx for direct mode input
//! errors, 7xx for direct mode processing errors, 457 for reporting input
//! errors and 418-499 for reporting processing errors. Declines are answered
//! with 200 and an in-band `status_code`.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Form, Router,
};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DIRECT_PATH: &str = "/gw/sas/direct3.1";
pub const REPORTING_PATH: &str = "/gw/reports/transaction1.5";

/// Credentials and card data the gateway accepts.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub account_id: String,
    pub dynip_sec_code: String,
    pub report_authorization: String,
    pub card_number: String,
    pub card_expire: String,
    pub card_cvv2: String,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            account_id: "123456789012".to_string(),
            dynip_sec_code: "SEC-CODE".to_string(),
            report_authorization: "qRdNQK0lkc7vwHP2h6mm".to_string(),
            card_number: "4444333322221111".to_string(),
            card_expire: "1212".to_string(),
            card_cvv2: "123".to_string(),
        }
    }
}

/// An approved transaction.
#[derive(Clone, Debug)]
struct Transaction {
    trans_id: String,
    tran_type: String,
    amount: String,
}

#[derive(Clone)]
struct Gateway {
    fixture: Arc<Fixture>,
    ledger: Arc<RwLock<Vec<Transaction>>>,
}

type Fields = HashMap<String, String>;

/// A gateway answer: HTTP status plus form-encoded or plain body.
type Reply = (StatusCode, String);

pub fn app() -> Router {
    app_with(Fixture::default())
}

pub fn app_with(fixture: Fixture) -> Router {
    let gateway = Gateway {
        fixture: Arc::new(fixture),
        ledger: Arc::new(RwLock::new(Vec::new())),
    };
    Router::new()
        .route(DIRECT_PATH, post(direct))
        .route(REPORTING_PATH, post(reporting))
        .route("/status/{code}", post(fixed_status))
        .with_state(gateway)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn reject(code: u16, message: &str) -> Reply {
    tracing::debug!(code, reason = message, "rejecting request");
    (status(code), message.to_string())
}

fn form_body(pairs: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(pairs).unwrap_or_default()
}

fn collect(pairs: Vec<(String, String)>) -> Fields {
    pairs.into_iter().collect()
}

fn present<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

async fn direct(State(gw): State<Gateway>, Form(pairs): Form<Vec<(String, String)>>) -> Reply {
    let fields = collect(pairs);
    let fixture = &gw.fixture;

    if present(&fields, "account_id") != Some(fixture.account_id.as_str()) {
        return reject(601, "INVALID ACCOUNT ID");
    }
    if present(&fields, "dynip_sec_code") != Some(fixture.dynip_sec_code.as_str()) {
        return reject(612, "INVALID DYNIP SEC CODE");
    }
    if present(&fields, "pay_type").is_none() {
        return reject(602, "MISSING PAY TYPE");
    }
    let Some(tran_type) = present(&fields, "tran_type") else {
        return reject(603, "MISSING TRAN TYPE");
    };
    let Some(card_number) = present(&fields, "card_number") else {
        return reject(620, "MISSING CARD NUMBER");
    };
    if present(&fields, "card_expire").is_none() {
        return reject(621, "MISSING CARD EXPIRATION");
    }
    let Some(amount) = present(&fields, "amount") else {
        return reject(630, "MISSING AMOUNT");
    };
    if !amount.parse::<f64>().is_ok_and(|a| a.is_finite() && a >= 0.0) {
        return reject(631, "INVALID AMOUNT");
    }
    if !matches!(tran_type, "A" | "S") {
        return reject(701, "UNSUPPORTED TRANSACTION TYPE");
    }

    if card_number != fixture.card_number {
        return (
            StatusCode::OK,
            form_body(&[
                ("status_code", "0"),
                ("auth_msg", "INVALID CARD NO"),
                ("reason_code2", "INVALID CARD"),
            ]),
        );
    }
    if present(&fields, "card_expire") != Some(fixture.card_expire.as_str()) {
        return (
            StatusCode::OK,
            form_body(&[("status_code", "0"), ("reason_code2", "AUTH DECLINED")]),
        );
    }
    if present(&fields, "card_cvv2").is_some_and(|cvv| cvv != fixture.card_cvv2) {
        return (
            StatusCode::OK,
            form_body(&[
                ("status_code", "F"),
                ("auth_msg", "CVV2 MISMATCH"),
                ("reason_code2", "N7"),
            ]),
        );
    }

    let trans_id = Uuid::new_v4().simple().to_string();
    gw.ledger.write().await.push(Transaction {
        trans_id: trans_id.clone(),
        tran_type: tran_type.to_string(),
        amount: amount.to_string(),
    });

    let mut reply = vec![
        ("status_code", "1"),
        ("auth_code", "123456"),
        ("auth_msg", "APPROVED"),
        ("trans_id", trans_id.as_str()),
    ];
    let rebill_id = present(&fields, "recurring_period").map(|_| Uuid::new_v4().simple().to_string());
    if let Some(rebill_id) = &rebill_id {
        reply.push(("rebill_id", rebill_id.as_str()));
    }
    (StatusCode::OK, form_body(&reply))
}

async fn reporting(State(gw): State<Gateway>, Form(pairs): Form<Vec<(String, String)>>) -> Reply {
    let fields = collect(pairs);
    let fixture = &gw.fixture;

    if fields.is_empty() {
        return reject(457, "NO INPUT");
    }
    if present(&fields, "account_id") != Some(fixture.account_id.as_str()) {
        return reject(457, "INVALID ACCOUNT ID");
    }
    let Some(authorization) = present(&fields, "authorization") else {
        return reject(457, "MISSING AUTHORIZATION");
    };
    if authorization != fixture.report_authorization {
        return reject(461, "AUTHORIZATION FAILED");
    }

    let ledger = gw.ledger.read().await;
    let count = ledger.len().to_string();
    let mut reply: Vec<(&str, &str)> = Vec::with_capacity(ledger.len() * 3 + 1);
    for tx in ledger.iter() {
        reply.push(("trans_id", tx.trans_id.as_str()));
        reply.push(("tran_type", tx.tran_type.as_str()));
        reply.push(("amount", tx.amount.as_str()));
    }
    reply.push(("count", count.as_str()));
    (StatusCode::OK, form_body(&reply))
}

/// Answer with an arbitrary status, echoing the request body.
async fn fixed_status(Path(code): Path<u16>, body: String) -> Reply {
    (status(code), body)
}
