//! End-to-end tests against the live mock gateway.
//!
//! # Design
//! Each test starts the mock gateway on a random port, then drives the real
//! clients over HTTP with the default ureq transport. This covers request
//! encoding, the transport and both classification passes together. A few
//! tests use a raw socket instead, for replies the mock gateway never sends
//! (non-UTF-8 bodies, no answer at all).

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use bluefin_core::{
    ClientError, ErrorCode, ErrorKind, Mode, Params, ReportingClient, ReportingConfig, TransactionClient,
    TransactionConfig,
};
use mock_server::Fixture;

const INVALID_CARD_NUM: &str = "4012888888881881";

/// Start the mock gateway on a background thread and return its address.
fn spawn_gateway() -> SocketAddr {
    let std_listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// Read one HTTP/1.1 request: headers, then `content-length` bytes of body.
fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    let head_end = loop {
        let n = stream.read(&mut buf).unwrap();
        assert!(n > 0, "client closed before sending headers");
        request.extend_from_slice(&buf[..n]);
        if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&request[..head_end]).to_ascii_lowercase();
    let body_len = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .map(|len| len.trim().parse::<usize>().unwrap())
        .unwrap_or(0);
    while request.len() < head_end + body_len {
        let n = stream.read(&mut buf).unwrap();
        assert!(n > 0, "client closed mid-body");
        request.extend_from_slice(&buf[..n]);
    }
    request
}

/// Serve each reply verbatim to one connection in turn, passing the raw
/// requests back to the test.
fn spawn_raw(replies: Vec<(u16, Vec<u8>)>) -> (SocketAddr, mpsc::Receiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        for (status, body) in replies {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let head = format!(
                "HTTP/1.1 {status} Gateway\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
            stream.flush().unwrap();
            let _ = tx.send(request);
        }
    });

    (addr, rx)
}

/// Accept connections and hold them open without ever answering.
fn spawn_silent() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => held.push(stream),
                Err(_) => break,
            }
        }
    });

    addr
}

fn transaction_client(addr: SocketAddr) -> TransactionClient {
    let fixture = Fixture::default();
    TransactionClient::new(
        TransactionConfig::default()
            .host(format!("http://{addr}"))
            .timeout_secs(5)
            .account_id(fixture.account_id)
            .dynip_sec_code(fixture.dynip_sec_code),
    )
}

fn reporting_client(addr: SocketAddr) -> ReportingClient {
    ReportingClient::new(ReportingConfig::default().host(format!("http://{addr}")).timeout_secs(5))
}

fn authorize() -> Params {
    let fixture = Fixture::default();
    Params::new()
        .with("pay_type", "C")
        .with("tran_type", "A")
        .with("amount", 1.0)
        .with("card_number", fixture.card_number)
        .with("card_expire", fixture.card_expire)
}

fn expect_kind(result: Result<impl std::fmt::Debug, ClientError>, kind: ErrorKind) -> bluefin_core::GatewayError {
    let err = result.unwrap_err();
    match err {
        ClientError::Gateway(gw) => {
            assert_eq!(gw.kind, kind, "unexpected error: {gw}");
            gw
        }
        other => panic!("expected gateway error, got {other:?}"),
    }
}

#[test]
fn authorize_and_recurring_are_approved() {
    let addr = spawn_gateway();
    let client = transaction_client(addr);

    let fields = client.submit(&authorize()).unwrap();
    assert_eq!(fields["status_code"], "1");
    assert_eq!(fields["auth_msg"], "APPROVED");
    assert!(fields.contains_key("trans_id"));

    let recurring = authorize().with("recurring_amount", 1.0).with("recurring_period", 31);
    let fields = client.submit(&recurring).unwrap();
    assert_eq!(fields["status_code"], "1");
    assert!(fields.contains_key("rebill_id"));
}

#[test]
fn input_errors_from_direct_mode() {
    let addr = spawn_gateway();
    let client = transaction_client(addr);

    // Call values override the configured security code.
    let gw = expect_kind(
        client.submit(&authorize().with("dynip_sec_code", "HUZZAH_FOR_I_AM_INVALID")),
        ErrorKind::Input,
    );
    assert_eq!(gw.mode, Mode::Direct);
    assert_eq!(gw.error_code, Some(ErrorCode::Status(612)));
    assert_eq!(gw.message, "INVALID DYNIP SEC CODE");

    for missing in ["card_number", "card_expire", "amount"] {
        let mut params = authorize();
        params.remove(missing);
        expect_kind(client.submit(&params), ErrorKind::Input);
    }

    expect_kind(client.submit(&authorize().with("amount", -1.0)), ErrorKind::Input);
    expect_kind(client.submit(&authorize().with("amount", "a")), ErrorKind::Input);
}

#[test]
fn processing_error_from_direct_mode() {
    let addr = spawn_gateway();
    let gw = expect_kind(
        transaction_client(addr).submit(&authorize().with("tran_type", "Z")),
        ErrorKind::Processing,
    );
    assert!(gw.kind.is_processing());
    assert_eq!(gw.error_code, Some(ErrorCode::Status(701)));
}

#[test]
fn sale_with_invalid_card_is_declined() {
    let addr = spawn_gateway();
    let sale = authorize().with("tran_type", "S").with("card_number", INVALID_CARD_NUM);

    let gw = expect_kind(transaction_client(addr).submit(&sale), ErrorKind::Declined);
    assert!(gw.kind.is_processing());
    assert!(gw.message.contains("credit card number that was provided is invalid"));
    assert_eq!(gw.raw_message, "INVALID CARD NO");
    assert_eq!(gw.error_code, Some(ErrorCode::Field("0".into())));
}

#[test]
fn cvv_mismatch_and_reason_code_declines() {
    let addr = spawn_gateway();
    let client = transaction_client(addr);

    let gw = expect_kind(client.submit(&authorize().with("card_cvv2", "999")), ErrorKind::Declined);
    assert!(gw.message.starts_with("The Card Security Code that was provided is invalid."));
    assert_eq!(gw.raw_message, "CVV2 MISMATCH");
    assert_eq!(gw.error_code, Some(ErrorCode::Field("F".into())));

    // No auth_msg: the message falls back to reason_code2.
    let gw = expect_kind(client.submit(&authorize().with("card_expire", "0101")), ErrorKind::Declined);
    assert_eq!(gw.raw_message, "AUTH DECLINED");
    assert_eq!(gw.message, "Your payment was declined.");
}

#[test]
fn reporting_round_trip() {
    let addr = spawn_gateway();
    let fixture = Fixture::default();
    let reporting = reporting_client(addr);

    // Empty query.
    let gw = expect_kind(reporting.submit(&Params::new()), ErrorKind::Input);
    assert_eq!(gw.mode, Mode::Reporting);
    assert_eq!(gw.error_code, Some(ErrorCode::Status(457)));

    let query = Params::new()
        .with("transactions_after", "2006-12-30")
        .with("account_id", fixture.account_id.as_str())
        .with("authorization", fixture.report_authorization.as_str());

    let fields = reporting.submit(&query).unwrap();
    assert_eq!(fields["count"], "0");

    let direct = transaction_client(addr);
    direct.submit(&authorize()).unwrap();
    direct.submit(&authorize().with("amount", 2.5)).unwrap();

    let fields = reporting.submit(&query).unwrap();
    assert_eq!(fields["count"], "2");
    assert_eq!(fields["amount"], "1.0,2.5");
    assert_eq!(fields["tran_type"], "A,A");
    assert_eq!(fields["trans_id"].split(',').count(), 2);

    let gw = expect_kind(reporting.submit(&query.with("authorization", "wrong")), ErrorKind::Processing);
    assert_eq!(gw.error_code, Some(ErrorCode::Status(461)));
}

#[test]
fn status_ranges_over_http() {
    let addr = spawn_gateway();

    let direct = TransactionClient::new(TransactionConfig::default().host(format!("http://{addr}")).path("/status/650"));
    expect_kind(direct.submit(&Params::new()), ErrorKind::Input);

    let direct = TransactionClient::new(TransactionConfig::default().host(format!("http://{addr}")).path("/status/503"));
    let gw = expect_kind(direct.submit(&Params::new().with("detail", "down")), ErrorKind::Generic);
    assert_eq!(gw.message, "detail=down");

    // A 200 echo of an in-band decline goes through the second pass.
    let direct = TransactionClient::new(TransactionConfig::default().host(format!("http://{addr}")).path("/status/200"));
    let gw = expect_kind(
        direct.submit(&Params::new().with("status_code", "F").with("auth_msg", "C/DECLINED")),
        ErrorKind::Declined,
    );
    assert_eq!(gw.message, "Your payment was declined.");

    let reporting = ReportingClient::new(ReportingConfig::default().host(format!("http://{addr}")).path("/status/418"));
    expect_kind(reporting.submit(&Params::new()), ErrorKind::Processing);

    let reporting = ReportingClient::new(ReportingConfig::default().host(format!("http://{addr}")).path("/status/650"));
    expect_kind(reporting.submit(&Params::new()), ErrorKind::Generic);
}

#[test]
fn unreachable_gateway_is_a_transport_error() {
    let std_listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    drop(std_listener);

    let err = transaction_client(addr).submit(&authorize()).unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
    assert_eq!(err.kind(), None);
}

#[test]
fn non_utf8_bodies_are_still_classified() {
    let (addr, _requests) = spawn_raw(vec![
        (620, b"NUM\xc9RO DE CARTE INVALIDE".to_vec()),
        (200, b"status_code=F&auth_msg=CVV2+MISMATCH+\xe9".to_vec()),
    ]);
    let client = transaction_client(addr);

    let gw = expect_kind(client.submit(&authorize()), ErrorKind::Input);
    assert_eq!(gw.error_code, Some(ErrorCode::Status(620)));
    assert!(gw.message.starts_with("NUM"));
    assert!(gw.message.ends_with("RO DE CARTE INVALIDE"));

    let gw = expect_kind(client.submit(&authorize()), ErrorKind::Declined);
    assert_eq!(gw.error_code, Some(ErrorCode::Field("F".into())));
    assert!(gw.raw_message.starts_with("CVV2 MISMATCH"));
    assert!(gw.message.starts_with("The Card Security Code that was provided is invalid."));
}

#[test]
fn timeouts_are_per_client() {
    let addr = spawn_silent();
    let host = format!("http://{addr}");
    let quick = TransactionClient::new(TransactionConfig::default().host(host.as_str()).timeout_secs(1));
    let patient = TransactionClient::new(TransactionConfig::default().host(host.as_str()).timeout_secs(3));

    let started = Instant::now();
    let err = quick.submit(&authorize()).unwrap_err();
    let elapsed = started.elapsed();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
    assert!(elapsed >= Duration::from_millis(900), "gave up after {elapsed:?}");
    assert!(elapsed < Duration::from_millis(2500), "took {elapsed:?}");

    // The quick client's timeout does not leak into the other one.
    let started = Instant::now();
    let err = patient.submit(&authorize()).unwrap_err();
    let elapsed = started.elapsed();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
    assert!(elapsed >= Duration::from_millis(2500), "gave up after {elapsed:?}");
}

#[test]
fn fixed_host_header_reaches_the_gateway() {
    let (addr, requests) = spawn_raw(vec![(200, b"count=0".to_vec())]);
    let reporting = ReportingClient::new(
        ReportingConfig::default()
            .host(format!("http://{addr}"))
            .timeout_secs(5)
            .host_header("secure.bluefingateway.com"),
    );

    let fields = reporting.submit(&Params::new().with("transactions_after", "2006-12-30")).unwrap();
    assert_eq!(fields["count"], "0");

    let request = String::from_utf8(requests.recv_timeout(Duration::from_secs(5)).unwrap()).unwrap();
    let request = request.to_ascii_lowercase();
    assert!(request.contains("host: secure.bluefingateway.com\r\n"), "request was {request}");
    assert!(request.ends_with("transactions_after=2006-12-30"));
}
