//! Bounded retry behavior of the exchanger.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

use transfer_protocol::core::wire::ResponseCode;
use transfer_protocol::transport::Exchanger;
use transfer_protocol::ProtocolError;

/// A registration request to drive the loops with; the scripted servers
/// never look inside it.
fn any_request() -> Vec<u8> {
    use transfer_protocol::core::codec::Request;
    use transfer_protocol::core::wire::{ClientId, WireName};
    Request::Registration {
        name: WireName::new("ping").unwrap(),
    }
    .encode(&ClientId::UNASSIGNED)
}

#[test]
fn persistent_server_errors_exhaust_the_budget() {
    let (listener, port) = common::listener();
    let served = Arc::new(AtomicU32::new(0));
    let count = served.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let mut stream = stream;
            count.fetch_add(1, Ordering::SeqCst);
            common::read_request(&mut stream);
            common::write_response(&mut stream, ResponseCode::GlobalError as u16, &[]);
        }
    });

    let exchanger = Exchanger::new("127.0.0.1", port).unwrap();
    let err = exchanger
        .exchange_with_retry(&any_request(), 3, "ping")
        .unwrap_err();

    assert!(matches!(
        err,
        ProtocolError::RetriesExhausted { attempts: 3, .. }
    ));
    assert!(!err.is_retryable());
    assert_eq!(served.load(Ordering::SeqCst), 3);
}

#[test]
fn an_unreachable_server_exhausts_the_budget() {
    // Bind and drop so the port is known to refuse connections.
    let (listener, port) = common::listener();
    drop(listener);

    let exchanger = Exchanger::new("127.0.0.1", port).unwrap();
    let err = exchanger
        .exchange_with_retry(&any_request(), 3, "ping")
        .unwrap_err();
    assert!(matches!(err, ProtocolError::RetriesExhausted { .. }));
}

#[test]
fn a_clean_first_attempt_opens_exactly_one_connection() {
    let (listener, port) = common::listener();
    let served = Arc::new(AtomicU32::new(0));
    let count = served.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let mut stream = stream;
            count.fetch_add(1, Ordering::SeqCst);
            common::read_request(&mut stream);
            common::write_response(&mut stream, ResponseCode::MsgReceived as u16, &[0x11; 16]);
        }
    });

    let exchanger = Exchanger::new("127.0.0.1", port).unwrap();
    exchanger
        .exchange_with_retry(&any_request(), 3, "ping")
        .unwrap();
    assert_eq!(served.load(Ordering::SeqCst), 1);
}

#[test]
fn a_transient_error_is_absorbed_by_a_later_success() {
    let (listener, port) = common::listener();
    let served = Arc::new(AtomicU32::new(0));
    let count = served.clone();
    thread::spawn(move || {
        // First attempt: server-side error. Second: a clean acknowledgement.
        let (mut stream, _) = listener.accept().unwrap();
        count.fetch_add(1, Ordering::SeqCst);
        common::read_request(&mut stream);
        common::write_response(&mut stream, ResponseCode::GlobalError as u16, &[]);
        drop(stream);

        let (mut stream, _) = listener.accept().unwrap();
        count.fetch_add(1, Ordering::SeqCst);
        common::read_request(&mut stream);
        common::write_response(&mut stream, ResponseCode::MsgReceived as u16, &[0x11; 16]);
    });

    let exchanger = Exchanger::new("127.0.0.1", port).unwrap();
    let response = exchanger
        .exchange_with_retry(&any_request(), 3, "ping")
        .unwrap();

    assert_eq!(served.load(Ordering::SeqCst), 2);
    // Header plus the 16-byte payload came back intact.
    assert_eq!(response.len(), 7 + 16);
    assert_eq!(u16::from_le_bytes([response[1], response[2]]), 2104);
}

#[test]
fn a_corrupt_header_aborts_without_retrying() {
    let (listener, port) = common::listener();
    let served = Arc::new(AtomicU32::new(0));
    let count = served.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let mut stream = stream;
            count.fetch_add(1, Ordering::SeqCst);
            common::read_request(&mut stream);
            // Declared payload size far past the sanity bound.
            let mut header = vec![common::VERSION];
            header.extend_from_slice(&2104u16.to_le_bytes());
            header.extend_from_slice(&u32::MAX.to_le_bytes());
            use std::io::Write;
            stream.write_all(&header).unwrap();
        }
    });

    let exchanger = Exchanger::new("127.0.0.1", port).unwrap();
    let err = exchanger
        .exchange_with_retry(&any_request(), 3, "ping")
        .unwrap_err();

    assert!(matches!(err, ProtocolError::OversizedPayload(_)));
    assert_eq!(served.load(Ordering::SeqCst), 1);
}
