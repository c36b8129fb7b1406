//! Full client runs against a scripted server, including identity
//! persistence and the re-registration fallback.

mod common;

use std::fs;
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Oaep, RsaPublicKey};
use sha1::Sha1;
use tempfile::tempdir;

use transfer_protocol::config::TransferConfig;
use transfer_protocol::core::wire::ResponseCode;
use transfer_protocol::crypto::checksum;
use transfer_protocol::service::{client, IdentityStore};

const SESSION_KEY: [u8; 16] = [0x42; 16];

fn crc_ack(id: &[u8; 16], content_size: u32, crc: u32) -> Vec<u8> {
    let mut payload = Vec::with_capacity(279);
    payload.extend_from_slice(id);
    payload.extend_from_slice(&content_size.to_le_bytes());
    payload.extend_from_slice(&[0u8; common::NAME_SIZE]);
    payload.extend_from_slice(&crc.to_le_bytes());
    payload
}

/// Serve one complete run: optionally reject a leading reconnect, then
/// handle registration, key exchange, one clean file send, and the close.
/// Returns the request codes seen.
fn full_run_server(
    listener: TcpListener,
    assigned_id: [u8; 16],
    plaintext_crc: u32,
) -> JoinHandle<Vec<u16>> {
    thread::spawn(move || {
        let mut codes = Vec::new();
        for stream in listener.incoming().flatten() {
            let mut stream = stream;
            let request = common::read_request(&mut stream);
            codes.push(request.code);
            match request.code {
                // Reconnect: this server never remembers anyone.
                1002 => common::write_response(
                    &mut stream,
                    ResponseCode::ReconnectRejected as u16,
                    &assigned_id,
                ),
                1100 => common::write_response(
                    &mut stream,
                    ResponseCode::RegistrationSucceeded as u16,
                    &assigned_id,
                ),
                1101 => {
                    let field = &request.payload[common::NAME_SIZE..];
                    let public = RsaPublicKey::from_pkcs1_der(common::trim_der(field))
                        .expect("client public key parses");
                    let blob = public
                        .encrypt(&mut OsRng, Oaep::new::<Sha1>(), &SESSION_KEY)
                        .expect("session key encrypts");
                    let mut payload = assigned_id.to_vec();
                    payload.extend_from_slice(&blob);
                    common::write_response(
                        &mut stream,
                        ResponseCode::AesKeyDelivered as u16,
                        &payload,
                    );
                }
                1003 => {
                    let content = common::file_content(&request.payload);
                    common::write_response(
                        &mut stream,
                        ResponseCode::ValidCrcAck as u16,
                        &crc_ack(&assigned_id, content.len() as u32, plaintext_crc),
                    );
                }
                1004 => {
                    common::write_response(
                        &mut stream,
                        ResponseCode::MsgReceived as u16,
                        &assigned_id,
                    );
                    return codes;
                }
                other => panic!("unexpected request code {other}"),
            }
        }
        codes
    })
}

#[test]
fn first_run_registers_and_persists_the_identity() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("report.txt");
    fs::write(&file_path, b"quarterly numbers\n").unwrap();

    let (listener, port) = common::listener();
    let server = full_run_server(listener, [0xA1; 16], checksum(b"quarterly numbers\n"));

    let config = TransferConfig::from_str_contents(&format!(
        "127.0.0.1:{port}\nalice\n{}",
        file_path.display()
    ))
    .unwrap();
    let store = IdentityStore::new(dir.path().join("me.info"), dir.path().join("priv.key"));

    client::run(&config, &store).unwrap();

    assert_eq!(server.join().unwrap(), vec![1100, 1101, 1003, 1004]);
    let identity = store.load().unwrap();
    assert_eq!(identity.id.as_bytes(), &[0xA1; 16]);
    assert_eq!(identity.name.as_str(), "alice");
}

#[test]
fn a_forgotten_identity_falls_back_to_re_registration() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("report.txt");
    fs::write(&file_path, b"quarterly numbers\n").unwrap();
    let crc = checksum(b"quarterly numbers\n");
    let store = IdentityStore::new(dir.path().join("me.info"), dir.path().join("priv.key"));

    // First run establishes an identity the second server won't recognize.
    {
        let (listener, port) = common::listener();
        let server = full_run_server(listener, [0xA1; 16], crc);
        let config = TransferConfig::from_str_contents(&format!(
            "127.0.0.1:{port}\nalice\n{}",
            file_path.display()
        ))
        .unwrap();
        client::run(&config, &store).unwrap();
        server.join().unwrap();
    }

    let (listener, port) = common::listener();
    let server = full_run_server(listener, [0xB2; 16], crc);
    let config = TransferConfig::from_str_contents(&format!(
        "127.0.0.1:{port}\nalice\n{}",
        file_path.display()
    ))
    .unwrap();
    client::run(&config, &store).unwrap();

    // Reconnect was tried, rejected, and a fresh registration followed.
    assert_eq!(server.join().unwrap(), vec![1002, 1100, 1101, 1003, 1004]);
    let identity = store.load().unwrap();
    assert_eq!(identity.id.as_bytes(), &[0xB2; 16]);
}
