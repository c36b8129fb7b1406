//! Shared scripted-server helpers for the integration suites.
//!
//! The mock server speaks the same packetized framing as the real one: it
//! reads whole 1024-byte packets from the client and pads every response out
//! to full packets before writing.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

pub const PACKET_SIZE: usize = 1024;
pub const REQUEST_HEADER_SIZE: usize = 23;
pub const NAME_SIZE: usize = 255;
pub const VERSION: u8 = 3;

/// A request as the server sees it after deframing.
pub struct ParsedRequest {
    pub client_id: [u8; 16],
    pub version: u8,
    pub code: u16,
    pub payload: Vec<u8>,
}

/// Bind an ephemeral listener and return it with the port to dial.
pub fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    (listener, port)
}

/// Read one full request off the stream: as many whole packets as the
/// declared payload size requires.
pub fn read_request(stream: &mut TcpStream) -> ParsedRequest {
    let mut packet = [0u8; PACKET_SIZE];
    stream.read_exact(&mut packet).expect("first request packet");

    let mut client_id = [0u8; 16];
    client_id.copy_from_slice(&packet[..16]);
    let version = packet[16];
    let code = u16::from_le_bytes([packet[17], packet[18]]);
    let payload_size =
        u32::from_le_bytes([packet[19], packet[20], packet[21], packet[22]]) as usize;

    let mut bytes = packet.to_vec();
    let total = REQUEST_HEADER_SIZE + payload_size;
    while bytes.len() < total {
        stream.read_exact(&mut packet).expect("request continuation packet");
        bytes.extend_from_slice(&packet);
    }

    ParsedRequest {
        client_id,
        version,
        code,
        payload: bytes[REQUEST_HEADER_SIZE..total].to_vec(),
    }
}

/// Write a response header and payload, padded out to whole packets.
pub fn write_response(stream: &mut TcpStream, code: u16, payload: &[u8]) {
    write_response_with_version(stream, VERSION, code, payload);
}

pub fn write_response_with_version(stream: &mut TcpStream, version: u8, code: u16, payload: &[u8]) {
    let mut bytes = Vec::with_capacity(7 + payload.len());
    bytes.push(version);
    bytes.extend_from_slice(&code.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(payload);

    let padded = bytes.len().div_ceil(PACKET_SIZE) * PACKET_SIZE;
    bytes.resize(padded, 0);
    stream.write_all(&bytes).expect("write response");
}

/// Strip the zero padding that follows a DER value in a fixed-size key field.
pub fn trim_der(field: &[u8]) -> &[u8] {
    let len = if field[1] & 0x80 == 0 {
        2 + field[1] as usize
    } else {
        let n = (field[1] & 0x7F) as usize;
        let mut value = 0usize;
        for b in &field[2..2 + n] {
            value = (value << 8) | *b as usize;
        }
        2 + n + value
    };
    &field[..len]
}

/// Extract the ciphertext from a file-send payload:
/// contentSize(4) + fileName(255) + content.
pub fn file_content(payload: &[u8]) -> Vec<u8> {
    let declared =
        u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
    let content = &payload[4 + NAME_SIZE..];
    assert_eq!(declared, content.len(), "contentSize must match ciphertext length");
    content.to_vec()
}
