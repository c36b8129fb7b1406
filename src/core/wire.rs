//! Wire format constants and fixed-layout field types.

use std::fmt;

use crate::error::{ProtocolError, Result};

/// Protocol version spoken by this client.
pub const PROTOCOL_VERSION: u8 = 3;

/// Size of the server-assigned client identifier.
pub const CLIENT_ID_SIZE: usize = 16;

/// Size of the NUL-padded name fields (client name and file name).
pub const NAME_SIZE: usize = 255;

/// Size of the public key field in the key-exchange request.
pub const PUBLIC_KEY_SIZE: usize = 160;

/// Size of the symmetric session key delivered by the server.
pub const AES_KEY_SIZE: usize = 16;

/// Fixed chunk size used by the transport send and receive loops.
pub const PACKET_SIZE: usize = 1024;

/// Request header: clientId(16) + version(1) + code(2) + payloadSize(4).
pub const REQUEST_HEADER_SIZE: usize = CLIENT_ID_SIZE + 1 + 2 + 4;

/// Response header: version(1) + code(2) + payloadSize(4).
pub const RESPONSE_HEADER_SIZE: usize = 1 + 2 + 4;

/// Upper bound on a declared response payload, to keep a corrupt header from
/// triggering a huge allocation.
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Request kinds, with their reserved wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum RequestCode {
    Registration = 1100,
    SendPublicKey = 1101,
    Reconnect = 1002,
    SendFile = 1003,
    ValidCrc = 1004,
    InvalidCrcRetry = 1005,
    InvalidCrcFinish = 1006,
}

/// Response kinds, with their reserved wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ResponseCode {
    RegistrationSucceeded = 2100,
    RegistrationFailed = 2101,
    AesKeyDelivered = 2102,
    ValidCrcAck = 2103,
    MsgReceived = 2104,
    ReconnectAllowed = 2105,
    ReconnectRejected = 2106,
    GlobalError = 2107,
}

impl ResponseCode {
    /// Map a wire value back to a known response kind.
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            2100 => Some(ResponseCode::RegistrationSucceeded),
            2101 => Some(ResponseCode::RegistrationFailed),
            2102 => Some(ResponseCode::AesKeyDelivered),
            2103 => Some(ResponseCode::ValidCrcAck),
            2104 => Some(ResponseCode::MsgReceived),
            2105 => Some(ResponseCode::ReconnectAllowed),
            2106 => Some(ResponseCode::ReconnectRejected),
            2107 => Some(ResponseCode::GlobalError),
            _ => None,
        }
    }

    /// The exact payload size a fixed-shape response must declare, or `None`
    /// for kinds whose payload length depends on the asymmetric scheme.
    pub fn fixed_payload_size(self) -> Option<u32> {
        match self {
            ResponseCode::RegistrationSucceeded => Some(CLIENT_ID_SIZE as u32),
            ResponseCode::RegistrationFailed => Some(0),
            ResponseCode::ValidCrcAck => Some((CLIENT_ID_SIZE + 4 + NAME_SIZE + 4) as u32),
            ResponseCode::MsgReceived | ResponseCode::ReconnectRejected => {
                Some(CLIENT_ID_SIZE as u32)
            }
            // Key delivery carries an RSA-encrypted blob of scheme-dependent
            // length after the client id; GlobalError is never validated
            // against an expected shape.
            ResponseCode::AesKeyDelivered
            | ResponseCode::ReconnectAllowed
            | ResponseCode::GlobalError => None,
        }
    }
}

/// Opaque 16-byte client identifier assigned by the server at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientId(pub [u8; CLIENT_ID_SIZE]);

impl ClientId {
    /// The all-zero id used on the wire before the server assigns one.
    pub const UNASSIGNED: ClientId = ClientId([0u8; CLIENT_ID_SIZE]);

    /// Parse the 32-hex-character form used by the identity file.
    pub fn from_hex(s: &str) -> Result<Self> {
        let raw = hex::decode(s.trim())
            .map_err(|e| ProtocolError::Identity(format!("bad client id hex: {e}")))?;
        let bytes: [u8; CLIENT_ID_SIZE] = raw.try_into().map_err(|_| {
            ProtocolError::Identity(format!("client id must be {CLIENT_ID_SIZE} bytes"))
        })?;
        Ok(ClientId(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; CLIENT_ID_SIZE] {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A NUL-padded 255-byte name field (client name or file name).
///
/// The wire reserves the final byte for NUL termination, so the printable
/// part is at most 254 bytes.
#[derive(Clone, Copy)]
pub struct WireName([u8; NAME_SIZE]);

impl WireName {
    pub fn new(name: &str) -> Result<Self> {
        if name.len() >= NAME_SIZE {
            return Err(ProtocolError::NameTooLong(name.len()));
        }
        let mut buf = [0u8; NAME_SIZE];
        buf[..name.len()].copy_from_slice(name.as_bytes());
        Ok(WireName(buf))
    }

    /// Adopt a field exactly as it arrived on the wire, forcing the
    /// terminator invariant on the final byte.
    pub(crate) fn from_raw(mut bytes: [u8; NAME_SIZE]) -> Self {
        bytes[NAME_SIZE - 1] = 0;
        WireName(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NAME_SIZE] {
        &self.0
    }

    /// The printable part, without trailing NUL padding.
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(NAME_SIZE);
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }
}

impl fmt::Debug for WireName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WireName").field(&self.as_str()).finish()
    }
}

impl fmt::Display for WireName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded response header prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub version: u8,
    pub code: u16,
    pub payload_size: u32,
}
