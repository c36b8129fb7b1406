//! Request encoding and response decoding.
//!
//! Requests are serialized field by field in declared order with explicit
//! little-endian integers; responses are decoded by reading named fields at
//! fixed offsets with a bounds check before every access. No structure is
//! ever overlaid onto a raw buffer.

use bytes::{Buf, BufMut, BytesMut};

use crate::core::wire::{
    ClientId, RequestCode, ResponseCode, ResponseHeader, WireName, CLIENT_ID_SIZE,
    MAX_PAYLOAD_SIZE, NAME_SIZE, PROTOCOL_VERSION, PUBLIC_KEY_SIZE, REQUEST_HEADER_SIZE,
    RESPONSE_HEADER_SIZE,
};
use crate::error::{ProtocolError, Result};

/// A request ready to be encoded, one variant per request kind.
///
/// Every variant owns exactly the payload fields its wire shape declares;
/// [`Request::encode`] computes `payloadSize` from them, so the invariant
/// that the declared size equals the trailing byte count holds by
/// construction.
#[derive(Debug)]
pub enum Request<'a> {
    Registration {
        name: WireName,
    },
    SendPublicKey {
        name: WireName,
        public_key: [u8; PUBLIC_KEY_SIZE],
    },
    Reconnect {
        name: WireName,
    },
    SendFile {
        file_name: WireName,
        content: &'a [u8],
    },
    ValidCrc {
        file_name: WireName,
    },
    InvalidCrcRetry {
        file_name: WireName,
    },
    InvalidCrcFinish {
        file_name: WireName,
    },
}

impl Request<'_> {
    pub fn code(&self) -> RequestCode {
        match self {
            Request::Registration { .. } => RequestCode::Registration,
            Request::SendPublicKey { .. } => RequestCode::SendPublicKey,
            Request::Reconnect { .. } => RequestCode::Reconnect,
            Request::SendFile { .. } => RequestCode::SendFile,
            Request::ValidCrc { .. } => RequestCode::ValidCrc,
            Request::InvalidCrcRetry { .. } => RequestCode::InvalidCrcRetry,
            Request::InvalidCrcFinish { .. } => RequestCode::InvalidCrcFinish,
        }
    }

    fn payload_size(&self) -> u32 {
        let size = match self {
            Request::Registration { .. } | Request::Reconnect { .. } => NAME_SIZE,
            Request::SendPublicKey { .. } => NAME_SIZE + PUBLIC_KEY_SIZE,
            Request::SendFile { content, .. } => 4 + NAME_SIZE + content.len(),
            Request::ValidCrc { .. }
            | Request::InvalidCrcRetry { .. }
            | Request::InvalidCrcFinish { .. } => NAME_SIZE,
        };
        size as u32
    }

    /// Serialize the request header and payload into a contiguous buffer.
    ///
    /// Registration carries no assigned id yet; callers pass
    /// [`ClientId::UNASSIGNED`] and the field goes out zero-filled.
    pub fn encode(&self, client_id: &ClientId) -> Vec<u8> {
        let payload_size = self.payload_size();
        let mut buf = BytesMut::with_capacity(REQUEST_HEADER_SIZE + payload_size as usize);

        buf.put_slice(client_id.as_bytes());
        buf.put_u8(PROTOCOL_VERSION);
        buf.put_u16_le(self.code() as u16);
        buf.put_u32_le(payload_size);

        match self {
            Request::Registration { name } | Request::Reconnect { name } => {
                buf.put_slice(name.as_bytes());
            }
            Request::SendPublicKey { name, public_key } => {
                buf.put_slice(name.as_bytes());
                buf.put_slice(public_key);
            }
            Request::SendFile { file_name, content } => {
                buf.put_u32_le(content.len() as u32);
                buf.put_slice(file_name.as_bytes());
                buf.put_slice(content);
            }
            Request::ValidCrc { file_name }
            | Request::InvalidCrcRetry { file_name }
            | Request::InvalidCrcFinish { file_name } => {
                buf.put_slice(file_name.as_bytes());
            }
        }

        debug_assert_eq!(buf.len(), REQUEST_HEADER_SIZE + payload_size as usize);
        buf.to_vec()
    }
}

/// Decode the fixed-size response header prefix.
///
/// Callers must not interpret any bytes past the header until
/// [`validate_response`] has accepted it.
pub fn decode_response_header(bytes: &[u8]) -> Result<ResponseHeader> {
    if bytes.len() < RESPONSE_HEADER_SIZE {
        return Err(ProtocolError::TruncatedHeader);
    }
    let mut buf = &bytes[..RESPONSE_HEADER_SIZE];
    let header = ResponseHeader {
        version: buf.get_u8(),
        code: buf.get_u16_le(),
        payload_size: buf.get_u32_le(),
    };
    if header.payload_size > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::OversizedPayload(header.payload_size));
    }
    Ok(header)
}

/// Validate a response header against the code the caller expects.
///
/// The rules apply in order:
/// 1. the reserved global-error code fails with [`ProtocolError::GlobalError`]
///    (recoverable, the whole exchange may be retried);
/// 2. a version other than [`PROTOCOL_VERSION`] is fatal;
/// 3. a code other than `expected` is fatal;
/// 4. a fixed-shape response whose declared payload size differs from its
///    fixed size is fatal.
pub fn validate_response(header: &ResponseHeader, expected: ResponseCode) -> Result<()> {
    if header.code == ResponseCode::GlobalError as u16 {
        return Err(ProtocolError::GlobalError);
    }

    if header.version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion {
            expected: PROTOCOL_VERSION,
            got: header.version,
        });
    }

    if header.code != expected as u16 {
        return Err(ProtocolError::UnexpectedCode {
            expected: expected as u16,
            got: header.code,
        });
    }

    if let Some(fixed) = expected.fixed_payload_size() {
        if header.payload_size != fixed {
            return Err(ProtocolError::MalformedPayload {
                expected: fixed,
                got: header.payload_size,
            });
        }
    }

    Ok(())
}

/// Fields of the CRC acknowledgement payload.
#[derive(Debug)]
pub struct CrcAck {
    pub client_id: ClientId,
    pub content_size: u32,
    pub file_name: WireName,
    pub crc: u32,
}

/// Read the 16-byte client id that opens most fixed-shape payloads.
pub fn decode_client_id(payload: &[u8]) -> Result<ClientId> {
    if payload.len() < CLIENT_ID_SIZE {
        return Err(ProtocolError::MalformedPayload {
            expected: CLIENT_ID_SIZE as u32,
            got: payload.len() as u32,
        });
    }
    let mut id = [0u8; CLIENT_ID_SIZE];
    id.copy_from_slice(&payload[..CLIENT_ID_SIZE]);
    Ok(ClientId(id))
}

/// Decode the `ValidCrcAck` payload: id(16) + contentSize(4) + name(255) + crc(4).
pub fn decode_crc_ack(payload: &[u8]) -> Result<CrcAck> {
    let fixed = (CLIENT_ID_SIZE + 4 + NAME_SIZE + 4) as u32;
    if payload.len() != fixed as usize {
        return Err(ProtocolError::MalformedPayload {
            expected: fixed,
            got: payload.len() as u32,
        });
    }

    let client_id = decode_client_id(payload)?;
    let mut buf = &payload[CLIENT_ID_SIZE..];
    let content_size = buf.get_u32_le();

    let mut name = [0u8; NAME_SIZE];
    name.copy_from_slice(&buf[..NAME_SIZE]);
    buf.advance(NAME_SIZE);
    let file_name = WireName::from_raw(name);

    let crc = buf.get_u32_le();

    Ok(CrcAck {
        client_id,
        content_size,
        file_name,
        crc,
    })
}

/// Split a key-delivery payload into the echoed client id and the trailing
/// RSA-encrypted session key blob. No fixed length check applies: the blob
/// length depends on the asymmetric scheme.
pub fn split_key_delivery(payload: &[u8]) -> Result<(ClientId, &[u8])> {
    let client_id = decode_client_id(payload)?;
    Ok((client_id, &payload[CLIENT_ID_SIZE..]))
}
