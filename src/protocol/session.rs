//! Protocol operations over one server endpoint.

use tracing::{info, warn};

use crate::core::codec::{
    decode_client_id, decode_crc_ack, decode_response_header, split_key_delivery,
    validate_response, Request,
};
use crate::core::wire::{ClientId, ResponseCode, ResponseHeader, WireName, RESPONSE_HEADER_SIZE};
use crate::crypto::{checksum, SessionCipher};
use crate::error::{ProtocolError, Result};
use crate::service::identity::ClientIdentity;
use crate::transport::{Exchanger, DEFAULT_MAX_ATTEMPTS};

/// Attempt budget for the checksum-verified file transfer. Separate from the
/// per-exchange budget: each file send already retries transport failures
/// internally.
pub const MAX_CRC_ATTEMPTS: u32 = 3;

/// Verdict on one file-send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcOutcome {
    /// Server and client checksums agree.
    Valid,
    /// Checksums disagree and another attempt remains.
    Invalid,
    /// Checksums disagree and the attempt budget is spent.
    RetriesExhausted,
}

/// Protocol session bound to one server endpoint.
///
/// Stateless between calls; all client state lives in the
/// [`ClientIdentity`] and [`SessionCipher`] the caller threads through.
pub struct Session {
    exchanger: Exchanger,
}

impl Session {
    pub fn new(address: &str, port: u16) -> Result<Self> {
        Ok(Session {
            exchanger: Exchanger::new(address, port)?,
        })
    }

    /// Register `name` with the server and return the assigned client id.
    ///
    /// A `RegistrationFailed` response (name already taken) is terminal for
    /// this name and maps to [`ProtocolError::RegistrationRefused`].
    pub fn register(&self, name: &WireName) -> Result<ClientId> {
        let request = Request::Registration { name: *name }.encode(&ClientId::UNASSIGNED);
        let response =
            self.exchanger
                .exchange_with_retry(&request, DEFAULT_MAX_ATTEMPTS, "registration")?;
        let (header, payload) = parse(&response)?;

        if header.code == ResponseCode::RegistrationFailed as u16 {
            // Still a protocol-shaped response: version and the empty fixed
            // payload must check out before this counts as a refusal.
            validate_response(&header, ResponseCode::RegistrationFailed)?;
            return Err(ProtocolError::RegistrationRefused);
        }
        validate_response(&header, ResponseCode::RegistrationSucceeded)?;

        let id = decode_client_id(payload)?;
        info!(name = %name, id = %id, "registered");
        Ok(id)
    }

    /// Send the client's public key and decrypt the session key the server
    /// returns.
    pub fn send_public_key(&self, identity: &ClientIdentity) -> Result<SessionCipher> {
        let request = Request::SendPublicKey {
            name: identity.name,
            public_key: identity.keys.public_key_wire()?,
        }
        .encode(&identity.id);
        let response =
            self.exchanger
                .exchange_with_retry(&request, DEFAULT_MAX_ATTEMPTS, "key exchange")?;
        let (header, payload) = parse(&response)?;
        validate_response(&header, ResponseCode::AesKeyDelivered)?;

        let cipher = self.unwrap_session_key(identity, payload)?;
        info!(id = %identity.id, "session key established");
        Ok(cipher)
    }

    /// Ask the server to resume a previous registration.
    ///
    /// Returns `Ok(None)` when the server rejects the reconnect (unknown id
    /// or missing public key); the caller falls back to a fresh
    /// registration. Any other unexpected response is a protocol violation.
    pub fn reconnect(&self, identity: &ClientIdentity) -> Result<Option<SessionCipher>> {
        let request = Request::Reconnect {
            name: identity.name,
        }
        .encode(&identity.id);
        let response =
            self.exchanger
                .exchange_with_retry(&request, DEFAULT_MAX_ATTEMPTS, "reconnect")?;
        let (header, payload) = parse(&response)?;

        if header.code == ResponseCode::ReconnectRejected as u16 {
            // A rejection only counts once its header passes the same checks
            // as any other response; a bad version or payload size here is a
            // protocol violation, not a cue to re-register.
            validate_response(&header, ResponseCode::ReconnectRejected)?;
            warn!(id = %identity.id, "reconnect rejected, will re-register");
            return Ok(None);
        }
        validate_response(&header, ResponseCode::ReconnectAllowed)?;

        let cipher = self.unwrap_session_key(identity, payload)?;
        info!(id = %identity.id, "reconnected");
        Ok(Some(cipher))
    }

    /// Send the encrypted file until the server's checksum matches the local
    /// one, within [`MAX_CRC_ATTEMPTS`] attempts.
    ///
    /// On a match the server gets a `ValidCrc` confirmation and must answer
    /// `MsgReceived`. On a mismatch with attempts remaining, a one-way
    /// `InvalidCrcRetry` notice precedes the next send. Spending the budget
    /// sends `InvalidCrcFinish`, waits for `MsgReceived`, and fails with
    /// [`ProtocolError::CrcRejected`].
    pub fn transfer_file(
        &self,
        identity: &ClientIdentity,
        cipher: &SessionCipher,
        file_name: &WireName,
        plaintext: &[u8],
    ) -> Result<()> {
        let local_crc = checksum(plaintext);
        let content = cipher.encrypt(plaintext);

        for attempt in 1..=MAX_CRC_ATTEMPTS {
            let server_crc = self.send_file_content(identity, file_name, &content)?;
            match verdict(local_crc, server_crc, attempt) {
                CrcOutcome::Valid => {
                    info!(file = %file_name, crc = local_crc, attempt, "checksum verified");
                    return self.confirm(identity, Request::ValidCrc {
                        file_name: *file_name,
                    });
                }
                CrcOutcome::Invalid => {
                    warn!(
                        file = %file_name,
                        attempt,
                        local = local_crc,
                        server = server_crc,
                        "checksum mismatch, resending"
                    );
                    // One-way notice: the server logs it and awaits the next
                    // file send, so there is no response to read. A failed
                    // notice must not abort the transfer; the resend carries
                    // the actual state forward.
                    let notice = Request::InvalidCrcRetry {
                        file_name: *file_name,
                    }
                    .encode(&identity.id);
                    if let Err(e) = self.exchanger.send_only(&notice) {
                        warn!(file = %file_name, error = %e, "retry notice not delivered");
                    }
                }
                CrcOutcome::RetriesExhausted => {
                    warn!(file = %file_name, attempts = MAX_CRC_ATTEMPTS, "giving up on transfer");
                    self.confirm(identity, Request::InvalidCrcFinish {
                        file_name: *file_name,
                    })?;
                    return Err(ProtocolError::CrcRejected {
                        attempts: MAX_CRC_ATTEMPTS,
                    });
                }
            }
        }
        // Not reachable: the verdict on the final attempt is either Valid or
        // RetriesExhausted, and both return above.
        Err(ProtocolError::CrcRejected {
            attempts: MAX_CRC_ATTEMPTS,
        })
    }

    /// One file send: deliver the ciphertext and return the checksum the
    /// server computed over its decrypted copy.
    fn send_file_content(
        &self,
        identity: &ClientIdentity,
        file_name: &WireName,
        content: &[u8],
    ) -> Result<u32> {
        let request = Request::SendFile {
            file_name: *file_name,
            content,
        }
        .encode(&identity.id);
        let response =
            self.exchanger
                .exchange_with_retry(&request, DEFAULT_MAX_ATTEMPTS, "file send")?;
        let (header, payload) = parse(&response)?;
        validate_response(&header, ResponseCode::ValidCrcAck)?;

        let ack = decode_crc_ack(payload)?;
        Ok(ack.crc)
    }

    /// Send a transfer-closing request and wait for the `MsgReceived`
    /// acknowledgement.
    fn confirm(&self, identity: &ClientIdentity, request: Request<'_>) -> Result<()> {
        let bytes = request.encode(&identity.id);
        let response =
            self.exchanger
                .exchange_with_retry(&bytes, DEFAULT_MAX_ATTEMPTS, "transfer close")?;
        let (header, _) = parse(&response)?;
        validate_response(&header, ResponseCode::MsgReceived)
    }

    /// Split a key-delivery payload, check the echoed id, and decrypt the
    /// session key with the client's private key.
    fn unwrap_session_key(
        &self,
        identity: &ClientIdentity,
        payload: &[u8],
    ) -> Result<SessionCipher> {
        let (echoed, blob) = split_key_delivery(payload)?;
        if echoed != identity.id {
            return Err(ProtocolError::Identity(format!(
                "server echoed id {echoed}, ours is {}",
                identity.id
            )));
        }
        let key = identity.keys.decrypt(blob)?;
        SessionCipher::new(&key)
    }
}

/// Split raw response bytes into the decoded header and its payload slice.
fn parse(response: &[u8]) -> Result<(ResponseHeader, &[u8])> {
    let header = decode_response_header(response)?;
    Ok((header, &response[RESPONSE_HEADER_SIZE..]))
}

/// Classify one file-send attempt.
fn verdict(local_crc: u32, server_crc: u32, attempt: u32) -> CrcOutcome {
    if local_crc == server_crc {
        CrcOutcome::Valid
    } else if attempt < MAX_CRC_ATTEMPTS {
        CrcOutcome::Invalid
    } else {
        CrcOutcome::RetriesExhausted
    }
}
