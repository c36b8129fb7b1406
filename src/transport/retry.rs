//! Bounded retry policy around one request/response exchange.

use tracing::{debug, warn};

use crate::core::codec::decode_response_header;
use crate::core::wire::{ResponseCode, PACKET_SIZE, RESPONSE_HEADER_SIZE};
use crate::error::{ProtocolError, Result};
use crate::transport::tcp::{validate_endpoint, Connection};

/// Default attempt budget for a retried exchange.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Connection factory bound to one server endpoint.
///
/// Every exchange opens a fresh connection, sends the request, receives the
/// full response (header plus declared payload), and closes — the server is
/// stateless across requests and so is the transport.
pub struct Exchanger {
    address: String,
    port: u16,
}

impl Exchanger {
    /// Create an exchanger for `address:port`, validating the endpoint up
    /// front so a malformed config fails before any request is built.
    pub fn new(address: &str, port: u16) -> Result<Self> {
        validate_endpoint(address, port)?;
        Ok(Exchanger {
            address: address.to_string(),
            port,
        })
    }

    /// One full round trip: connect, send, receive header and payload.
    ///
    /// Returns the raw response bytes (header included). The header receive
    /// uses the exact header size as its chunk; the payload receive uses the
    /// regular packet size. The connection is closed on every exit path.
    pub fn send_and_receive(&self, request: &[u8]) -> Result<Vec<u8>> {
        let mut conn = Connection::connect(&self.address, self.port)?;
        conn.send_all(request)?;

        let mut response = conn.recv_exact(RESPONSE_HEADER_SIZE, RESPONSE_HEADER_SIZE)?;
        let header = decode_response_header(&response)?;
        if header.payload_size > 0 {
            let payload = conn.recv_exact(header.payload_size as usize, PACKET_SIZE)?;
            response.extend_from_slice(&payload);
        }
        Ok(response)
    }

    /// Connect, send, and close without waiting for a response. Used for the
    /// one-way CRC retry notice.
    pub fn send_only(&self, request: &[u8]) -> Result<()> {
        let mut conn = Connection::connect(&self.address, self.port)?;
        conn.send_all(request)
    }

    /// Drive [`Self::send_and_receive`] with a bounded attempt budget.
    ///
    /// An attempt counts as failed if the connection cannot be opened, any
    /// send or receive step fails, or the decoded header carries the
    /// global-error code. Exhausting the budget escalates to
    /// [`ProtocolError::RetriesExhausted`], which is fatal for the operation
    /// that issued the request. Protocol-shape violations abort immediately:
    /// retrying cannot fix client/server disagreement.
    pub fn exchange_with_retry(
        &self,
        request: &[u8],
        max_attempts: u32,
        context: &str,
    ) -> Result<Vec<u8>> {
        for attempt in 1..=max_attempts {
            match self.send_and_receive(request) {
                Ok(response) => {
                    let header = decode_response_header(&response)?;
                    if ResponseCode::from_u16(header.code) == Some(ResponseCode::GlobalError) {
                        warn!(attempt, max_attempts, context, "server responded with an error");
                        continue;
                    }
                    debug!(attempt, context, "exchange completed");
                    return Ok(response);
                }
                Err(e) if e.is_retryable() => {
                    warn!(attempt, max_attempts, context, error = %e, "exchange attempt failed");
                }
                Err(e) => return Err(e),
            }
        }
        Err(ProtocolError::RetriesExhausted {
            context: context.to_string(),
            attempts: max_attempts,
        })
    }
}
