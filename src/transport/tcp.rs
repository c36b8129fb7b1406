//! Blocking TCP connection with packet-chunked send and receive loops.

use std::io::{Read, Write};
use std::net::{Ipv4Addr, Shutdown, TcpStream};

use tracing::{debug, trace};

use crate::core::wire::PACKET_SIZE;
use crate::error::{ProtocolError, Result};
use crate::transport::endian;

/// Check an address/port pair before any network call: the address must be a
/// dotted-quad IPv4 literal or one of the exact literals `localhost` /
/// `LOCALHOST`, the port must be in 1–65535. A malformed endpoint fails
/// immediately without touching the network.
pub fn validate_endpoint(address: &str, port: u16) -> Result<()> {
    let is_localhost = address == "localhost" || address == "LOCALHOST";
    if !is_localhost && address.parse::<Ipv4Addr>().is_err() {
        return Err(ProtocolError::InvalidAddress(address.to_string()));
    }
    if port == 0 {
        return Err(ProtocolError::InvalidPort(port.to_string()));
    }
    Ok(())
}

/// One open connection to the server.
///
/// The underlying socket is closed on drop; [`Connection::close`] exists for
/// call sites that want to close eagerly and is idempotent.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
}

impl Connection {
    /// Validate the endpoint, then open a blocking TCP connection to it.
    pub fn connect(address: &str, port: u16) -> Result<Self> {
        validate_endpoint(address, port)?;
        let stream = TcpStream::connect((address, port))?;
        trace!(address, port, "connected");
        Ok(Connection { stream })
    }

    /// Send all of `bytes`, split into [`PACKET_SIZE`] chunks.
    ///
    /// Each chunk is copied into a zero-filled packet buffer, converted to
    /// wire order, and written in full — the peer always sees whole packets.
    /// A zero-byte write at any point is a transport failure.
    pub fn send_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut packet = [0u8; PACKET_SIZE];
        for chunk in bytes.chunks(PACKET_SIZE) {
            packet.fill(0);
            packet[..chunk.len()].copy_from_slice(chunk);
            endian::to_wire(&mut packet);

            let mut written = 0;
            while written < PACKET_SIZE {
                let n = self.stream.write(&packet[written..])?;
                if n == 0 {
                    return Err(ProtocolError::ConnectionClosed);
                }
                written += n;
            }
        }
        debug!(bytes = bytes.len(), "request sent");
        Ok(())
    }

    /// Receive exactly `len` bytes, reading the socket in `chunk_size`
    /// pieces.
    ///
    /// Each piece is converted from wire order into host order, then only the
    /// still-needed remainder is copied out; surplus bytes from the final
    /// padded packet are discarded. A zero-byte read before `len` bytes have
    /// been assembled means the peer closed or errored.
    pub fn recv_exact(&mut self, len: usize, chunk_size: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(len);
        let mut scratch = vec![0u8; chunk_size];
        while out.len() < len {
            let n = self.stream.read(&mut scratch)?;
            if n == 0 {
                return Err(ProtocolError::ConnectionClosed);
            }
            endian::from_wire(&mut scratch[..n]);
            let needed = (len - out.len()).min(n);
            out.extend_from_slice(&scratch[..needed]);
        }
        debug!(bytes = len, "response bytes assembled");
        Ok(out)
    }

    /// Shut the connection down. Safe to call more than once; never fails.
    pub fn close(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}
