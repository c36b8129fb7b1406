//! # Transfer Protocol
//!
//! Client implementation of a packetized binary file-transfer protocol over
//! TCP: register (or reconnect), exchange keys, send the encrypted file, and
//! verify it with a CRC32 handshake.
//!
//! ## Architecture
//! - [`core`] — wire constants, fixed-layout field types, and the
//!   request/response codec.
//! - [`transport`] — blocking TCP with packet-chunked I/O, wire byte order,
//!   and the bounded retry loop.
//! - [`crypto`] — RSA key lifecycle, the AES-CBC session cipher, and the
//!   CRC32 checksum.
//! - [`protocol`] — the session engine driving the protocol state machine.
//! - [`service`] — persisted identity and the end-to-end transfer run.
//! - [`config`] — the `transfer.info` run description.
//!
//! ## Example
//! ```no_run
//! use transfer_protocol::config::TransferConfig;
//! use transfer_protocol::service::{client, IdentityStore};
//!
//! # fn main() -> transfer_protocol::Result<()> {
//! let config = TransferConfig::from_file("transfer.info")?;
//! client::run(&config, &IdentityStore::default())?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod crypto;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;

pub use config::TransferConfig;
pub use error::{ProtocolError, Result};
pub use protocol::Session;
