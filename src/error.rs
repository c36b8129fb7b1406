//! # Error Types
//!
//! Error handling for the transfer protocol client.
//!
//! This module defines all error variants that can occur during a transfer
//! session, from low-level I/O failures to protocol-shape violations.
//!
//! ## Error Categories
//! - **Transient errors**: connect failures, short reads/writes, and the
//!   server's reserved global-error response. The retry policy absorbs these
//!   up to its attempt budget.
//! - **Protocol violations**: version mismatch, unexpected response code,
//!   payload-size mismatch. These mean the two ends disagree about the wire
//!   format and are never retried.
//! - **Integrity failures**: CRC rejection after the resend budget.
//! - **Local errors**: malformed config or identity files, crypto failures.
//!
//! [`ProtocolError::is_retryable`] is the single classification point: the
//! retry policy consults it instead of matching variants itself.

use std::io;
use thiserror::Error;

/// Primary error type for all protocol operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid server address: {0}")]
    InvalidAddress(String),

    #[error("invalid server port: {0}")]
    InvalidPort(String),

    #[error("connection closed by peer before the full payload arrived")]
    ConnectionClosed,

    #[error("server responded with its global error code")]
    GlobalError,

    #[error("unsupported protocol version {got}, expected {expected}")]
    UnsupportedVersion { expected: u8, got: u8 },

    #[error("unexpected response code {got}, expected {expected}")]
    UnexpectedCode { expected: u16, got: u16 },

    #[error("unexpected payload size {got}, expected {expected}")]
    MalformedPayload { expected: u32, got: u32 },

    #[error("response payload too large: {0} bytes")]
    OversizedPayload(u32),

    #[error("response shorter than a response header")]
    TruncatedHeader,

    #[error("{context}: retries exhausted after {attempts} attempts")]
    RetriesExhausted { context: String, attempts: u32 },

    #[error("registration refused: client name already taken")]
    RegistrationRefused,

    #[error("server kept rejecting the file checksum after {attempts} sends")]
    CrcRejected { attempts: u32 },

    #[error("name too long for the wire format: {0} bytes (max {max})", max = crate::core::wire::NAME_SIZE - 1)]
    NameTooLong(usize),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("identity store error: {0}")]
    Identity(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ProtocolError {
    /// Whether the retry policy may re-attempt the exchange that produced
    /// this error. Everything else aborts the current operation immediately:
    /// a protocol-shape violation indicates client/server disagreement, not
    /// transient loss.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProtocolError::Io(_) | ProtocolError::ConnectionClosed | ProtocolError::GlobalError
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
