//! # Session Engine
//!
//! The client-side protocol state machine: registration, key exchange,
//! reconnection, and the checksum-verified file transfer.
//!
//! ## Design
//! Each operation builds a request with the codec, drives it through the
//! transport's bounded retry loop, and validates the response header before
//! touching the payload. The engine owns no sockets itself; the
//! [`Exchanger`](crate::transport::Exchanger) opens a fresh connection per
//! exchange.

pub mod session;

pub use session::{CrcOutcome, Session, MAX_CRC_ATTEMPTS};
