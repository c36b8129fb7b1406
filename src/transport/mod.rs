//! # Transport Layer
//!
//! Reliable delivery of exact byte counts over blocking TCP.
//!
//! The protocol is strictly synchronous: every exchange opens a fresh
//! connection, performs one send followed by one full receive, and closes.
//! There is no connection reuse, pipelining, or suspension model beyond
//! blocking on socket reads and writes.
//!
//! ## Components
//! - **endian**: 32-bit-word byte-order normalization to the little-endian
//!   wire format
//! - **tcp**: packet-chunked send/receive loops over a [`std::net::TcpStream`]
//! - **retry**: the bounded retry policy wrapping one request/response
//!   exchange

pub mod endian;
pub mod retry;
pub mod tcp;

pub use retry::{Exchanger, DEFAULT_MAX_ATTEMPTS};
pub use tcp::Connection;
