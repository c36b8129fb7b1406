//! # Core Protocol Components
//!
//! Wire format definitions and the request/response codec.
//!
//! This module is the single source of truth for the byte layout exchanged
//! with the server. Both ends must agree byte-for-byte, so every structure
//! here is fixed-layout with explicit offsets and no implicit padding.
//!
//! ## Wire Format
//! ```text
//! Request:  [ClientId(16)] [Version(1)] [Code(2)] [PayloadSize(4)] [Payload(N)]
//! Response: [Version(1)] [Code(2)] [PayloadSize(4)] [Payload(N)]
//! ```
//!
//! All multi-byte integers are little-endian on the wire.

pub mod codec;
pub mod wire;
