//! # Client Services
//!
//! The pieces around the session engine that make a runnable client: the
//! persisted identity store and the end-to-end transfer run.

pub mod client;
pub mod identity;

pub use identity::{ClientIdentity, IdentityStore};
