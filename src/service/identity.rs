//! Persisted client identity.
//!
//! The identity file (`me.info`) holds three lines: the display name, the
//! 32-hex-character server-assigned id, and the Base64-encoded DER private
//! key. A raw DER copy of the private key is also written to `priv.key` at
//! registration time as a backup for external tooling.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use tracing::info;

use crate::core::wire::{ClientId, WireName, NAME_SIZE};
use crate::crypto::RsaKeyPair;
use crate::error::{ProtocolError, Result};

/// Conventional identity file name.
pub const ME_INFO: &str = "me.info";

/// Conventional raw private-key backup file name.
pub const PRIVATE_KEY_FILE: &str = "priv.key";

/// A registered client: name, server-assigned id, and key pair.
///
/// Immutable for the lifetime of a session. Created once at registration or
/// loaded from the store on reconnect.
pub struct ClientIdentity {
    pub name: WireName,
    pub id: ClientId,
    pub keys: RsaKeyPair,
}

impl ClientIdentity {
    /// Build a fresh identity for a newly registered client, generating a
    /// new key pair.
    pub fn generate(name: WireName, id: ClientId) -> Result<Self> {
        let keys = RsaKeyPair::generate()?;
        Ok(ClientIdentity { name, id, keys })
    }
}

/// Reads and writes the identity files.
pub struct IdentityStore {
    info_path: PathBuf,
    key_backup_path: PathBuf,
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new(ME_INFO, PRIVATE_KEY_FILE)
    }
}

impl IdentityStore {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(info_path: P, key_backup_path: Q) -> Self {
        IdentityStore {
            info_path: info_path.as_ref().to_path_buf(),
            key_backup_path: key_backup_path.as_ref().to_path_buf(),
        }
    }

    /// Whether an identity file exists at all.
    pub fn exists(&self) -> bool {
        self.info_path.exists()
    }

    /// Load a persisted identity, validating each line's shape.
    pub fn load(&self) -> Result<ClientIdentity> {
        let contents = fs::read_to_string(&self.info_path).map_err(|e| {
            ProtocolError::Identity(format!("couldn't read {}: {e}", self.info_path.display()))
        })?;
        let mut lines = contents.lines();

        let name_line = lines
            .next()
            .ok_or_else(|| ProtocolError::Identity("identity file is empty".into()))?
            .trim();
        if name_line.is_empty() || name_line.len() >= NAME_SIZE {
            return Err(ProtocolError::Identity(format!(
                "client name must be 1-{} characters",
                NAME_SIZE - 1
            )));
        }
        let name = WireName::new(name_line)?;

        let id_line = lines
            .next()
            .ok_or_else(|| ProtocolError::Identity("missing client id line".into()))?
            .trim();
        if id_line.len() != 32 {
            return Err(ProtocolError::Identity(format!(
                "client id line must be 32 hex characters, got {}",
                id_line.len()
            )));
        }
        let id = ClientId::from_hex(id_line)?;

        // The Base64 key may wrap over several lines.
        let encoded_key: String = lines.map(str::trim).collect();
        if encoded_key.is_empty() {
            return Err(ProtocolError::Identity("missing private key".into()));
        }
        let der = general_purpose::STANDARD
            .decode(&encoded_key)
            .map_err(|e| ProtocolError::Identity(format!("bad private key encoding: {e}")))?;
        let keys = RsaKeyPair::from_der(&der)?;

        info!(name = %name, id = %id, "loaded identity");
        Ok(ClientIdentity { name, id, keys })
    }

    /// Persist an identity: the three-line info file plus the raw DER
    /// private-key backup.
    pub fn store(&self, identity: &ClientIdentity) -> Result<()> {
        let der = identity.keys.private_key_der()?;
        let contents = format!(
            "{}\n{}\n{}",
            identity.name,
            identity.id,
            general_purpose::STANDARD.encode(&der)
        );
        fs::write(&self.info_path, contents).map_err(|e| {
            ProtocolError::Identity(format!("couldn't write {}: {e}", self.info_path.display()))
        })?;
        fs::write(&self.key_backup_path, &der).map_err(|e| {
            ProtocolError::Identity(format!(
                "couldn't write {}: {e}",
                self.key_backup_path.display()
            ))
        })?;
        info!(name = %identity.name, id = %identity.id, "stored identity");
        Ok(())
    }
}
