//! End-to-end transfer run.
//!
//! Ties the pieces together: resolve an identity (reconnect or fresh
//! registration), establish the session key, read the file, and drive the
//! checksum-verified transfer.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::TransferConfig;
use crate::core::wire::WireName;
use crate::crypto::SessionCipher;
use crate::error::{ProtocolError, Result};
use crate::protocol::Session;
use crate::service::identity::{ClientIdentity, IdentityStore};

/// Run one full transfer described by `config`, persisting identity state
/// through `store`.
pub fn run(config: &TransferConfig, store: &IdentityStore) -> Result<()> {
    let session = Session::new(&config.address, config.port)?;
    let (identity, cipher) = establish(&session, config, store)?;

    let path = config.file_path.as_path();
    let plaintext = fs::read(path)?;
    let file_name = file_name_of(path)?;
    info!(file = %file_name, bytes = plaintext.len(), "sending file");

    session.transfer_file(&identity, &cipher, &file_name, &plaintext)?;
    info!(file = %file_name, "transfer accepted by server");
    Ok(())
}

/// Produce a ready-to-transfer identity and session cipher.
///
/// A stored identity is tried first via reconnect. A rejected reconnect is
/// not fatal: the server forgot us, so we register from scratch under the
/// configured name and overwrite the stored identity.
fn establish(
    session: &Session,
    config: &TransferConfig,
    store: &IdentityStore,
) -> Result<(ClientIdentity, SessionCipher)> {
    if store.exists() {
        let identity = store.load()?;
        if let Some(cipher) = session.reconnect(&identity)? {
            return Ok((identity, cipher));
        }
        warn!(id = %identity.id, "stored identity no longer known to server");
    }

    let name = WireName::new(&config.client_name)?;
    let id = session.register(&name)?;
    let identity = ClientIdentity::generate(name, id)?;
    store.store(&identity)?;

    let cipher = session.send_public_key(&identity)?;
    Ok((identity, cipher))
}

/// The transfer carries only the final path component, NUL-padded.
fn file_name_of(path: &Path) -> Result<WireName> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ProtocolError::Config(format!("bad file path: {}", path.display())))?;
    WireName::new(name)
}
