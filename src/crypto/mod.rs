//! # Cryptographic Collaborators
//!
//! RSA key lifecycle, the AES-CBC session cipher, and the CRC32 checksum.
//!
//! The session engine calls these as black boxes; all algorithm and key-size
//! choices live here. The parameters are dictated by the wire format the
//! server speaks: RSA-1024 with OAEP-SHA1 for session-key delivery, and
//! AES-128-CBC with PKCS#7 padding for file content.
//!
//! ## Security
//! The CBC initialization vector is fixed at all zeroes. That is a known
//! weakness (identical prefixes leak across messages under the same key),
//! but the server derives the same IV, so randomizing it would change the
//! wire layout. See DESIGN.md for the compatibility decision.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;

use crate::core::wire::{AES_KEY_SIZE, PUBLIC_KEY_SIZE};
use crate::error::{ProtocolError, Result};

/// RSA modulus size matching the 160-byte public-key wire field.
const RSA_BITS: usize = 1024;

/// AES block size; ciphertext lengths are always a multiple of this.
pub const AES_BLOCK_SIZE: usize = 16;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// The client's asymmetric key pair.
///
/// Generated once at registration, persisted DER-encoded by the identity
/// store, and used to decrypt the session key the server delivers.
pub struct RsaKeyPair {
    private: RsaPrivateKey,
}

impl RsaKeyPair {
    /// Generate a fresh key pair.
    pub fn generate() -> Result<Self> {
        let private = RsaPrivateKey::new(&mut OsRng, RSA_BITS)
            .map_err(|e| ProtocolError::Crypto(format!("key generation failed: {e}")))?;
        Ok(RsaKeyPair { private })
    }

    /// Rebuild a key pair from PKCS#1 DER bytes, as stored by the identity
    /// store.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs1_der(der)
            .map_err(|e| ProtocolError::Crypto(format!("bad private key: {e}")))?;
        Ok(RsaKeyPair { private })
    }

    /// PKCS#1 DER encoding of the private key, for persistence.
    pub fn private_key_der(&self) -> Result<Vec<u8>> {
        let der = self
            .private
            .to_pkcs1_der()
            .map_err(|e| ProtocolError::Crypto(format!("private key encode failed: {e}")))?;
        Ok(der.as_bytes().to_vec())
    }

    /// The public key as the fixed-size wire field: PKCS#1 DER, zero-padded
    /// to [`PUBLIC_KEY_SIZE`]. DER is self-delimiting, so the peer ignores
    /// the padding.
    pub fn public_key_wire(&self) -> Result<[u8; PUBLIC_KEY_SIZE]> {
        let der = RsaPublicKey::from(&self.private)
            .to_pkcs1_der()
            .map_err(|e| ProtocolError::Crypto(format!("public key encode failed: {e}")))?;
        let der = der.as_bytes();
        if der.len() > PUBLIC_KEY_SIZE {
            return Err(ProtocolError::Crypto(format!(
                "public key is {} bytes, wire field holds {PUBLIC_KEY_SIZE}",
                der.len()
            )));
        }
        let mut field = [0u8; PUBLIC_KEY_SIZE];
        field[..der.len()].copy_from_slice(der);
        Ok(field)
    }

    /// Decrypt an OAEP-SHA1 blob with the private key. Used on the
    /// RSA-encrypted session key the server delivers.
    pub fn decrypt(&self, cipher: &[u8]) -> Result<Vec<u8>> {
        self.private
            .decrypt(Oaep::new::<Sha1>(), cipher)
            .map_err(|e| ProtocolError::Crypto(format!("session key decryption failed: {e}")))
    }
}

/// The per-session symmetric cipher built from the server-delivered AES key.
///
/// Scoped to one transfer run and never persisted.
#[derive(Debug)]
pub struct SessionCipher {
    key: [u8; AES_KEY_SIZE],
}

impl SessionCipher {
    /// Wrap a decrypted session key, checking its length.
    pub fn new(key: &[u8]) -> Result<Self> {
        let key: [u8; AES_KEY_SIZE] = key.try_into().map_err(|_| {
            ProtocolError::Crypto(format!(
                "session key must be {AES_KEY_SIZE} bytes, got {}",
                key.len()
            ))
        })?;
        Ok(SessionCipher { key })
    }

    /// AES-128-CBC encrypt with PKCS#7 padding and the fixed zero IV.
    pub fn encrypt(&self, plain: &[u8]) -> Vec<u8> {
        let iv = [0u8; AES_BLOCK_SIZE];
        Aes128CbcEnc::new(&self.key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plain)
    }

    /// AES-128-CBC decrypt, stripping PKCS#7 padding.
    pub fn decrypt(&self, cipher: &[u8]) -> Result<Vec<u8>> {
        let iv = [0u8; AES_BLOCK_SIZE];
        Aes128CbcDec::new(&self.key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(cipher)
            .map_err(|e| ProtocolError::Crypto(format!("content decryption failed: {e}")))
    }
}

/// CRC32 over `bytes`. The transfer integrity check runs this over the
/// original plaintext on both ends.
pub fn checksum(bytes: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}
