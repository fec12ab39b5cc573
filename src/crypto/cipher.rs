//! Message encryption between two identities.
//!
//! Wire layout: `salt (16) || ciphertext || tag (16)`.
//! The salt feeds the key derivation, so every message gets a fresh key and
//! nonce even between the same two parties.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use tracing::debug;

use super::agreement::{derive_key_material, Role};
use super::keys::{IdentityKeyPair, PublicKey};

/// Per-message HKDF salt size.
pub const SALT_SIZE: usize = 16;

/// Poly1305 tag size.
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during message encryption.
#[derive(Error, Debug)]
pub enum CipherError {
    /// Tag did not verify: tampered data or the wrong key.
    #[error("Authentication failed: message was tampered with or keys do not match")]
    AuthenticationFailure,

    #[error("Malformed ciphertext: {0}")]
    Decoding(String),

    #[error("Key derivation failed")]
    KeyDerivationFailed,

    #[error("Cipher initialization failed: {0}")]
    CipherInit(String),
}

/// Authenticated two-party message encryption.
pub trait MessageCipher: Send + Sync {
    /// Encrypts a message written by `my_identity` for `their_public`.
    fn encrypt_message(
        &self,
        plaintext: &[u8],
        my_identity: &IdentityKeyPair,
        their_public: &PublicKey,
    ) -> Result<Vec<u8>, CipherError>;

    /// Decrypts a message exchanged with `their_public`.
    ///
    /// Use [`Role::Responder`] for messages the peer wrote and
    /// [`Role::Initiator`] to re-read one's own sent messages.
    fn decrypt_message(
        &self,
        ciphertext: &[u8],
        my_identity: &IdentityKeyPair,
        their_public: &PublicKey,
        role: Role,
    ) -> Result<Vec<u8>, CipherError>;
}

/// ChaCha20-Poly1305 keyed by directional ECDH + HKDF material.
#[derive(Debug, Clone, Copy, Default)]
pub struct AeadMessageCipher;

impl AeadMessageCipher {
    pub fn new() -> Self {
        Self
    }

    fn cipher_for(
        my_identity: &IdentityKeyPair,
        their_public: &PublicKey,
        role: Role,
        salt: &[u8],
    ) -> Result<(ChaCha20Poly1305, [u8; 12]), CipherError> {
        let material = derive_key_material(
            my_identity.private_key(),
            my_identity.public_key(),
            their_public,
            role,
            salt,
        )?;
        let cipher = ChaCha20Poly1305::new_from_slice(material.key().as_bytes())
            .map_err(|e| CipherError::CipherInit(e.to_string()))?;
        Ok((cipher, *material.nonce()))
    }
}

impl MessageCipher for AeadMessageCipher {
    fn encrypt_message(
        &self,
        plaintext: &[u8],
        my_identity: &IdentityKeyPair,
        their_public: &PublicKey,
    ) -> Result<Vec<u8>, CipherError> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| CipherError::CipherInit(format!("random source failed: {}", e)))?;

        let (cipher, nonce) = Self::cipher_for(my_identity, their_public, Role::Initiator, &salt)?;

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CipherError::CipherInit(e.to_string()))?;

        let mut result = Vec::with_capacity(SALT_SIZE + ciphertext.len());
        result.extend_from_slice(&salt);
        result.extend_from_slice(&ciphertext);

        debug!(plaintext_len = plaintext.len(), ciphertext_len = result.len(), "message encrypted");
        Ok(result)
    }

    fn decrypt_message(
        &self,
        ciphertext: &[u8],
        my_identity: &IdentityKeyPair,
        their_public: &PublicKey,
        role: Role,
    ) -> Result<Vec<u8>, CipherError> {
        // Minimum: 16 (salt) + 16 (auth tag) = 32 bytes
        if ciphertext.len() < SALT_SIZE + TAG_SIZE {
            return Err(CipherError::Decoding(format!(
                "expected at least {} bytes, got {}",
                SALT_SIZE + TAG_SIZE,
                ciphertext.len()
            )));
        }

        let (salt, sealed) = ciphertext.split_at(SALT_SIZE);
        let (cipher, nonce) = Self::cipher_for(my_identity, their_public, role, salt)?;

        cipher
            .decrypt(Nonce::from_slice(&nonce), sealed)
            .map_err(|_| {
                debug!(?role, "message authentication failed");
                CipherError::AuthenticationFailure
            })
    }
}
