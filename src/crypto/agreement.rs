//! ECDH key agreement and directional key derivation.
//!
//! Both parties compute the same shared secret. Each message is then keyed by
//! HKDF-SHA256 over that secret, with:
//! - salt: a random per-message value carried in the ciphertext
//! - info: a label followed by the author's and the reader's SPKI bytes
//!
//! Putting the author first means traffic flowing in opposite directions never
//! shares a key/nonce pair, even under the same salt.

use std::fmt;

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::cipher::CipherError;
use super::keys::{PrivateKey, PublicKey};

/// HKDF info label for message key derivation.
const HKDF_INFO_LABEL: &[u8] = b"VERSECRYPT-MESSAGE-V1";

/// ChaCha20-Poly1305 key size.
pub const KEY_SIZE: usize = 32;

/// ChaCha20-Poly1305 nonce size.
pub const NONCE_SIZE: usize = 12;

/// Algorithm tag for derived keys.
pub const SYMMETRIC_ALGORITHM: &str = "ChaCha20-Poly1305";

/// Which side of the conversation authored the traffic being keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The local party wrote the message (encrypting, or re-reading one's own).
    Initiator,
    /// The peer wrote the message (decrypting something received).
    Responder,
}

/// Raw ECDH output. Wiped on drop.
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}

/// A symmetric key and the algorithm it is meant for.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
    #[zeroize(skip)]
    algorithm: &'static str,
}

impl SymmetricKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    pub fn algorithm(&self) -> &'static str {
        self.algorithm
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("algorithm", &self.algorithm)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Key plus nonce, sized for the message cipher.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeyMaterial {
    key: SymmetricKey,
    nonce: [u8; NONCE_SIZE],
}

impl DerivedKeyMaterial {
    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }

    pub fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }
}

impl fmt::Debug for DerivedKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKeyMaterial")
            .field("key", &self.key)
            .field("nonce", &"[REDACTED]")
            .finish()
    }
}

/// ECDH between a local private key and a peer public key.
pub fn agree(private: &PrivateKey, peer: &PublicKey) -> SharedSecret {
    let shared = p256::ecdh::diffie_hellman(
        private.secret().to_nonzero_scalar(),
        peer.point().as_affine(),
    );
    SharedSecret(shared.raw_secret_bytes().to_vec())
}

/// Derives the key material for one message.
///
/// `role` says who wrote the message: with [`Role::Initiator`] the local key
/// is the author, with [`Role::Responder`] the peer is. Alice encrypting with
/// `Initiator` and Bob decrypting with `Responder` arrive at the same material.
pub fn derive_key_material(
    my_private: &PrivateKey,
    my_public: &PublicKey,
    their_public: &PublicKey,
    role: Role,
    salt: &[u8],
) -> Result<DerivedKeyMaterial, CipherError> {
    let shared = agree(my_private, their_public);

    let (author, reader) = match role {
        Role::Initiator => (my_public, their_public),
        Role::Responder => (their_public, my_public),
    };

    let mut info = Vec::with_capacity(HKDF_INFO_LABEL.len() + 8 + author.encoded().len() * 2);
    info.extend_from_slice(HKDF_INFO_LABEL);
    for key in [author, reader] {
        info.extend_from_slice(&(key.encoded().len() as u32).to_be_bytes());
        info.extend_from_slice(key.encoded());
    }

    let hk = Hkdf::<Sha256>::new(Some(salt), shared.as_bytes());
    let mut okm = zeroize::Zeroizing::new([0u8; KEY_SIZE + NONCE_SIZE]);
    hk.expand(&info, &mut okm[..])
        .map_err(|_| CipherError::KeyDerivationFailed)?;

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&okm[..KEY_SIZE]);
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(&okm[KEY_SIZE..]);

    Ok(DerivedKeyMaterial {
        key: SymmetricKey {
            bytes,
            algorithm: SYMMETRIC_ALGORITHM,
        },
        nonce,
    })
}
