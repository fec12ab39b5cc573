//! Cryptographic operations for versecrypt.
//!
//! This module provides:
//! - P-256 key pairs (identity and ephemeral), SPKI/PKCS#8 encodings, key files
//! - The identity key-pair container format
//! - Public-key fingerprints for out-of-band verification
//! - ECDH key agreement with directional HKDF-SHA256 derivation
//! - Message encryption with ChaCha20-Poly1305

pub mod agreement;
pub mod cipher;
pub mod container;
pub mod keys;
pub mod manager;

pub use agreement::{agree, derive_key_material, DerivedKeyMaterial, Role, SharedSecret, SymmetricKey};
pub use cipher::{AeadMessageCipher, CipherError, MessageCipher};
pub use container::{decode_identity_container, encode_identity_container};
pub use keys::{
    CryptoKey, Curve, Ephemeral, EphemeralKeyPair, Identity, IdentityKeyPair, KeyError, KeyPair,
    KeyRole, KeyType, PrivateKey, PublicKey, EC_ALGORITHM,
};
pub use keys::{load_private_key, load_public_key, write_private_file};
pub use manager::{fingerprint, EcKeyManager, KeyManager, DEFAULT_KEYGEN_ATTEMPTS};
