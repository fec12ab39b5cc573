//! # versecrypt - encrypted messages that read like verse
//!
//! versecrypt disguises end-to-end encrypted messages as ordinary text so
//! they can travel over any chat channel.
//!
//! ## Overview
//!
//! - Each party holds a P-256 identity key pair and the other's public key
//! - ECDH plus HKDF-SHA256 derives a fresh, direction-specific key per message
//! - ChaCha20-Poly1305 seals the payload
//! - The ciphertext bytes are packed into indices of a shared word list and
//!   printed as lines of words
//!
//! Both sides must use the same word list; a mismatch surfaces as an unknown
//! word or an authentication failure, never as silently wrong output.
//!
//! ## Example Usage
//!
//! ```rust
//! use versecrypt::corpus::CorpusContext;
//! use versecrypt::crypto::{AeadMessageCipher, EcKeyManager, KeyManager, MessageCipher, Role};
//! use versecrypt::{PoeticCodec, PoeticDecoder, PoeticEncoder};
//!
//! let keys = EcKeyManager::default();
//! let alice = keys.generate_identity_key_pair().unwrap();
//! let bob = keys.generate_identity_key_pair().unwrap();
//!
//! let cipher = AeadMessageCipher::new();
//! let codec = PoeticCodec::new(CorpusContext::bundled().unwrap());
//!
//! // Alice seals and disguises
//! let sealed = cipher.encrypt_message(b"see you at dawn", &alice, bob.public_key()).unwrap();
//! let verse = codec.encode(&sealed).unwrap();
//!
//! // Bob reverses both steps
//! let bytes = codec.decode(&verse).unwrap();
//! let plain = cipher
//!     .decrypt_message(&bytes, &bob, alice.public_key(), Role::Responder)
//!     .unwrap();
//! assert_eq!(plain, b"see you at dawn");
//! ```
//!
//! ## Modules
//!
//! - [`corpus`]: Word list sources, the lookup table, and the reloadable provider
//! - [`crypto`]: Keys, fingerprints, key agreement and message encryption
//! - [`encoder`]: Bytes to words
//! - [`decoder`]: Words to bytes
//! - [`peers`]: Peer public-key trust store
//! - [`verse`]: Encrypt-and-encode in one step, tolerant of wide-word padding
//! - [`config`]: User configuration file

/// Words per output line.
pub const LINE_WORDS: usize = 6;

pub mod config;
pub mod corpus;
pub mod crypto;
pub mod decoder;
pub mod encoder;
pub mod peers;
pub mod verse;

pub use config::{Config, ConfigError};
pub use decoder::PoeticDecoder;
pub use encoder::{CodecError, PoeticCodec, PoeticEncoder};
pub use verse::{open_verse, seal_verse, VerseError};
