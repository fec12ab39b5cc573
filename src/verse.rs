//! Sealed verse: message encryption and poetic encoding in one step.
//!
//! With a corpus wider than 8 bits per word, the encoder's end padding can
//! decode as extra zero bytes after the ciphertext. Opening a verse therefore
//! tries every ciphertext length that the encoder maps to the same number of
//! words, shortest first, dropping only trailing zero bytes. The AEAD tag
//! decides which one is real.

use thiserror::Error;
use tracing::debug;

use crate::corpus::{CorpusProvider, CorpusTable};
use crate::crypto::{CipherError, IdentityKeyPair, MessageCipher, PublicKey, Role};
use crate::decoder::decode_with_table;
use crate::encoder::{encode_with_table, word_count, CodecError, PoeticCodec};

#[derive(Error, Debug)]
pub enum VerseError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),
}

/// Encrypts `plaintext` for `their_public` and encodes it as verse.
pub fn seal_verse<C, M>(
    codec: &PoeticCodec<C>,
    cipher: &M,
    plaintext: &[u8],
    my_identity: &IdentityKeyPair,
    their_public: &PublicKey,
) -> Result<String, VerseError>
where
    C: CorpusProvider,
    M: MessageCipher + ?Sized,
{
    let table = codec.corpus().snapshot().map_err(CodecError::from)?;
    let sealed = cipher.encrypt_message(plaintext, my_identity, their_public)?;
    Ok(encode_with_table(&table, &sealed)?)
}

/// Decodes `verse` and decrypts it.
///
/// Fails with [`CipherError::AuthenticationFailure`] only when no candidate
/// ciphertext length authenticates.
pub fn open_verse<C, M>(
    codec: &PoeticCodec<C>,
    cipher: &M,
    verse: &str,
    my_identity: &IdentityKeyPair,
    their_public: &PublicKey,
    role: Role,
) -> Result<Vec<u8>, VerseError>
where
    C: CorpusProvider,
    M: MessageCipher + ?Sized,
{
    let table = codec.corpus().snapshot().map_err(CodecError::from)?;
    let decoded = decode_with_table(&table, verse)?;

    let mut last_error = None;
    for len in ciphertext_lengths(&table, verse, &decoded) {
        match cipher.decrypt_message(&decoded[..len], my_identity, their_public, role) {
            Ok(plaintext) => {
                debug!(decoded = decoded.len(), ciphertext = len, "verse opened");
                return Ok(plaintext);
            }
            Err(e @ (CipherError::AuthenticationFailure | CipherError::Decoding(_))) => {
                last_error = Some(e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(last_error.unwrap_or(CipherError::AuthenticationFailure).into())
}

/// Ciphertext lengths the encoder could have turned into this many words,
/// shortest first. Falls back to the full decoded length when the word count
/// matches none of them.
fn ciphertext_lengths(table: &CorpusTable, verse: &str, decoded: &[u8]) -> Vec<usize> {
    let words = verse.split_whitespace().count();
    let bits = table.bits_per_word();

    let mut lengths: Vec<usize> = (0..=decoded.len())
        .filter(|&len| word_count(bits, len) == Some(words))
        .filter(|&len| decoded[len..].iter().all(|&b| b == 0))
        .collect();

    if lengths.is_empty() {
        lengths.push(decoded.len());
    }
    lengths
}
