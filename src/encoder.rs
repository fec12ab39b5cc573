//! Poetic encoding: bytes to corpus words.
//!
//! The encoding process:
//! 1. Compute `bits = floor(log2(corpus size))`
//! 2. Read the input as one MSB-first bit string
//! 3. Cut it into `bits`-wide chunks, zero-padding the last one on the right
//! 4. Emit the corpus word at each chunk's index
//! 5. Lay the words out six to a line, space separated

use thiserror::Error;
use tracing::debug;

use crate::corpus::{CorpusError, CorpusProvider, CorpusTable};
use crate::LINE_WORDS;

/// Errors that can occur while encoding or decoding poetic text.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    /// A token that is not in the corpus. `position` is the 0-based token index.
    #[error("Unknown word '{word}' at position {position}")]
    UnknownWord { word: String, position: usize },

    /// A corpus word whose index cannot be produced by the encoder
    /// (index >= 2^bits for a corpus whose size is not a power of two).
    #[error("Word '{word}' at position {position} is outside the encodable range")]
    UnusableWord { word: String, position: usize },

    #[error("Payload of {byte_len} bytes is too large to encode")]
    TooLarge { byte_len: usize },
}

/// Turns binary payloads into word text.
pub trait PoeticEncoder {
    /// Encodes `data` as words. Empty input gives an empty string.
    fn encode(&self, data: &[u8]) -> Result<String, CodecError>;

    /// Number of words `encode` produces for `byte_len` input bytes.
    fn calculate_word_count(&self, byte_len: usize) -> Result<usize, CodecError>;
}

/// Encoder and decoder over a shared corpus provider.
///
/// Each call takes one snapshot of the corpus, so a concurrent reload never
/// mixes two tables within a single message.
#[derive(Debug)]
pub struct PoeticCodec<C> {
    corpus: C,
}

impl<C: CorpusProvider> PoeticCodec<C> {
    pub fn new(corpus: C) -> Self {
        Self { corpus }
    }

    pub fn corpus(&self) -> &C {
        &self.corpus
    }
}

impl<C: CorpusProvider> PoeticEncoder for PoeticCodec<C> {
    fn encode(&self, data: &[u8]) -> Result<String, CodecError> {
        let table = self.corpus.snapshot()?;
        encode_with_table(&table, data)
    }

    fn calculate_word_count(&self, byte_len: usize) -> Result<usize, CodecError> {
        let table = self.corpus.snapshot()?;
        word_count(table.bits_per_word(), byte_len).ok_or(CodecError::TooLarge { byte_len })
    }
}

/// `ceil(8 * byte_len / bits)`, or `None` if the count does not fit a `usize`.
pub fn word_count(bits_per_word: u32, byte_len: usize) -> Option<usize> {
    let bits = (byte_len as u128) * 8;
    usize::try_from(bits.div_ceil(u128::from(bits_per_word))).ok()
}

/// Encodes `data` against a fixed table.
pub fn encode_with_table(table: &CorpusTable, data: &[u8]) -> Result<String, CodecError> {
    if data.is_empty() {
        return Ok(String::new());
    }

    let bits = table.bits_per_word();
    let mask = (1u128 << bits) - 1;

    let mut words: Vec<&str> = Vec::with_capacity(word_count(bits, data.len()).unwrap_or(0));
    let mut acc: u128 = 0;
    let mut acc_bits: u32 = 0;

    for &byte in data {
        acc = (acc << 8) | u128::from(byte);
        acc_bits += 8;

        while acc_bits >= bits {
            acc_bits -= bits;
            let index = ((acc >> acc_bits) & mask) as usize;
            words.push(table.word(index)?);
        }
        acc &= (1u128 << acc_bits) - 1;
    }

    if acc_bits > 0 {
        // Right-pad the final chunk with zeros.
        let index = ((acc << (bits - acc_bits)) & mask) as usize;
        words.push(table.word(index)?);
    }

    debug!(bytes = data.len(), words = words.len(), bits_per_word = bits, "encoded payload");
    Ok(format_lines(&words))
}

fn format_lines(words: &[&str]) -> String {
    words
        .chunks(LINE_WORDS)
        .map(|line| line.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}
