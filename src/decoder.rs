//! Poetic decoding: corpus words back to bytes.
//!
//! Tokens are split on any whitespace, so line breaks and extra spacing added
//! in transit do not matter. Each token's corpus index becomes a `bits`-wide
//! group; the groups are concatenated and regrouped into bytes MSB-first.
//!
//! Trailing bits that do not fill a byte are dropped. When `bits > 8`, the
//! encoder's end padding can span a whole byte, so the output may carry extra
//! zero bytes after the original payload. With the bundled corpus (`bits = 8`)
//! the round trip is exact.

use tracing::debug;

use crate::corpus::{CorpusProvider, CorpusTable};
use crate::encoder::{CodecError, PoeticCodec};

/// Turns word text back into binary payloads.
pub trait PoeticDecoder {
    /// Decodes `text`. Fails on the first token outside the corpus.
    fn decode(&self, text: &str) -> Result<Vec<u8>, CodecError>;

    /// Like [`validate`](Self::validate), but reports an unavailable corpus
    /// as an error instead of folding it into `false`.
    fn try_validate(&self, text: &str) -> Result<bool, CodecError>;

    /// True if `text` is non-empty and every token is a corpus word.
    ///
    /// Membership only: a text that passes may still fail to decode when it
    /// uses a word the encoder never emits. Also false when no corpus is
    /// loaded; use [`try_validate`](Self::try_validate) to tell the two apart.
    fn validate(&self, text: &str) -> bool {
        self.try_validate(text).unwrap_or(false)
    }
}

impl<C: CorpusProvider> PoeticDecoder for PoeticCodec<C> {
    fn decode(&self, text: &str) -> Result<Vec<u8>, CodecError> {
        let table = self.corpus().snapshot()?;
        decode_with_table(&table, text)
    }

    fn try_validate(&self, text: &str) -> Result<bool, CodecError> {
        let table = self.corpus().snapshot()?;
        Ok(validate_with_table(&table, text))
    }
}

/// Decodes `text` against a fixed table.
pub fn decode_with_table(table: &CorpusTable, text: &str) -> Result<Vec<u8>, CodecError> {
    let bits = table.bits_per_word();
    let limit = 1u128 << bits;

    let mut out = Vec::new();
    let mut acc: u128 = 0;
    let mut acc_bits: u32 = 0;
    let mut tokens = 0usize;

    for (position, token) in text.split_whitespace().enumerate() {
        let index = match table.index_of(token) {
            Some(index) => index as u128,
            None => {
                debug!(position, "unknown word in poetic text");
                return Err(CodecError::UnknownWord {
                    word: token.to_string(),
                    position,
                });
            }
        };
        if index >= limit {
            return Err(CodecError::UnusableWord {
                word: token.to_string(),
                position,
            });
        }

        acc = (acc << bits) | index;
        acc_bits += bits;
        while acc_bits >= 8 {
            acc_bits -= 8;
            out.push((acc >> acc_bits) as u8);
        }
        acc &= (1u128 << acc_bits) - 1;
        tokens += 1;
    }

    debug!(words = tokens, bytes = out.len(), dropped_bits = acc_bits, "decoded poetic text");
    Ok(out)
}

/// Membership check against a fixed table.
pub fn validate_with_table(table: &CorpusTable, text: &str) -> bool {
    let mut tokens = text.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(|token| table.contains(token))
}
