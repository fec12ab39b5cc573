//! Immutable word table built from a corpus source.

use std::collections::HashMap;

use super::{CorpusError, MIN_CORPUS_SIZE};

/// An ordered, duplicate-free word list with reverse lookup.
///
/// Line `i` of the source is index `i`. Once built, a table never changes;
/// reloading a corpus builds a new table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusTable {
    words: Vec<String>,
    index: HashMap<String, usize>,
}

impl CorpusTable {
    /// Parses a newline-delimited UTF-8 word list.
    ///
    /// Each line is trimmed, and trailing blank lines (including the one left
    /// by a final newline) are ignored. Blank lines between words are rejected
    /// since they would shift every following index.
    pub fn parse(bytes: &[u8]) -> Result<Self, CorpusError> {
        let text = std::str::from_utf8(bytes)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut lines: Vec<&str> = text.lines().map(str::trim).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        Self::from_words(lines)
    }

    /// Builds a table from words in index order.
    pub fn from_words<I, S>(words: I) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Vec::new();
        let mut index = HashMap::new();

        for (i, word) in words.into_iter().enumerate() {
            let word: String = word.into();
            let line = i + 1;

            if word.is_empty() {
                return Err(CorpusError::BlankLine(line));
            }
            if word.chars().any(char::is_whitespace) {
                return Err(CorpusError::InvalidWord { word, line });
            }
            if index.insert(word.clone(), i).is_some() {
                return Err(CorpusError::DuplicateWord { word, line });
            }
            list.push(word);
        }

        match list.len() {
            0 => Err(CorpusError::Empty),
            n if n < MIN_CORPUS_SIZE => Err(CorpusError::TooSmall(n)),
            _ => Ok(Self { words: list, index }),
        }
    }

    /// Number of words (N).
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false for a successfully built table.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns the word at `index`.
    pub fn word(&self, index: usize) -> Result<&str, CorpusError> {
        self.words
            .get(index)
            .map(String::as_str)
            .ok_or(CorpusError::IndexOutOfRange {
                index,
                len: self.words.len(),
            })
    }

    /// Returns the position of `word`, or `None` if it is not in the corpus.
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Returns true if `word` is in the corpus.
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Payload bits carried by one word: `floor(log2(N))`.
    ///
    /// `2^bits_per_word <= N`, so every chunk value is a valid index.
    pub fn bits_per_word(&self) -> u32 {
        self.words.len().ilog2()
    }

    /// Iterates over the words in index order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}
