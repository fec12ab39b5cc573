//! Word corpus for the poetic codec.
//!
//! This module provides:
//! - Corpus sources (file on disk, in-memory bytes, bundled default list)
//! - An immutable word table with O(1) word/index lookup
//! - `CorpusContext`, the explicitly owned provider that loads, reloads and
//!   atomically swaps the table

pub mod provider;
pub mod source;
pub mod table;

pub use provider::{CorpusContext, CorpusProvider};
pub use source::{CorpusSource, FileSource, MemorySource};
pub use table::CorpusTable;

use thiserror::Error;

/// Minimum number of words a corpus needs to encode a single bit.
pub const MIN_CORPUS_SIZE: usize = 2;

/// Errors that can occur while loading or querying a corpus.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Corpus source unreadable: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("Corpus is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Corpus is empty")]
    Empty,

    #[error("Corpus too small: need at least {MIN_CORPUS_SIZE} words, got {0}")]
    TooSmall(usize),

    #[error("Duplicate word '{word}' at line {line}")]
    DuplicateWord { word: String, line: usize },

    #[error("Blank line {0} inside corpus")]
    BlankLine(usize),

    #[error("Invalid word '{word}' at line {line}: words cannot contain whitespace")]
    InvalidWord { word: String, line: usize },

    #[error("Corpus not loaded")]
    NotLoaded,

    #[error("Index {index} out of range for corpus of {len} words")]
    IndexOutOfRange { index: usize, len: usize },
}
