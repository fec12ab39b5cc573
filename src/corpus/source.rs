//! Byte sources a corpus can be loaded from.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The word list shipped with versecrypt (256 words, 8 bits per word).
const BUNDLED_CORPUS: &[u8] = include_bytes!("../../assets/corpus.txt");

/// An external byte source holding a newline-delimited word list.
///
/// `read` is called once per load or reload.
pub trait CorpusSource: Send + Sync {
    /// Reads the whole source.
    fn read(&self) -> io::Result<Vec<u8>>;

    /// Human readable description, used in logs.
    fn describe(&self) -> String;
}

/// A corpus stored in a file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusSource for FileSource {
    fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A corpus held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    bytes: Cow<'static, [u8]>,
}

impl MemorySource {
    /// Creates a source from owned bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Cow::Owned(bytes.into()),
        }
    }

    /// Creates a source from a list of words, one per line.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Self {
        let joined = words
            .iter()
            .map(|w| w.as_ref())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(joined.into_bytes())
    }

    /// The word list bundled with the crate.
    pub fn bundled() -> Self {
        Self {
            bytes: Cow::Borrowed(BUNDLED_CORPUS),
        }
    }
}

impl CorpusSource for MemorySource {
    fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.bytes.to_vec())
    }

    fn describe(&self) -> String {
        match self.bytes {
            Cow::Borrowed(_) => "bundled corpus".to_string(),
            Cow::Owned(ref b) => format!("in-memory corpus ({} bytes)", b.len()),
        }
    }
}
