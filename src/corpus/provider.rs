//! Corpus provider and its owning context.
//!
//! There is no process-wide corpus. Callers build a `CorpusContext`, load it,
//! and pass it (or an `Arc` of it) to the codec.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use super::{CorpusError, CorpusSource, CorpusTable, MemorySource};

/// Access to a loaded word corpus.
///
/// Every query fails with [`CorpusError::NotLoaded`] until `load` succeeds.
pub trait CorpusProvider: Send + Sync {
    /// Reads the source and installs a fresh table. Returns the word count.
    fn load(&self) -> Result<usize, CorpusError>;

    /// Re-reads the source and swaps the table in one step.
    ///
    /// On failure the previously loaded table stays active.
    fn reload(&self) -> Result<usize, CorpusError> {
        self.load()
    }

    /// Returns true once a table is installed.
    fn is_loaded(&self) -> bool;

    /// Returns the current table.
    ///
    /// The handle stays valid and unchanged across later reloads, so one
    /// encode or decode pass sees a single consistent corpus.
    fn snapshot(&self) -> Result<Arc<CorpusTable>, CorpusError>;

    /// Returns the word at `index`.
    fn word(&self, index: usize) -> Result<String, CorpusError> {
        self.snapshot()?.word(index).map(str::to_string)
    }

    /// Returns the index of `word`, `None` if it is not in the corpus.
    fn index_of(&self, word: &str) -> Result<Option<usize>, CorpusError> {
        Ok(self.snapshot()?.index_of(word))
    }

    /// Returns the number of words (N).
    fn word_count(&self) -> Result<usize, CorpusError> {
        Ok(self.snapshot()?.len())
    }
}

impl<T: CorpusProvider + ?Sized> CorpusProvider for Arc<T> {
    fn load(&self) -> Result<usize, CorpusError> {
        (**self).load()
    }

    fn reload(&self) -> Result<usize, CorpusError> {
        (**self).reload()
    }

    fn is_loaded(&self) -> bool {
        (**self).is_loaded()
    }

    fn snapshot(&self) -> Result<Arc<CorpusTable>, CorpusError> {
        (**self).snapshot()
    }
}

/// Owns a corpus source and the table loaded from it.
pub struct CorpusContext {
    source: Box<dyn CorpusSource>,
    table: RwLock<Option<Arc<CorpusTable>>>,
}

impl std::fmt::Debug for CorpusContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusContext")
            .field("source", &self.source.describe())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl CorpusContext {
    /// Creates an unloaded context over `source`.
    pub fn new(source: impl CorpusSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            table: RwLock::new(None),
        }
    }

    /// Creates and loads a context in one call.
    pub fn load_from(source: impl CorpusSource + 'static) -> Result<Self, CorpusError> {
        let ctx = Self::new(source);
        ctx.load()?;
        Ok(ctx)
    }

    /// Creates and loads a context over the bundled word list.
    pub fn bundled() -> Result<Self, CorpusError> {
        Self::load_from(MemorySource::bundled())
    }

    /// Drops the loaded table. Later queries fail until the next load.
    pub fn unload(&self) {
        // The slot holds whole tables only; a poisoned lock is still consistent.
        let mut slot = self.table.write().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
        debug!(source = %self.source.describe(), "corpus unloaded");
    }

    fn install(&self, table: CorpusTable) -> usize {
        let len = table.len();
        let table = Arc::new(table);
        let mut slot = self.table.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(table);
        len
    }
}

impl CorpusProvider for CorpusContext {
    fn load(&self) -> Result<usize, CorpusError> {
        let description = self.source.describe();

        // Build the new table before touching the lock.
        let table = self
            .source
            .read()
            .map_err(CorpusError::from)
            .and_then(|bytes| CorpusTable::parse(&bytes));

        match table {
            Ok(table) => {
                let bits = table.bits_per_word();
                let len = self.install(table);
                info!(source = %description, words = len, bits_per_word = bits, "corpus loaded");
                Ok(len)
            }
            Err(e) => {
                warn!(source = %description, error = %e, "corpus load failed");
                Err(e)
            }
        }
    }

    fn is_loaded(&self) -> bool {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn snapshot(&self) -> Result<Arc<CorpusTable>, CorpusError> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CorpusError::NotLoaded)
    }
}
