mod ranking;
mod trie;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

pub use ranking::{top_k, ScoredEntry};
pub use trie::PrefixIndex;

pub const DEFAULT_TERMINATOR: char = '#';
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Index handle shared between sessions. Lookups take the read lock, the
/// finalize path takes the write lock.
pub type SharedIndex = Arc<RwLock<PrefixIndex>>;

pub fn shared(index: PrefixIndex) -> SharedIndex {
    Arc::new(RwLock::new(index))
}

// Insert only performs map updates, so a panic elsewhere never leaves the
// tree half-written and the poisoned guard is safe to use.
fn read(index: &SharedIndex) -> RwLockReadGuard<'_, PrefixIndex> {
    index.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(index: &SharedIndex) -> RwLockWriteGuard<'_, PrefixIndex> {
    index.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub entries: usize,
    pub nodes: usize,
}

/// One user's typing state over a (possibly shared) prefix index.
#[derive(Debug, Clone)]
pub struct CompletionSession {
    index: SharedIndex,
    current_prefix: String,
    terminator: char,
    max_results: usize,
}

impl CompletionSession {
    pub fn new(index: SharedIndex) -> Self {
        Self::with_options(index, DEFAULT_TERMINATOR, DEFAULT_MAX_RESULTS)
    }

    pub fn with_options(index: SharedIndex, terminator: char, max_results: usize) -> Self {
        Self {
            index,
            current_prefix: String::new(),
            terminator,
            max_results,
        }
    }

    /// Handles one typed character.
    ///
    /// The terminator commits the buffer as an entry with weight 1 and
    /// returns nothing. Any other character extends the buffer and returns
    /// the best completions for it.
    pub fn feed(&mut self, ch: char) -> Vec<String> {
        if ch == self.terminator {
            self.finalize();
            return Vec::new();
        }

        self.current_prefix.push(ch);
        self.suggest().into_iter().map(|entry| entry.text).collect()
    }

    /// Feeds every character of `text`, returning what the last one produced.
    pub fn feed_str(&mut self, text: &str) -> Vec<String> {
        let mut last = Vec::new();
        for ch in text.chars() {
            last = self.feed(ch);
        }
        last
    }

    /// Ranked matches for the current buffer, with weights. Does not change
    /// the buffer.
    pub fn suggest(&self) -> Vec<ScoredEntry> {
        let index = read(&self.index);
        top_k(index.lookup(&self.current_prefix), self.max_results)
    }

    /// Ranked matches for an arbitrary prefix, leaving the buffer alone.
    pub fn lookup(&self, prefix: &str, limit: usize) -> Vec<ScoredEntry> {
        let index = read(&self.index);
        top_k(index.lookup(prefix), limit)
    }

    pub fn index_stats(&self) -> IndexStats {
        let index = read(&self.index);
        IndexStats {
            entries: index.len(),
            nodes: index.node_count(),
        }
    }

    /// Drops the buffer without recording it. Returns what was discarded.
    pub fn reset(&mut self) -> String {
        std::mem::take(&mut self.current_prefix)
    }

    pub fn current_prefix(&self) -> &str {
        &self.current_prefix
    }

    pub fn terminator(&self) -> char {
        self.terminator
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    fn finalize(&mut self) {
        let entry = std::mem::take(&mut self.current_prefix);
        let mut index = write(&self.index);
        index.insert(&entry, 1);
        debug!(
            entry = %entry,
            weight = index.weight(&entry).unwrap_or(0),
            "finalized entry"
        );
    }
}

/// A prefix index seeded from a batch of weighted entries, together with one
/// session typing into it.
#[derive(Debug, Clone)]
pub struct Autocomplete {
    session: CompletionSession,
}

impl Autocomplete {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        Self::from_index(build_index(entries))
    }

    pub fn from_index(index: PrefixIndex) -> Self {
        Self {
            session: CompletionSession::new(shared(index)),
        }
    }

    pub fn feed(&mut self, ch: char) -> Vec<String> {
        self.session.feed(ch)
    }

    pub fn feed_str(&mut self, text: &str) -> Vec<String> {
        self.session.feed_str(text)
    }

    pub fn session_mut(&mut self) -> &mut CompletionSession {
        &mut self.session
    }

    pub fn index(&self) -> &SharedIndex {
        self.session.index()
    }

    /// Opens another session over the same index.
    pub fn session(&self) -> CompletionSession {
        CompletionSession::with_options(
            self.index().clone(),
            self.session.terminator,
            self.session.max_results,
        )
    }

    /// Ranked matches for an arbitrary prefix, independent of any buffer.
    pub fn lookup(&self, prefix: &str, limit: usize) -> Vec<ScoredEntry> {
        self.session.lookup(prefix, limit)
    }
}

/// Inserts each `(text, weight)` pair in order into a fresh index.
pub fn build_index<I, S>(entries: I) -> PrefixIndex
where
    I: IntoIterator<Item = (S, u64)>,
    S: AsRef<str>,
{
    let mut index = PrefixIndex::new();
    for (text, weight) in entries {
        index.insert(text.as_ref(), weight);
    }
    index
}
