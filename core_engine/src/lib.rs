//! Weighted prefix completion: a character trie that aggregates entry
//! weights at every node, sessions that learn entries as they are typed,
//! and a small id pool used to number sessions.

pub mod completion;
pub mod pool;

pub use completion::{
    build_index, shared, top_k, Autocomplete, CompletionSession, IndexStats, PrefixIndex,
    ScoredEntry, SharedIndex, DEFAULT_MAX_RESULTS, DEFAULT_TERMINATOR,
};
pub use pool::IdPool;
