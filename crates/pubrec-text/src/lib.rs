//! pubrec-text
//!
//! Tantivy adapter behind the engine traits: schema construction, corpus
//! build, and ranked free-text search over the canonical corpus. See
//! `index` and `search`; the orchestration layer never touches tantivy
//! directly.

pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::TantivyBackend;
pub use search::{TantivySearcher, MAX_HITS};
