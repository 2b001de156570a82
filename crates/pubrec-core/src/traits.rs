use std::path::Path;

use crate::types::{BuildOptions, Hit};

/// Build side of the external index engine.
pub trait SearchBackend: Send + Sync {
    /// Build a fresh index under `index_dir` from the canonical corpus in
    /// `corpus_dir`. Any failure fails the whole pipeline run.
    fn build(&self, corpus_dir: &Path, index_dir: &Path, options: &BuildOptions)
        -> anyhow::Result<()>;

    /// Open a query handle over a previously built index.
    fn open(&self, index_dir: &Path) -> anyhow::Result<Box<dyn SearchHandle>>;
}

/// Read side of the engine: ranked free-text search. Handles are
/// read-only and safe to share across concurrent callers.
pub trait SearchHandle: Send + Sync {
    fn search(&self, query_text: &str) -> anyhow::Result<Vec<Hit>>;
}
