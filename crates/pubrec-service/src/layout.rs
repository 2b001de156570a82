use std::path::{Path, PathBuf};

/// Fixed roles in the working filesystem layout.
///
/// Source collections live under `source_root/<collection>/*.jsonl`, with
/// exactly one `publication.jsonl` per collection. Everything the
/// pipeline writes lives under `index_root`; scratch paths are scoped per
/// collection so distinct collections never share them.
#[derive(Debug, Clone)]
pub struct WorkLayout {
    source_root: PathBuf,
    index_root: PathBuf,
}

impl WorkLayout {
    pub fn new(source_root: impl Into<PathBuf>, index_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            index_root: index_root.into(),
        }
    }

    pub fn index_root(&self) -> &Path {
        &self.index_root
    }

    pub fn source_dir(&self, collection: &str) -> PathBuf {
        self.source_root.join(collection)
    }

    pub fn publication_file(&self, collection: &str) -> PathBuf {
        self.source_dir(collection).join("publication.jsonl")
    }

    /// The live, readable index for a collection.
    pub fn index_dir(&self, collection: &str) -> PathBuf {
        self.index_root.join(collection)
    }

    /// Where a new index is built before being published.
    pub fn staging_dir(&self, collection: &str) -> PathBuf {
        self.index_root.join(format!("{}-staging", collection))
    }

    /// Where the previous live index is set aside during publish.
    pub fn backup_dir(&self, collection: &str) -> PathBuf {
        self.index_root.join(format!("{}-previous", collection))
    }

    pub fn chunk_dir(&self, collection: &str) -> PathBuf {
        self.index_root.join(format!("{}-chunks", collection))
    }

    pub fn convert_dir(&self, collection: &str) -> PathBuf {
        self.index_root.join(format!("{}-convert", collection))
    }

    pub fn lock_file(&self, collection: &str) -> PathBuf {
        self.index_root.join(format!("{}.lock", collection))
    }
}
