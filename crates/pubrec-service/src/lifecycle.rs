use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use tracing::{info, warn};

use pubrec_core::chunker::{list_jsonl_files, ChunkSplitter};
use pubrec_core::convert::{ConvertStats, RecordNormalizer};
use pubrec_core::error::Error;
use pubrec_core::traits::{SearchBackend, SearchHandle};
use pubrec_core::types::BuildOptions;

use crate::layout::WorkLayout;

/// Pipeline progress, tracked explicitly rather than inferred from which
/// scratch directories happen to exist on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Empty,
    Chunked,
    Converted,
    Indexed,
    Cleaned,
}

/// What one build run did.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildReport {
    pub source_files: usize,
    pub chunk_files: usize,
    pub records_written: usize,
    pub records_skipped: usize,
}

/// Orchestrates split → convert → engine build → publish for one
/// collection. After a successful run only the live index directory and
/// the original source files survive; all scratch state is removed.
pub struct IndexLifecycle {
    layout: WorkLayout,
    splitter: ChunkSplitter,
    normalizer: RecordNormalizer,
    backend: Arc<dyn SearchBackend>,
}

impl IndexLifecycle {
    pub fn new(layout: WorkLayout, max_chunk_bytes: usize, backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            layout,
            splitter: ChunkSplitter::new(max_chunk_bytes),
            normalizer: RecordNormalizer::new(),
            backend,
        }
    }

    /// Build (or rebuild) the index for `collection` and return a fresh
    /// query handle. Not re-entrant per collection: both runs would race
    /// on the same scratch directories, so a second concurrent call for
    /// the same name fails fast with `Error::BuildLocked`.
    pub fn build(&self, collection: &str) -> Result<(Box<dyn SearchHandle>, BuildReport)> {
        fs::create_dir_all(self.layout.index_root()).with_context(|| {
            format!(
                "cannot create index root {}",
                self.layout.index_root().display()
            )
        })?;

        let lock_path = self.layout.lock_file(collection);
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("cannot create lock file {}", lock_path.display()))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(Error::BuildLocked(collection.to_string()).into());
        }

        let result = self.build_locked(collection);
        if result.is_err() {
            // Scratch state is a disk-space liability once the run is
            // known to have failed; remove what we can.
            self.cleanup_scratch(collection);
        }
        drop(lock_file);
        let _ = fs::remove_file(&lock_path);
        result
    }

    fn build_locked(&self, collection: &str) -> Result<(Box<dyn SearchHandle>, BuildReport)> {
        let mut stage = BuildStage::Empty;
        info!(collection, ?stage, "index build starting");

        let chunk_dir = self.layout.chunk_dir(collection);
        let convert_dir = self.layout.convert_dir(collection);
        let staging_dir = self.layout.staging_dir(collection);
        for dir in [&chunk_dir, &convert_dir, &staging_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("cannot create working directory {}", dir.display()))?;
        }

        let source_dir = self.layout.source_dir(collection);
        if !source_dir.is_dir() {
            return Err(Error::NotFound(format!(
                "collection source directory {}",
                source_dir.display()
            ))
            .into());
        }
        let source_files = list_jsonl_files(&source_dir);
        if source_files.is_empty() {
            warn!(collection, dir = %source_dir.display(), "no .jsonl files found");
        }
        let mut report = BuildReport {
            source_files: source_files.len(),
            ..BuildReport::default()
        };

        for file in &source_files {
            let chunks = self.splitter.split(file, &chunk_dir)?;
            report.chunk_files += chunks.len();
        }
        stage = BuildStage::Chunked;
        info!(collection, chunks = report.chunk_files, ?stage, "split complete");

        let mut stats = ConvertStats::default();
        for chunk in list_jsonl_files(&chunk_dir) {
            stats.absorb(self.normalizer.convert_file(&chunk, &convert_dir)?);
        }
        report.records_written = stats.written;
        report.records_skipped = stats.skipped;
        // Chunks are consumed exactly once; per-record skips above do not
        // block scratch removal.
        remove_dir_best_effort(&chunk_dir);
        stage = BuildStage::Converted;
        info!(
            collection,
            written = stats.written,
            skipped = stats.skipped,
            ?stage,
            "conversion complete"
        );

        self.backend
            .build(&convert_dir, &staging_dir, &BuildOptions::default())?;
        self.publish(collection, &staging_dir)?;
        stage = BuildStage::Indexed;
        info!(collection, ?stage, "index published");

        remove_dir_best_effort(&convert_dir);
        stage = BuildStage::Cleaned;
        info!(collection, ?stage, "scratch removed");

        let handle = self.backend.open(&self.layout.index_dir(collection))?;
        Ok((handle, report))
    }

    /// Swap the freshly built staging index into the live location.
    /// Readers only ever observe the old complete index or the new one,
    /// never a half-written directory.
    fn publish(&self, collection: &str, staging_dir: &Path) -> Result<()> {
        let live_dir = self.layout.index_dir(collection);
        let backup_dir = self.layout.backup_dir(collection);
        if backup_dir.exists() {
            fs::remove_dir_all(&backup_dir)
                .with_context(|| format!("cannot clear stale backup {}", backup_dir.display()))?;
        }
        if live_dir.exists() {
            fs::rename(&live_dir, &backup_dir).with_context(|| {
                format!("cannot set aside previous index {}", live_dir.display())
            })?;
        }
        if let Err(err) = fs::rename(staging_dir, &live_dir) {
            // Put the previous index back before failing.
            if backup_dir.exists() {
                let _ = fs::rename(&backup_dir, &live_dir);
            }
            return Err(err).with_context(|| format!("cannot publish index for '{}'", collection));
        }
        remove_dir_best_effort(&backup_dir);
        Ok(())
    }

    /// Open a handle over a previously published index without
    /// rebuilding anything.
    pub fn open_existing(&self, collection: &str) -> Result<Box<dyn SearchHandle>> {
        let live_dir = self.layout.index_dir(collection);
        if !live_dir.is_dir() {
            return Err(Error::NotFound(format!("no index for collection '{}'", collection)).into());
        }
        self.backend.open(&live_dir)
    }

    fn cleanup_scratch(&self, collection: &str) {
        remove_dir_best_effort(&self.layout.chunk_dir(collection));
        remove_dir_best_effort(&self.layout.convert_dir(collection));
        remove_dir_best_effort(&self.layout.staging_dir(collection));
    }
}

fn remove_dir_best_effort(dir: &Path) {
    if !dir.exists() {
        return;
    }
    if let Err(err) = fs::remove_dir_all(dir) {
        warn!(dir = %dir.display(), %err, "could not remove scratch directory");
    }
}
