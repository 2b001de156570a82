use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default chunk ceiling: 100 MB, the size the source collections were
/// tuned for.
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 100_000_000;

/// Splits a line-delimited input file into bounded-size chunk files so no
/// downstream read has to hold more than one chunk in memory.
///
/// The ceiling is soft: a line is never split across chunks, so a single
/// line larger than `max_chunk_bytes` still goes out whole and its chunk
/// exceeds the nominal ceiling.
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    max_chunk_bytes: usize,
}

impl ChunkSplitter {
    pub fn new(max_chunk_bytes: usize) -> Self {
        Self { max_chunk_bytes }
    }

    /// Split `input` into `<stem>_<n>.jsonl` files under `chunk_dir`,
    /// returning the chunk paths in order. Concatenating the chunks
    /// reproduces the input byte for byte.
    pub fn split(&self, input: &Path, chunk_dir: &Path) -> Result<Vec<PathBuf>> {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow::anyhow!("input file has no usable name: {}", input.display()))?
            .to_string();
        let file = File::open(input)
            .with_context(|| format!("cannot read input file {}", input.display()))?;
        let mut reader = BufReader::new(file);

        let mut chunks: Vec<PathBuf> = Vec::new();
        let mut writer: Option<BufWriter<File>> = None;
        let mut chunk_bytes = 0usize;
        let mut line = Vec::new();

        loop {
            line.clear();
            let n = reader
                .read_until(b'\n', &mut line)
                .with_context(|| format!("read failed on {}", input.display()))?;
            if n == 0 {
                break;
            }
            if chunk_bytes > 0 && chunk_bytes + n > self.max_chunk_bytes {
                if let Some(mut full) = writer.take() {
                    full.flush()?;
                }
                chunk_bytes = 0;
            }
            if writer.is_none() {
                let path = chunk_dir.join(format!("{}_{}.jsonl", stem, chunks.len()));
                let file = File::create(&path)
                    .with_context(|| format!("cannot create chunk file {}", path.display()))?;
                chunks.push(path);
                writer = Some(BufWriter::new(file));
            }
            if let Some(w) = writer.as_mut() {
                w.write_all(&line)?;
            }
            chunk_bytes += n;
        }
        if let Some(mut last) = writer.take() {
            last.flush()?;
        }
        Ok(chunks)
    }
}

/// List the `*.jsonl` files directly under `dir`, sorted.
pub fn list_jsonl_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}
