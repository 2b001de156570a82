use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::RecordError;
use crate::types::{CanonicalRecord, FieldValue, RawRecord};

/// Counters for one conversion pass. Skipped records are logged and
/// counted, never fatal: one bad record must not abort ingestion of the
/// millions of good ones around it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertStats {
    pub written: usize,
    pub skipped: usize,
}

impl ConvertStats {
    pub fn absorb(&mut self, other: ConvertStats) {
        self.written += other.written;
        self.skipped += other.skipped;
    }
}

/// Rewrites raw chunk records into the canonical `{id, contents}` corpus
/// format, one output file per chunk.
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer;

impl RecordNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Convert one chunk file, writing a same-named file under `out_dir`.
    /// Order-preserving and incremental; nothing is buffered whole.
    pub fn convert_file(&self, chunk_file: &Path, out_dir: &Path) -> Result<ConvertStats> {
        let file_name = chunk_file
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("chunk has no file name: {}", chunk_file.display()))?;
        let out_path: PathBuf = out_dir.join(file_name);

        let reader = BufReader::new(
            File::open(chunk_file)
                .with_context(|| format!("cannot read chunk {}", chunk_file.display()))?,
        );
        let mut writer = BufWriter::new(
            File::create(&out_path)
                .with_context(|| format!("cannot create {}", out_path.display()))?,
        );

        let mut stats = ConvertStats::default();
        for (line_no, line) in reader.lines().enumerate() {
            let line =
                line.with_context(|| format!("read failed on {}", chunk_file.display()))?;
            match normalize_line(&line) {
                Ok(record) => {
                    serde_json::to_writer(&mut writer, &record)?;
                    writer.write_all(b"\n")?;
                    stats.written += 1;
                }
                Err(err) => {
                    warn!(
                        chunk = %chunk_file.display(),
                        line = line_no + 1,
                        %err,
                        "skipping malformed record"
                    );
                    stats.skipped += 1;
                }
            }
        }
        writer.flush()?;
        Ok(stats)
    }
}

/// Normalize one raw line into a canonical record.
///
/// `title` and `abstract` resolve by the first-element rule and join with
/// exactly one space even when empty, so a record carrying neither field
/// yields `" "`. Records without an id never reach the engine.
pub fn normalize_line(line: &str) -> std::result::Result<CanonicalRecord, RecordError> {
    let raw: RawRecord = serde_json::from_str(line)?;
    let id = raw.id.ok_or(RecordError::MissingId)?;
    let title = raw.title.as_ref().map(FieldValue::first_or_empty).unwrap_or("");
    let abstract_ = raw
        .abstract_
        .as_ref()
        .map(FieldValue::first_or_empty)
        .unwrap_or("");
    Ok(CanonicalRecord {
        id,
        contents: format!("{} {}", title, abstract_),
    })
}
