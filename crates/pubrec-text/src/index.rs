use anyhow::{Context, Result};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tantivy::{doc, Index};
use tracing::info;

use pubrec_core::traits::{SearchBackend, SearchHandle};
use pubrec_core::types::{BuildOptions, CanonicalRecord};

use crate::search::TantivySearcher;
use crate::tantivy_utils::{build_schema, register_tokenizer};

/// The external index engine's build side. Rebuilds the target directory
/// from scratch on every call; the corpus is the canonical line-delimited
/// `{id, contents}` format.
#[derive(Debug, Default)]
pub struct TantivyBackend;

impl TantivyBackend {
	pub fn new() -> Self { Self }
}

impl SearchBackend for TantivyBackend {
	fn build(&self, corpus_dir: &Path, index_dir: &Path, options: &BuildOptions) -> Result<()> {
		if index_dir.exists() { fs::remove_dir_all(index_dir)?; }
		fs::create_dir_all(index_dir)?;
		let schema = build_schema(options);
		let index = Index::create_in_dir(index_dir, schema.clone())?;
		register_tokenizer(&index);
		let id_field = schema.get_field("id")?;
		let contents_field = schema.get_field("contents")?;
		let mut index_writer = index.writer(50_000_000)?;
		let mut doc_count = 0usize;
		for corpus_file in list_corpus_files(corpus_dir) {
			let reader = BufReader::new(fs::File::open(&corpus_file)
				.with_context(|| format!("cannot read corpus file {}", corpus_file.display()))?);
			for line in reader.lines() {
				let line = line?;
				if line.trim().is_empty() { continue; }
				let record: CanonicalRecord = serde_json::from_str(&line)
					.with_context(|| format!("corrupt canonical record in {}", corpus_file.display()))?;
				index_writer.add_document(doc!(
					id_field => record.id,
					contents_field => record.contents
				))?;
				doc_count += 1;
			}
		}
		index_writer.commit()?;
		info!(docs = doc_count, index = %index_dir.display(), "engine build committed");
		Ok(())
	}

	fn open(&self, index_dir: &Path) -> Result<Box<dyn SearchHandle>> {
		Ok(Box::new(TantivySearcher::open(index_dir)?))
	}
}

fn list_corpus_files(corpus_dir: &Path) -> Vec<PathBuf> {
	let mut files = Vec::new();
	for entry in walkdir::WalkDir::new(corpus_dir).max_depth(1).into_iter().filter_map(|e| e.ok()) {
		if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "jsonl") {
			files.push(entry.path().to_path_buf());
		}
	}
	files.sort(); files
}
