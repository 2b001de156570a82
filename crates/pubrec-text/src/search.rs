use anyhow::Result;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{Index, TantivyDocument};

use pubrec_core::traits::SearchHandle;
use pubrec_core::types::Hit;

use crate::tantivy_utils::register_tokenizer;

/// Result pool fetched per query. Paging slices into this fixed pool, so
/// successive pages of the same query stay consistent with one another
/// on a stable index.
pub const MAX_HITS: usize = 1000;

pub struct TantivySearcher {
	index: Index,
	searcher: tantivy::Searcher,
	id_field: tantivy::schema::Field,
	contents_field: tantivy::schema::Field,
}

impl TantivySearcher {
	pub fn open(index_dir: &Path) -> Result<Self> {
		let index = Index::open_in_dir(index_dir)?;
		register_tokenizer(&index);
		let reader = index.reader()?; let searcher = reader.searcher();
		let schema = index.schema();
		let id_field = schema.get_field("id")?;
		let contents_field = schema.get_field("contents")?;
		Ok(Self { index, searcher, id_field, contents_field })
	}
}

impl SearchHandle for TantivySearcher {
	fn search(&self, query_text: &str) -> Result<Vec<Hit>> {
		let query_parser = QueryParser::for_index(&self.index, vec![self.contents_field]);
		let query = query_parser.parse_query(query_text)?;
		let top_docs = self.searcher.search(&query, &TopDocs::with_limit(MAX_HITS))?;
		let mut hits = Vec::new();
		for (score, doc_address) in top_docs {
			let doc: TantivyDocument = self.searcher.doc(doc_address)?;
			let id = doc.get_first(self.id_field).and_then(|v| v.as_str()).unwrap_or("").to_string();
			hits.push(Hit { id, score });
		}
		Ok(hits)
	}
}
