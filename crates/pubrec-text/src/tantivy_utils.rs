use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

use pubrec_core::types::BuildOptions;

pub fn build_schema(options: &BuildOptions) -> Schema {
	let mut schema_builder = Schema::builder();
	let _id_field = schema_builder.add_text_field("id", STRING | STORED);
	let record_option = if options.store_positions { IndexRecordOption::WithFreqsAndPositions } else { IndexRecordOption::WithFreqs };
	let contents_indexing = TextFieldIndexing::default().set_tokenizer("contents_en").set_index_option(record_option);
	let mut contents_options = TextOptions::default().set_indexing_options(contents_indexing);
	if options.store_raw_documents { contents_options = contents_options.set_stored(); }
	if options.store_doc_vectors { contents_options = contents_options.set_fast(Some("raw")); }
	let _contents_field = schema_builder.add_text_field("contents", contents_options);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let stop_words = vec![
		"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register("contents_en", tokenizer);
}
