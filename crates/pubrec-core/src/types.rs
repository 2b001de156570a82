//! Domain types shared by the ingestion pipeline and the query layer.

use serde::{Deserialize, Serialize};

/// A `title`/`abstract` value as it arrives in source records.
///
/// Source collections are schema-less: the same field may be a plain
/// string in one record and a list of strings in the next. One rule
/// resolves both shapes: first element, empty string when nothing is
/// there.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn first_or_empty(&self) -> &str {
        match self {
            FieldValue::Scalar(s) => s,
            FieldValue::List(items) => items.first().map(String::as_str).unwrap_or(""),
        }
    }
}

/// An untrusted source record. Only the fields the pipeline reads are
/// modelled; anything else on the line is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<FieldValue>,
    #[serde(default, rename = "abstract")]
    pub abstract_: Option<FieldValue>,
}

/// The normalized record fed to the index engine, serialized as one JSON
/// object per line in the converted corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub id: String,
    pub contents: String,
}

/// Flags forwarded to the engine's build step.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub store_positions: bool,
    pub store_doc_vectors: bool,
    pub store_raw_documents: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            store_positions: true,
            store_doc_vectors: true,
            store_raw_documents: true,
        }
    }
}

/// A single engine result. `score` is engine-specific, higher is better.
#[derive(Debug, Clone)]
pub struct Hit {
    pub id: String,
    pub score: f32,
}

/// Paginated recommendation response.
///
/// `num_found` counts the returned page, not the engine's total match
/// count; callers wanting more results request successive pages.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub page: usize,
    pub rpp: usize,
    pub item_id: String,
    pub itemlist: Vec<String>,
    pub num_found: usize,
}

/// Paginated response for ranking-by-query. The ranker is a stub: the
/// envelope stays well-formed and empty.
#[derive(Debug, Clone, Serialize)]
pub struct RankedList {
    pub page: usize,
    pub rpp: usize,
    pub query: String,
    pub itemlist: Vec<String>,
    pub num_found: usize,
}
