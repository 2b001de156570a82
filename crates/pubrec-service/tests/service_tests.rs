use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use pubrec_core::error::Error;
use pubrec_core::traits::{SearchBackend, SearchHandle};
use pubrec_core::types::{BuildOptions, Hit};
use pubrec_service::{RecommenderService, WorkLayout};
use pubrec_text::TantivyBackend;

/// Engine double: records how often search is invoked and replays a
/// fixed ranked id list regardless of the query.
struct StubBackend {
    results: Vec<String>,
    searches: Arc<AtomicUsize>,
}

impl SearchBackend for StubBackend {
    fn build(
        &self,
        _corpus_dir: &Path,
        index_dir: &Path,
        _options: &BuildOptions,
    ) -> anyhow::Result<()> {
        fs::write(index_dir.join("stub.idx"), b"stub")?;
        Ok(())
    }

    fn open(&self, _index_dir: &Path) -> anyhow::Result<Box<dyn SearchHandle>> {
        Ok(Box::new(StubHandle {
            results: self.results.clone(),
            searches: Arc::clone(&self.searches),
        }))
    }
}

struct StubHandle {
    results: Vec<String>,
    searches: Arc<AtomicUsize>,
}

impl SearchHandle for StubHandle {
    fn search(&self, _query_text: &str) -> anyhow::Result<Vec<Hit>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .results
            .iter()
            .enumerate()
            .map(|(i, id)| Hit {
                id: id.clone(),
                score: 1.0 / (i as f32 + 1.0),
            })
            .collect())
    }
}

/// Engine double whose build step always fails.
struct FailingBackend;

impl SearchBackend for FailingBackend {
    fn build(
        &self,
        _corpus_dir: &Path,
        _index_dir: &Path,
        _options: &BuildOptions,
    ) -> anyhow::Result<()> {
        anyhow::bail!("engine exploded")
    }

    fn open(&self, _index_dir: &Path) -> anyhow::Result<Box<dyn SearchHandle>> {
        anyhow::bail!("engine exploded")
    }
}

fn write_collection(layout: &WorkLayout, collection: &str, publication_lines: &[&str]) {
    let dir = layout.source_dir(collection);
    fs::create_dir_all(&dir).unwrap();
    let mut body = publication_lines.join("\n");
    body.push('\n');
    fs::write(dir.join("publication.jsonl"), body).unwrap();
}

fn layout_in(tmp: &TempDir) -> WorkLayout {
    WorkLayout::new(tmp.path().join("collections"), tmp.path().join("index"))
}

fn stub_service(
    layout: &WorkLayout,
    results: &[&str],
) -> (RecommenderService, Arc<AtomicUsize>) {
    let searches = Arc::new(AtomicUsize::new(0));
    let backend = Arc::new(StubBackend {
        results: results.iter().map(|s| s.to_string()).collect(),
        searches: Arc::clone(&searches),
    });
    (
        RecommenderService::new(layout.clone(), 1_000_000, backend),
        searches,
    )
}

fn assert_no_scratch(layout: &WorkLayout, collection: &str) {
    assert!(!layout.chunk_dir(collection).exists(), "chunk scratch left behind");
    assert!(!layout.convert_dir(collection).exists(), "convert scratch left behind");
    assert!(!layout.staging_dir(collection).exists(), "staging dir left behind");
    assert!(!layout.backup_dir(collection).exists(), "backup dir left behind");
    assert!(!layout.lock_file(collection).exists(), "lock file left behind");
}

#[test]
fn full_roundtrip_recommends_own_document() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(
        &layout,
        "documents",
        &[
            r#"{"id":"d1","title":"neural networks","abstract":"a survey"}"#,
            r#"{"id":"d2","title":"growing tomatoes","abstract":"a garden guide"}"#,
        ],
    );

    let service = RecommenderService::new(layout.clone(), 1_000_000, Arc::new(TantivyBackend::new()));
    let report = service.index("documents").unwrap();
    assert_eq!(report.source_files, 1);
    assert_eq!(report.records_written, 2);
    assert_eq!(report.records_skipped, 0);

    let result = service.recommend("d1", 0, 5).unwrap();
    assert!(
        result.itemlist.contains(&"d1".to_string()),
        "a document is always at least a match for its own exact title"
    );
    assert!(!result.itemlist.contains(&"d2".to_string()));
    assert_eq!(result.num_found, result.itemlist.len());
    assert_eq!(result.item_id, "d1");
    assert_eq!(result.page, 0);
    assert_eq!(result.rpp, 5);
}

#[test]
fn reindex_is_equivalent_and_leaves_no_scratch() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(
        &layout,
        "documents",
        &[
            r#"{"id":"d1","title":"neural networks","abstract":"a survey"}"#,
            r#"{"id":"d2","title":"neural computation","abstract":"related work"}"#,
        ],
    );

    let service = RecommenderService::new(layout.clone(), 1_000_000, Arc::new(TantivyBackend::new()));
    service.index("documents").unwrap();
    assert_no_scratch(&layout, "documents");
    let first = service.recommend("d1", 0, 10).unwrap();

    service.index("documents").unwrap();
    assert_no_scratch(&layout, "documents");
    let second = service.recommend("d1", 0, 10).unwrap();

    assert_eq!(first.itemlist, second.itemlist);
    assert!(layout.index_dir("documents").is_dir());
}

#[test]
fn unknown_id_yields_empty_envelope_without_search() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(&layout, "documents", &[r#"{"id":"d1","title":"known"}"#]);

    let (service, searches) = stub_service(&layout, &["d1"]);
    service.index("documents").unwrap();

    let result = service.recommend("does-not-exist", 0, 10).unwrap();
    assert!(result.itemlist.is_empty());
    assert_eq!(result.num_found, 0);
    assert_eq!(result.page, 0);
    assert_eq!(result.rpp, 10);
    assert_eq!(searches.load(Ordering::SeqCst), 0, "no query may be issued");
}

#[test]
fn known_id_without_usable_title_yields_empty_envelope_without_search() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(
        &layout,
        "documents",
        &[
            r#"{"id":"d1","title":null}"#,
            r#"{"id":"d2","title":[]}"#,
        ],
    );

    let (service, searches) = stub_service(&layout, &["d1", "d2"]);
    service.index("documents").unwrap();

    for id in ["d1", "d2"] {
        let result = service.recommend(id, 0, 10).unwrap();
        assert!(result.itemlist.is_empty());
        assert_eq!(result.num_found, 0);
    }
    assert_eq!(searches.load(Ordering::SeqCst), 0);
}

#[test]
fn pages_slice_the_engine_ranking_consistently() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(&layout, "documents", &[r#"{"id":"d1","title":"anything"}"#]);

    let ranked: Vec<String> = (0..25).map(|i| format!("r{}", i)).collect();
    let ranked_refs: Vec<&str> = ranked.iter().map(String::as_str).collect();
    let (service, _) = stub_service(&layout, &ranked_refs);
    service.index("documents").unwrap();

    let mut pages = Vec::new();
    for page in 0..3 {
        let result = service.recommend("d1", page, 10).unwrap();
        assert!(result.itemlist.len() <= 10);
        assert_eq!(result.num_found, result.itemlist.len());
        pages.extend(result.itemlist);
    }
    assert_eq!(pages, ranked, "consecutive pages concatenate to the engine ranking");

    let past_end = service.recommend("d1", 7, 10).unwrap();
    assert!(past_end.itemlist.is_empty());
    assert_eq!(past_end.num_found, 0);
}

#[test]
fn own_id_is_not_filtered_from_results() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(&layout, "documents", &[r#"{"id":"d1","title":"self match"}"#]);

    let (service, _) = stub_service(&layout, &["d1", "d9"]);
    service.index("documents").unwrap();

    let result = service.recommend("d1", 0, 10).unwrap();
    assert_eq!(result.itemlist, vec!["d1".to_string(), "d9".to_string()]);
}

#[test]
fn rank_is_an_empty_envelope_before_and_after_indexing() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(&layout, "documents", &[r#"{"id":"d1","title":"t"}"#]);

    let (service, _) = stub_service(&layout, &["d1"]);

    let before = service.rank("open source search", 2, 7);
    assert_eq!(before.page, 2);
    assert_eq!(before.rpp, 7);
    assert_eq!(before.query, "open source search");
    assert!(before.itemlist.is_empty());
    assert_eq!(before.num_found, 0);

    service.index("documents").unwrap();
    let after = service.rank("open source search", 0, 10);
    assert!(after.itemlist.is_empty());
    assert_eq!(after.num_found, 0);
}

#[test]
fn recommend_before_index_is_not_ready() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    let (service, _) = stub_service(&layout, &[]);

    let err = service.recommend("d1", 0, 10).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotReady)));
}

#[test]
fn zero_rpp_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(&layout, "documents", &[r#"{"id":"d1","title":"t"}"#]);
    let (service, _) = stub_service(&layout, &["d1"]);
    service.index("documents").unwrap();

    let err = service.recommend("d1", 0, 0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::InvalidArgument(_))
    ));
}

#[test]
fn teardown_clears_loaded_state() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(&layout, "documents", &[r#"{"id":"d1","title":"t"}"#]);
    let (service, _) = stub_service(&layout, &["d1"]);
    service.index("documents").unwrap();
    assert!(service.recommend("d1", 0, 10).is_ok());

    service.teardown().unwrap();
    let err = service.recommend("d1", 0, 10).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotReady)));
}

#[test]
fn concurrent_build_for_same_collection_is_locked_out() {
    use fs4::fs_std::FileExt;

    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(&layout, "documents", &[r#"{"id":"d1","title":"t"}"#]);
    fs::create_dir_all(layout.index_root()).unwrap();

    let holder = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(layout.lock_file("documents"))
        .unwrap();
    holder.try_lock_exclusive().unwrap();

    let (service, _) = stub_service(&layout, &["d1"]);
    let err = service.index("documents").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::BuildLocked(_))
    ));
}

#[test]
fn per_record_failures_are_counted_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(&layout, "documents", &[r#"{"id":"d1","title":"good"}"#]);
    let extra = layout.source_dir("documents").join("docs.jsonl");
    fs::write(
        &extra,
        concat!(
            "{\"id\":\"d2\",\"title\":\"also good\"}\n",
            "broken json line\n",
            "{\"title\":\"missing id\"}\n",
        ),
    )
    .unwrap();

    let (service, _) = stub_service(&layout, &["d1"]);
    let report = service.index("documents").unwrap();
    assert_eq!(report.source_files, 2);
    assert_eq!(report.records_written, 2);
    assert_eq!(report.records_skipped, 2);
    assert_no_scratch(&layout, "documents");
}

#[test]
fn missing_collection_directory_is_fatal_and_leaves_no_scratch() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    let (service, _) = stub_service(&layout, &[]);

    let err = service.index("nope").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::NotFound(_))
    ));
    assert_no_scratch(&layout, "nope");
}

#[test]
fn failed_engine_build_keeps_previous_index_authoritative() {
    let tmp = TempDir::new().unwrap();
    let layout = layout_in(&tmp);
    write_collection(&layout, "documents", &[r#"{"id":"d1","title":"t"}"#]);

    let (good, _) = stub_service(&layout, &["d1"]);
    good.index("documents").unwrap();
    assert!(layout.index_dir("documents").is_dir());

    let bad = RecommenderService::new(layout.clone(), 1_000_000, Arc::new(FailingBackend));
    assert!(bad.index("documents").is_err());

    // The failed run must clean its scratch and leave the live index alone.
    assert_no_scratch(&layout, "documents");
    assert!(layout.index_dir("documents").is_dir());
    assert!(good.recommend("d1", 0, 10).is_ok());
}
