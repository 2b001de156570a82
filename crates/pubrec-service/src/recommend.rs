use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use tracing::info;

use pubrec_core::catalog::TitleCatalog;
use pubrec_core::error::Error;
use pubrec_core::traits::{SearchBackend, SearchHandle};
use pubrec_core::types::{RankedList, Recommendation};

use crate::layout::WorkLayout;
use crate::lifecycle::{BuildReport, IndexLifecycle};

struct SearchState {
    catalog: TitleCatalog,
    handle: Box<dyn SearchHandle>,
}

/// Process-root service owning the pipeline, the title catalog, and the
/// engine handle. Catalog and handle swap together under one lock, so a
/// reader never observes a new index paired with an old catalog or vice
/// versa.
pub struct RecommenderService {
    layout: WorkLayout,
    lifecycle: IndexLifecycle,
    state: RwLock<Option<SearchState>>,
}

impl RecommenderService {
    pub fn new(
        layout: WorkLayout,
        max_chunk_bytes: usize,
        backend: Arc<dyn SearchBackend>,
    ) -> Self {
        let lifecycle = IndexLifecycle::new(layout.clone(), max_chunk_bytes, backend);
        Self {
            layout,
            lifecycle,
            state: RwLock::new(None),
        }
    }

    /// Rebuild the index for `collection`, reload the title catalog, and
    /// swap both into service.
    pub fn index(&self, collection: &str) -> Result<BuildReport> {
        let (handle, report) = self.lifecycle.build(collection)?;
        let catalog = TitleCatalog::load(&self.layout.publication_file(collection))?;
        info!(collection, titles = catalog.len(), "catalog loaded");
        self.swap(Some(SearchState { catalog, handle }))?;
        Ok(report)
    }

    /// Attach to a previously built index without rebuilding it.
    pub fn load(&self, collection: &str) -> Result<()> {
        let handle = self.lifecycle.open_existing(collection)?;
        let catalog = TitleCatalog::load(&self.layout.publication_file(collection))?;
        self.swap(Some(SearchState { catalog, handle }))
    }

    /// Drop the loaded catalog and handle; subsequent `recommend` calls
    /// fail with `Error::NotReady` until the next `index`/`load`.
    pub fn teardown(&self) -> Result<()> {
        self.swap(None)
    }

    fn swap(&self, next: Option<SearchState>) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| anyhow!("service state lock poisoned"))?;
        *guard = next;
        Ok(())
    }

    /// Page through "documents similar to `item_id`", using the item's
    /// title as the proxy query.
    ///
    /// Unknown ids and ids without a usable title yield a well-formed
    /// empty envelope without touching the engine. The item's own id is
    /// not filtered from its results, and `num_found` counts the
    /// returned page only.
    pub fn recommend(&self, item_id: &str, page: usize, rpp: usize) -> Result<Recommendation> {
        if rpp == 0 {
            return Err(Error::InvalidArgument("rpp must be positive".to_string()).into());
        }
        let guard = self
            .state
            .read()
            .map_err(|_| anyhow!("service state lock poisoned"))?;
        let state = guard.as_ref().ok_or(Error::NotReady)?;

        let mut itemlist = Vec::new();
        if let Some(title) = state.catalog.title(item_id) {
            let hits = state.handle.search(title)?;
            itemlist = hits
                .into_iter()
                .skip(page.saturating_mul(rpp))
                .take(rpp)
                .map(|hit| hit.id)
                .collect();
        }
        Ok(Recommendation {
            page,
            rpp,
            item_id: item_id.to_string(),
            num_found: itemlist.len(),
            itemlist,
        })
    }

    /// Ranking-by-query surface. Unimplemented: always the well-formed
    /// empty envelope, never an error, loaded index or not.
    pub fn rank(&self, query: &str, page: usize, rpp: usize) -> RankedList {
        RankedList {
            page,
            rpp,
            query: query.to_string(),
            itemlist: Vec::new(),
            num_found: 0,
        }
    }
}
