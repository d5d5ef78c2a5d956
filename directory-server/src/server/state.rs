// App state for Axum server
use std::sync::Arc;

use directory_indexer::{Dependencies, IndexMirrorBuilder, IngestService};
use directory_shared::VerticalConfig;
use search_index_repository::SearchIndexService;

#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub search: Arc<SearchIndexService>,
    pub mirror: Arc<IndexMirrorBuilder>,
    pub vertical: Arc<VerticalConfig>,
}

impl AppState {
    pub fn from_dependencies(deps: &Dependencies) -> Self {
        Self {
            ingest: deps.ingest.clone(),
            search: deps.search.clone(),
            mirror: deps.mirror.clone(),
            vertical: deps.vertical.clone(),
        }
    }
}
