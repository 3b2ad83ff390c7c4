use std::sync::Arc;

use crate::config::Config;
use crate::ranking::cache::ReferenceCache;
use crate::ranking::extract::Extractor;
use crate::ranking::profile::RoleCatalog;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Closed role→keyword catalog, loaded once at startup and shared
    /// read-only across every scoring run.
    pub roles: Arc<RoleCatalog>,
    /// Bounded LRU over on-disk job-description reads.
    pub reference_cache: Arc<ReferenceCache>,
    /// Pluggable extraction backend. Default: `BoundedExtractor`; tests swap
    /// in stubs to drive the pipeline without real documents.
    pub extractor: Arc<dyn Extractor>,
}
