use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::handlers::access::AccessGate;
use crate::photos::{
    ImageResolver, PhotoProvider, QueryCatalog, RecentImages, ResolverSettings,
};

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub catalog: Arc<QueryCatalog>,
    pub resolver: Arc<ImageResolver>,
    pub query_limit: usize,
}

impl AppState {
    pub fn new(config: &Config, provider: Arc<dyn PhotoProvider>) -> Self {
        let recent = Arc::new(Mutex::new(RecentImages::new(config.recent_cache_limit)));
        let resolver = ImageResolver::new(
            provider,
            recent,
            ResolverSettings {
                attempts_per_query: config.attempts_per_query,
            },
        );
        AppState {
            gate: Arc::new(AccessGate::new(&config.privileged_username)),
            catalog: Arc::new(QueryCatalog::new(config.photo_queries.clone())),
            resolver: Arc::new(resolver),
            query_limit: config.query_limit,
        }
    }

    /// Terms for one request, shuffled and cut to the configured limit.
    pub fn pick_terms(&self) -> Vec<String> {
        let mut rng = rand::thread_rng();
        self.catalog.pick(self.query_limit, &mut rng)
    }
}
