use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::QueryParams;
use crate::nfz::NfzClient;
use crate::pipeline::{self, FetchOutcome, ProgressSink};

/// Memoizing wrapper around the pipeline. Identical parameter triples return
/// the cached outcome without re-issuing remote calls; there is no
/// invalidation, the cache lives for the process lifetime.
pub struct CachedPipeline<C: NfzClient> {
    client: C,
    cache: Mutex<HashMap<QueryParams, FetchOutcome>>,
}

impl<C: NfzClient> CachedPipeline<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn fetch(&self, params: &QueryParams, sink: &dyn ProgressSink) -> FetchOutcome {
        if let Ok(cache) = self.cache.lock() {
            if let Some(outcome) = cache.get(params) {
                tracing::debug!(term = %params.term, "pipeline.cache_hit");
                return outcome.clone();
            }
        }

        let outcome = pipeline::run_pipeline(&self.client, params, sink);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(params.clone(), outcome.clone());
        }
        outcome
    }
}
