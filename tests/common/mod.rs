//! Shared test doubles for orchestrator tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use finsearch::backend::RawHit;
use finsearch::{
    MockEmbedding, OrchestratorSettings, Result, SearchBackend, SearchOrchestrator, SearchRequest,
    SearchResponse,
};

type Responder = dyn Fn(&SearchRequest, usize) -> Result<SearchResponse> + Send + Sync;

/// Backend whose answers come from a closure; records every request
pub struct ScriptedBackend {
    responder: Box<Responder>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(Vec<String>, SearchRequest)>>,
}

impl ScriptedBackend {
    /// `responder` receives the request and the 1-based call number
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&SearchRequest, usize) -> Result<SearchResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Lexical requests get `lexical`, kNN requests get `knn`
    pub fn by_kind(lexical: Vec<RawHit>, knn: Vec<RawHit>) -> Arc<Self> {
        Self::new(move |request, _| {
            let hits = if request.is_lexical() {
                lexical.clone()
            } else {
                knn.clone()
            };
            Ok(SearchResponse::from_hits(hits))
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(Vec<String>, SearchRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn search(&self, indices: &[String], request: &SearchRequest) -> Result<SearchResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests
            .lock()
            .unwrap()
            .push((indices.to_vec(), request.clone()));
        (self.responder)(request, call)
    }
}

pub fn hit(id: &str, score: f64, index: &str) -> RawHit {
    serde_json::from_value(json!({
        "_id": id,
        "_score": score,
        "_index": index,
        "_source": { "text": format!("text of {}", id), "ticker": "AAPL" }
    }))
    .unwrap()
}

pub fn es_hit_json(id: &str, score: f64, index: &str) -> Value {
    json!({
        "_id": id,
        "_score": score,
        "_index": index,
        "_source": { "text": format!("text of {}", id), "ticker": "AAPL" }
    })
}

/// Settings with millisecond backoff so retry tests stay fast
pub fn fast_settings(max_retries: u32, failure_threshold: u32) -> OrchestratorSettings {
    let mut settings = OrchestratorSettings::default();
    settings.retry.max_retries = max_retries;
    settings.retry.base_delay = Duration::from_millis(1);
    settings.retry.max_delay = Duration::from_millis(5);
    settings.breaker.failure_threshold = failure_threshold;
    settings
}

pub fn orchestrator(
    backend: Arc<dyn SearchBackend>,
    settings: OrchestratorSettings,
) -> SearchOrchestrator {
    SearchOrchestrator::new(backend, Arc::new(MockEmbedding), settings).unwrap()
}
