//! Offline state for handler tests: memory index, hash embedder, canned generator.

use std::sync::Arc;

use contextor::{AnswerGenerator, Contextor, ContextorConfig, ContextorError, EmbedderKind};
use futures::future::BoxFuture;
use rag_store::{HashEmbedder, RagStore, VectorBackend};
use serde_json::{Value, json};

use crate::app_state::AppState;

struct Canned;

impl AnswerGenerator for Canned {
    fn model_id(&self) -> &str {
        "canned:test"
    }

    fn generate<'a>(
        &'a self,
        _system: &'a str,
        _prompt: &'a str,
    ) -> BoxFuture<'a, Result<String, ContextorError>> {
        Box::pin(async { Ok("grounded answer".to_string()) })
    }
}

pub(crate) fn state() -> Arc<AppState> {
    let mut cfg = ContextorConfig {
        backend: VectorBackend::Memory,
        embedder: EmbedderKind::Hash,
        ..ContextorConfig::default()
    };
    cfg.rag.embedding_dim = 64;
    let store = RagStore::open(
        cfg.rag.clone(),
        cfg.backend,
        Arc::new(HashEmbedder::new(cfg.rag.embedding_dim)),
    )
    .unwrap();
    let contextor = Contextor::new(cfg, store, Arc::new(Canned)).unwrap();
    Arc::new(AppState::new(contextor))
}

pub(crate) fn row(id: &str) -> Value {
    json!({
        "record_id": id,
        "TirePressure_Front": 22.0,
        "TirePressure_Rear": 21.8,
        "TireSize_Front": 305,
        "TireSize_Rear": 305,
        "DriverWeight_kg": 70.0,
        "CoolantTemperature_C": 87.3,
        "PES": 0.000000903
    })
}
