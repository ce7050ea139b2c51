//! RAG orchestrator for telemetry questions.
//!
//! [`Contextor::answer`] sanitizes the question, retrieves the top-K telemetry
//! units from `rag-store`, assembles a bounded context, builds the prompt, calls
//! the generator and returns an [`AnswerRecord`] carrying the used context keys
//! and a PES analysis of the best-matching record. [`Contextor::ingest_rows`] is
//! the write side: rows → documents → embeddings → index.

mod api_types;
mod audit;
mod cfg;
mod context;
mod error;
mod ingest;
mod llm;
pub mod prompt;
mod progress;
mod sanitize;

pub use api_types::{AnswerRecord, AskOptions, QaAnswer};
pub use audit::AuditLog;
pub use cfg::{ContextorConfig, EmbedderKind};
pub use context::{ContextEntry, GroundingContext, assemble};
pub use error::ContextorError;
pub use llm::{AnswerGenerator, LlmGenerator};
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use sanitize::{MAX_QUESTION_CHARS, QuestionSanitizer};

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use chrono::Utc;
use rag_store::{EmbeddingsProvider, HashEmbedder, LlmEmbedder, RagStore};
use telemetry_docs::{DocumentBuilder, TelemetryMetrics, analyze};
use tracing::{debug, info};

use prompt::{DEFAULT_SYSTEM, NO_DATA_MARKER, build_user_prompt};

/// Wires the store, the document builder and the generator.
#[derive(Clone)]
pub struct Contextor {
    cfg: ContextorConfig,
    store: RagStore,
    builder: DocumentBuilder,
    generator: Arc<dyn AnswerGenerator>,
    sanitizer: QuestionSanitizer,
    audit: Option<Arc<AuditLog>>,
    progress: Arc<dyn Progress>,
}

impl Contextor {
    /// # Errors
    /// `Config` when `cfg` is invalid.
    pub fn new(
        cfg: ContextorConfig,
        store: RagStore,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Result<Self, ContextorError> {
        cfg.validate()?;
        let audit = cfg
            .audit_log_path
            .as_ref()
            .map(|p| Arc::new(AuditLog::new(p.clone())));
        Ok(Self {
            builder: DocumentBuilder::new(cfg.granularity),
            sanitizer: QuestionSanitizer::new()?,
            cfg,
            store,
            generator,
            audit,
            progress: Arc::new(NoopProgress),
        })
    }

    /// Configuration from the environment, embedder and generator from `svc`.
    pub fn from_env(svc: Arc<LlmServiceProfiles>) -> Result<Self, ContextorError> {
        let cfg = ContextorConfig::from_env()?;
        let embedder: Arc<dyn EmbeddingsProvider> = match cfg.embedder {
            EmbedderKind::Llm => Arc::new(LlmEmbedder::new(svc.clone(), cfg.rag.embedding_dim)),
            EmbedderKind::Hash => Arc::new(HashEmbedder::new(cfg.rag.embedding_dim)),
        };
        let store = RagStore::open(cfg.rag.clone(), cfg.backend, embedder)?;
        info!(
            backend = %cfg.backend,
            embedder = ?cfg.embedder,
            top_k = cfg.top_k,
            granularity = ?cfg.granularity,
            "contextor ready"
        );
        Self::new(cfg, store, Arc::new(LlmGenerator::new(svc)))
    }

    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &ContextorConfig {
        &self.cfg
    }

    pub fn store(&self) -> &RagStore {
        &self.store
    }

    /// Answers with the configured `k` and relevance floor.
    pub async fn answer(&self, question: &str) -> Result<AnswerRecord, ContextorError> {
        Ok(self.answer_with_opts(question, AskOptions::default()).await?.record)
    }

    /// Answers and returns the context that was given to the model.
    ///
    /// An empty retrieval is not an error: the generator is still called with
    /// [`NO_DATA_MARKER`] in place of context, and the record's `grounding_note`
    /// carries the marker.
    ///
    /// # Errors
    /// - `InvalidQuery` for a question that is empty after sanitizing or `k == 0`
    /// - retrieval failures with their own kind
    /// - `GenerationUnavailable` when the generator fails after retries
    pub async fn answer_with_opts(
        &self,
        question: &str,
        opts: AskOptions,
    ) -> Result<QaAnswer, ContextorError> {
        let question = self.sanitizer.clean(question);
        if question.is_empty() {
            return Err(ContextorError::InvalidQuery(
                "question is empty after sanitizing".into(),
            ));
        }
        let k = opts.top_k.unwrap_or(self.cfg.top_k);
        let min_score = opts.min_score.unwrap_or(self.cfg.min_score);

        self.progress.step("retrieving telemetry");
        let results = self
            .store
            .retrieve(&question, k, min_score, opts.filter.as_ref())
            .await?;

        let advice = results
            .first()
            .and_then(|top| TelemetryMetrics::from_metadata(&top.unit.metadata))
            .map(|m| analyze(&m));

        self.progress.step("assembling context");
        let context = assemble(&results, self.cfg.max_ctx_chars);
        let grounding_note = context.is_empty().then(|| NO_DATA_MARKER.to_string());
        let user_prompt = build_user_prompt(&question, &context);
        debug!(
            k,
            retrieved = results.len(),
            context_chars = context.size,
            prompt_len = user_prompt.len(),
            "prompt built"
        );

        self.progress.step("generating answer");
        let answer = self.generator.generate(DEFAULT_SYSTEM, &user_prompt).await?;

        let record = AnswerRecord {
            question,
            context_keys: context.keys(),
            answer,
            grounding_note,
            advice,
            timestamp: Utc::now(),
        };
        if let Some(audit) = &self.audit {
            audit.record(&record).await;
        }
        self.progress.finish("done");
        info!(
            context = record.context_keys.len(),
            grounded = record.grounding_note.is_none(),
            model = self.generator.model_id(),
            "question answered"
        );
        Ok(QaAnswer { record, context })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::AiLlmError;
    use futures::future::BoxFuture;
    use rag_store::{ErrorKind, MetadataFilter, VectorBackend};
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::time::Duration;

    struct Scripted {
        fail: bool,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                fail: false,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn down() -> Arc<Self> {
            Arc::new(Self {
                fail: true,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl AnswerGenerator for Scripted {
        fn model_id(&self) -> &str {
            "scripted:test"
        }

        fn generate<'a>(
            &'a self,
            _system: &'a str,
            prompt: &'a str,
        ) -> BoxFuture<'a, Result<String, ContextorError>> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(ContextorError::Generation(AiLlmError::RetriesExhausted {
                        op: "generate",
                        attempts: 3,
                        last: Box::new(AiLlmError::Timeout(Duration::from_secs(1))),
                    }))
                } else {
                    Ok("Coolant is at 87.3 °C [lm24-0001#0].".to_string())
                }
            })
        }
    }

    fn row(id: &str, coolant: f64) -> Value {
        json!({
            "record_id": id,
            "session_id": "S1",
            "lap": 3,
            "TirePressure_Front": 22.0,
            "TirePressure_Rear": 21.8,
            "TireSize_Front": 305,
            "TireSize_Rear": 305,
            "DriverWeight_kg": 70.0,
            "CoolantTemperature_C": coolant,
            "PES": 0.000000903
        })
    }

    fn config() -> ContextorConfig {
        let mut cfg = ContextorConfig {
            backend: VectorBackend::Memory,
            embedder: EmbedderKind::Hash,
            ..ContextorConfig::default()
        };
        cfg.rag.embedding_dim = 128;
        cfg
    }

    fn contextor(cfg: ContextorConfig, generator: Arc<Scripted>) -> Contextor {
        let embedder = Arc::new(HashEmbedder::new(cfg.rag.embedding_dim));
        let store = RagStore::open(cfg.rag.clone(), cfg.backend, embedder).unwrap();
        Contextor::new(cfg, store, generator).unwrap()
    }

    #[tokio::test]
    async fn grounded_answer_carries_context_and_advice() {
        let generator = Scripted::ok();
        let ctx = contextor(config(), generator.clone());
        ctx.ingest_rows(&[row("lm24-0001", 87.3)]).await.unwrap();

        let rec = ctx.answer("What is the coolant temperature?").await.unwrap();
        assert_eq!(rec.context_keys, ["lm24-0001#0"]);
        assert_eq!(rec.grounding_note, None);
        let advice = rec.advice.unwrap();
        assert_eq!(advice.suggestions.len(), 4);
        assert!(advice.suggestions[0].contains("optimal at 87.3"));

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("87.3"));
        assert!(prompts[0].contains("lm24-0001#0"));
    }

    #[tokio::test]
    async fn empty_index_still_generates_with_marker() {
        let generator = Scripted::ok();
        let ctx = contextor(config(), generator.clone());

        let rec = ctx.answer("coolant temperature on lap 3").await.unwrap();
        assert!(rec.context_keys.is_empty());
        assert_eq!(rec.grounding_note.as_deref(), Some(NO_DATA_MARKER));
        assert!(rec.advice.is_none());
        assert!(generator.prompts()[0].contains(NO_DATA_MARKER));
    }

    #[tokio::test]
    async fn generation_failure_surfaces_its_kind() {
        let ctx = contextor(config(), Scripted::down());
        ctx.ingest_rows(&[row("lm24-0001", 87.3)]).await.unwrap();
        let err = ctx.answer("coolant").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GenerationUnavailable);
    }

    #[tokio::test]
    async fn unusable_question_is_rejected_before_generation() {
        let generator = Scripted::ok();
        let ctx = contextor(config(), generator.clone());
        let err = ctx.answer("<<<>>>").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuery);

        let opts = AskOptions {
            top_k: Some(0),
            ..AskOptions::default()
        };
        let err = ctx.answer_with_opts("coolant", opts).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidQuery);
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn filter_narrows_retrieval() {
        let ctx = contextor(config(), Scripted::ok());
        ctx.ingest_rows(&[row("cool", 86.0), row("hot", 99.0)])
            .await
            .unwrap();

        let opts = AskOptions {
            filter: Some(MetadataFilter::default().range(
                "CoolantTemperature_C",
                Some(95.0),
                None,
            )),
            ..AskOptions::default()
        };
        let qa = ctx
            .answer_with_opts("coolant temperature", opts)
            .await
            .unwrap();
        assert_eq!(qa.record.context_keys, ["hot#0"]);
        assert!(qa.record.advice.unwrap().suggestions[0].contains("too high"));
        assert_eq!(qa.context.entries[0].record_id, "hot");
    }

    #[tokio::test]
    async fn answers_are_audited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.jsonl");
        let cfg = ContextorConfig {
            audit_log_path: Some(path.clone()),
            ..config()
        };
        let ctx = contextor(cfg, Scripted::ok());
        ctx.ingest_rows(&[row("lm24-0001", 87.3)]).await.unwrap();
        ctx.answer("coolant").await.unwrap();
        ctx.answer("tire pressure").await.unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(body.lines().count(), 2);
        let first: Value = serde_json::from_str(body.lines().next().unwrap()).unwrap();
        assert_eq!(first["question"], "coolant");
        assert_eq!(first["context_keys"][0], "lm24-0001#0");
    }

    #[tokio::test]
    async fn ingest_reports_malformed_rows() {
        let ctx = contextor(config(), Scripted::ok());
        let mut bad = row("lm24-0002", 90.0);
        bad["DriverWeight_kg"] = json!(null);
        let report = ctx
            .ingest_rows(&[row("lm24-0001", 87.3), bad, json!(7)])
            .await
            .unwrap();
        assert_eq!(report.received, 3);
        assert_eq!(report.units_built, 1);
        assert_eq!(report.upserted, 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].key, "lm24-0002");

        // Re-ingesting the same record replaces it.
        ctx.ingest_rows(&[row("lm24-0001", 88.0)]).await.unwrap();
        assert_eq!(ctx.store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn per_group_granularity_still_dedupes_records() {
        let cfg = ContextorConfig {
            granularity: telemetry_docs::DocGranularity::PerMetricGroup,
            ..config()
        };
        let ctx = contextor(cfg, Scripted::ok());
        let report = ctx.ingest_rows(&[row("a", 87.3), row("b", 91.0)]).await.unwrap();
        assert_eq!(report.units_built, 8);

        let rec = ctx.answer("coolant temperature").await.unwrap();
        assert_eq!(rec.context_keys.len(), 2);
        assert!(rec.advice.is_some());
    }

    #[tokio::test]
    async fn tire_pressure_question_retrieves_the_single_record() {
        let ctx = contextor(config(), Scripted::ok());
        let mut r = row("r1", 87.3);
        r["PES"] = json!(87.3);
        ctx.ingest_rows(&[r.clone()]).await.unwrap();

        let hits = ctx
            .store()
            .retrieve("What tire pressures give high PES?", 1, 0.0, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        for v in ["22.0", "21.8", "87.3"] {
            assert!(hits[0].unit.text.contains(v), "missing {v}");
        }

        ctx.ingest_rows(&[r]).await.unwrap();
        assert_eq!(ctx.store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn granularity_switch_drops_stale_group_units() {
        let rows = [row("a", 87.3)];
        let grouped = ContextorConfig {
            granularity: telemetry_docs::DocGranularity::PerMetricGroup,
            ..config()
        };
        let ctx = contextor(grouped, Scripted::ok());
        ctx.ingest_rows(&rows).await.unwrap();
        assert_eq!(ctx.store().count().await.unwrap(), 4);

        let per_record = Contextor::new(config(), ctx.store().clone(), Scripted::ok()).unwrap();
        per_record.ingest_rows(&rows).await.unwrap();
        assert_eq!(ctx.store().count().await.unwrap(), 1);

        let rec = per_record.answer("coolant temperature").await.unwrap();
        assert_eq!(rec.context_keys, ["a#0"]);
    }

    #[tokio::test]
    async fn jsonl_ingest_counts_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("laps.jsonl");
        let body = format!("{}\nnot json\n\n{}\n", row("a", 87.3), row("b", 90.0));
        std::fs::write(&path, body).unwrap();

        let ctx = contextor(config(), Scripted::ok());
        let report = ctx.ingest_jsonl(&path).await.unwrap();
        assert_eq!(report.received, 3);
        assert_eq!(report.upserted, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].key, "line 2");
    }
}
