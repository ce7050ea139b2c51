//! Qdrant-backed [`VectorIndex`].
//!
//! This facade concentrates all Qdrant interactions behind the index trait, hiding
//! the verbose builder pattern from the rest of the workspace. Each unit is stored
//! as one point:
//!
//! - id: UUIDv5 of the unit key
//! - vector: the embedding
//! - payload: `key`, `record_id`, `text`, `embedding_model`, `metadata` (struct)
//!
//! The collection is created lazily on the first call. When it already exists, its
//! vector size, distance and the `embedding_model` of a stored point are checked
//! against the configured [`IndexSpace`].

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance,
    GetCollectionInfoResponse, ListValue, PointId, PointStruct, PointsIdsList,
    ScrollPointsBuilder, SearchParamsBuilder, SearchPointsBuilder, Struct, UpsertPointsBuilder,
    Value as QValue, VectorParamsBuilder, value, vectors_config,
};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{DistanceKind, IndexSpace, RagConfig};
use crate::errors::RagError;
use crate::filters::{METADATA_FIELD, MetadataFilter, to_qdrant_filter};
use crate::index::{VectorIndex, check_entries, check_search, rank_hits};
use crate::record::{DocumentUnit, EmbeddingVector, IndexedEntry, RetrievalResult, stable_uuid};

const MODEL_FIELD: &str = "embedding_model";

pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    space: IndexSpace,
    exact: bool,
    call_timeout: Duration,
    ready: OnceCell<()>,
}

impl QdrantIndex {
    /// Builds the client. No network traffic happens until the first call.
    pub fn new(cfg: &RagConfig, model: impl Into<String>) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url).timeout(cfg.call_timeout);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            space: IndexSpace::new(cfg.embedding_dim, cfg.distance, model),
            exact: cfg.exact_search,
            call_timeout: cfg.call_timeout,
            ready: OnceCell::new(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Runs one Qdrant call under the per-call timeout.
    async fn bounded<T, E, F>(&self, op: &'static str, fut: F) -> Result<T, RagError>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => Err(RagError::Qdrant(format!("{op}: {e}"))),
            Err(_) => {
                warn!(op, timeout = ?self.call_timeout, "qdrant call timed out");
                Err(RagError::Timeout {
                    op,
                    after: self.call_timeout,
                })
            }
        }
    }

    async fn ensure_ready(&self) -> Result<(), RagError> {
        self.ready
            .get_or_try_init(|| self.ensure_collection())
            .await
            .map(|_| ())
    }

    /// Creates the collection when missing, otherwise verifies it.
    async fn ensure_collection(&self) -> Result<(), RagError> {
        info!(
            collection = %self.collection,
            size = self.space.size,
            distance = self.space.distance.as_str(),
            model = %self.space.model,
            "ensuring collection"
        );

        let exists = self
            .bounded(
                "collection_exists",
                self.client.collection_exists(&self.collection),
            )
            .await?;

        if exists {
            return self.verify_collection().await;
        }

        let distance = match self.space.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
        };
        self.bounded(
            "create_collection",
            self.client.create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(self.space.size as u64, distance)),
            ),
        )
        .await?;

        info!(collection = %self.collection, "collection created");
        Ok(())
    }

    async fn verify_collection(&self) -> Result<(), RagError> {
        let info = self
            .bounded(
                "collection_info",
                self.client.collection_info(&self.collection),
            )
            .await?;

        check_stored_space(&info, &self.space)?;

        let sample = self
            .bounded(
                "scroll",
                self.client.scroll(
                    ScrollPointsBuilder::new(&self.collection)
                        .limit(1)
                        .with_payload(true)
                        .with_vectors(false),
                ),
            )
            .await?;

        let stored_model = sample.result.into_iter().next().and_then(|p| {
            match p.payload.get(MODEL_FIELD).and_then(|v| v.kind.clone()) {
                Some(value::Kind::StringValue(s)) => Some(s),
                _ => None,
            }
        });
        match stored_model {
            Some(m) if m != self.space.model => Err(RagError::ModelMismatch {
                got: self.space.model.clone(),
                want: m,
            }),
            _ => {
                debug!(collection = %self.collection, "existing collection verified");
                Ok(())
            }
        }
    }
}

impl VectorIndex for QdrantIndex {
    fn space(&self) -> &IndexSpace {
        &self.space
    }

    fn upsert<'a>(&'a self, entries: Vec<IndexedEntry>) -> BoxFuture<'a, Result<usize, RagError>> {
        Box::pin(async move {
            if entries.is_empty() {
                debug!("No points provided for upsert");
                return Ok(0);
            }
            check_entries(&self.space, &entries)?;
            self.ensure_ready().await?;

            let n = entries.len();
            let points: Vec<PointStruct> = entries.into_iter().map(to_point).collect();
            info!(points = n, collection = %self.collection, "upserting points");

            self.bounded(
                "upsert_points",
                self.client
                    .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true)),
            )
            .await?;
            Ok(n)
        })
    }

    fn search<'a>(
        &'a self,
        query: &'a EmbeddingVector,
        k: usize,
        filter: Option<&'a MetadataFilter>,
    ) -> BoxFuture<'a, Result<Vec<RetrievalResult>, RagError>> {
        Box::pin(async move {
            check_search(&self.space, query, k)?;
            self.ensure_ready().await?;

            let mut builder =
                SearchPointsBuilder::new(&self.collection, query.values.clone(), k as u64)
                    .with_payload(true);
            if let Some(f) = filter.filter(|f| !f.is_empty()) {
                builder = builder.filter(to_qdrant_filter(f));
            }
            if self.exact {
                builder = builder.params(SearchParamsBuilder::default().exact(true));
            }

            let res = self
                .bounded("search_points", self.client.search_points(builder))
                .await?;

            let mut hits = Vec::with_capacity(res.result.len());
            for p in res.result {
                match payload_to_unit(p.payload) {
                    Some(unit) => hits.push((p.score, unit)),
                    None => warn!("skipping point with unreadable payload"),
                }
            }
            debug!(hits = hits.len(), "search completed");
            Ok(rank_hits(hits, k))
        })
    }

    fn count<'a>(&'a self) -> BoxFuture<'a, Result<usize, RagError>> {
        Box::pin(async move {
            self.ensure_ready().await?;
            let res = self
                .bounded(
                    "count",
                    self.client
                        .count(CountPointsBuilder::new(&self.collection).exact(true)),
                )
                .await?;
            Ok(res.result.map(|r| r.count as usize).unwrap_or(0))
        })
    }

    /// Qdrant does not report how many ids existed; returns the number requested.
    fn delete<'a>(&'a self, keys: &'a [String]) -> BoxFuture<'a, Result<usize, RagError>> {
        Box::pin(async move {
            if keys.is_empty() {
                return Ok(0);
            }
            self.ensure_ready().await?;
            let ids: Vec<PointId> = keys
                .iter()
                .map(|k| stable_uuid(k).to_string().into())
                .collect();
            self.bounded(
                "delete_points",
                self.client.delete_points(
                    DeletePointsBuilder::new(&self.collection)
                        .points(PointsIdsList { ids })
                        .wait(true),
                ),
            )
            .await?;
            Ok(keys.len())
        })
    }
}

fn stored_params(info: &GetCollectionInfoResponse) -> Option<(u64, Distance)> {
    let params = info.result.as_ref()?.config.as_ref()?.params.as_ref()?;
    match params.vectors_config.as_ref()?.config.as_ref()? {
        vectors_config::Config::Params(p) => Some((p.size, p.distance())),
        vectors_config::Config::ParamsMap(_) => None,
    }
}

/// Size and metric of an existing collection must match the configured space.
fn check_stored_space(
    info: &GetCollectionInfoResponse,
    space: &IndexSpace,
) -> Result<(), RagError> {
    let Some((size, distance)) = stored_params(info) else {
        warn!("collection uses named vectors; size and distance not verified");
        return Ok(());
    };
    if size as usize != space.size {
        return Err(RagError::VectorSizeMismatch {
            got: space.size,
            want: size as usize,
        });
    }
    let stored = match distance {
        Distance::Cosine => Some(DistanceKind::Cosine),
        Distance::Dot => Some(DistanceKind::Dot),
        _ => None,
    };
    if stored != Some(space.distance) {
        return Err(RagError::DistanceMismatch {
            got: space.distance.as_str().to_string(),
            want: distance.as_str_name().to_ascii_lowercase(),
        });
    }
    Ok(())
}

fn to_point(e: IndexedEntry) -> PointStruct {
    let IndexedEntry { vector, unit } = e;
    let pid: PointId = stable_uuid(&unit.key).to_string().into();

    let mut payload: HashMap<String, QValue> = HashMap::new();
    payload.insert("key".into(), qstring(&unit.key));
    payload.insert("record_id".into(), qstring(&unit.record_id));
    payload.insert("text".into(), qstring(&unit.text));
    payload.insert(MODEL_FIELD.into(), qstring(&vector.model));
    payload.insert(
        METADATA_FIELD.into(),
        json_to_qvalue(serde_json::Value::Object(
            unit.metadata.into_iter().collect(),
        )),
    );

    PointStruct {
        id: Some(pid),
        payload,
        vectors: Some(vector.values.into()),
        ..Default::default()
    }
}

fn payload_to_unit(p: HashMap<String, QValue>) -> Option<DocumentUnit> {
    serde_json::from_value(qpayload_to_json(p)).ok()
}

/// Wraps a string into Qdrant `Value`.
fn qstring(s: &str) -> QValue {
    QValue {
        kind: Some(value::Kind::StringValue(s.to_string())),
    }
}

/// Converts `serde_json::Value` into Qdrant `Value` (handles arrays/objects).
fn json_to_qvalue(v: serde_json::Value) -> QValue {
    use value::Kind as K;
    let kind = match v {
        serde_json::Value::String(s) => Some(K::StringValue(s)),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(K::IntegerValue(i)),
            (None, Some(f)) => Some(K::DoubleValue(f)),
            _ => Some(K::StringValue(n.to_string())),
        },
        serde_json::Value::Bool(b) => Some(K::BoolValue(b)),
        serde_json::Value::Array(arr) => Some(K::ListValue(ListValue {
            values: arr.into_iter().map(json_to_qvalue).collect(),
        })),
        serde_json::Value::Object(map) => Some(K::StructValue(Struct {
            fields: map.into_iter().map(|(k, v)| (k, json_to_qvalue(v))).collect(),
        })),
        serde_json::Value::Null => None,
    };
    QValue { kind }
}

fn qvalue_to_json(v: QValue) -> serde_json::Value {
    use value::Kind as K;
    match v.kind {
        Some(K::StringValue(s)) => serde_json::Value::String(s),
        Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
        Some(K::DoubleValue(f)) => serde_json::json!(f),
        Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(K::ListValue(l)) => {
            serde_json::Value::Array(l.values.into_iter().map(qvalue_to_json).collect())
        }
        Some(K::StructValue(s)) => qpayload_to_json(s.fields),
        Some(K::NullValue(_)) | None => serde_json::Value::Null,
    }
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into a JSON object.
fn qpayload_to_json(p: HashMap<String, QValue>) -> serde_json::Value {
    serde_json::Value::Object(
        p.into_iter()
            .map(|(k, v)| (k, qvalue_to_json(v)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use qdrant_client::qdrant::{
        CollectionConfig, CollectionInfo, CollectionParams, VectorParams, VectorsConfig,
    };
    use serde_json::json;
    use std::collections::BTreeMap;

    fn entry() -> IndexedEntry {
        let mut meta = BTreeMap::new();
        meta.insert("TirePressure_Front".to_string(), json!(22.0));
        meta.insert("lap".to_string(), json!(7));
        meta.insert("session_id".to_string(), json!("S1"));
        IndexedEntry {
            vector: EmbeddingVector::new(vec![0.1, 0.2], "ollama:all-minilm"),
            unit: DocumentUnit::new("r-1", 0, "Front tire pressure is 22.0 PSI.", meta),
        }
    }

    #[test]
    fn point_payload_round_trips_to_unit() {
        let e = entry();
        let unit = e.unit.clone();
        let p = to_point(e);
        assert_eq!(
            p.id,
            Some(PointId::from(stable_uuid("r-1#0").to_string()))
        );
        match p.payload.get(MODEL_FIELD).and_then(|v| v.kind.clone()) {
            Some(value::Kind::StringValue(m)) => assert_eq!(m, "ollama:all-minilm"),
            other => panic!("unexpected model payload: {other:?}"),
        }
        let back = payload_to_unit(p.payload).unwrap();
        assert_eq!(back, unit);
    }

    #[test]
    fn unreadable_payload_is_none() {
        let mut p = HashMap::new();
        p.insert("text".to_string(), qstring("orphan"));
        assert!(payload_to_unit(p).is_none());
    }

    fn info(size: u64, distance: Distance) -> GetCollectionInfoResponse {
        let vectors = VectorParams {
            size,
            distance: distance as i32,
            ..Default::default()
        };
        GetCollectionInfoResponse {
            result: Some(CollectionInfo {
                config: Some(CollectionConfig {
                    params: Some(CollectionParams {
                        vectors_config: Some(VectorsConfig {
                            config: Some(vectors_config::Config::Params(vectors)),
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn existing_collection_must_match_size_and_distance() {
        let space = IndexSpace::new(384, DistanceKind::Cosine, "ollama:all-minilm");
        assert!(check_stored_space(&info(384, Distance::Cosine), &space).is_ok());

        let err = check_stored_space(&info(384, Distance::Dot), &space).unwrap_err();
        assert!(matches!(err, RagError::DistanceMismatch { .. }));
        assert_eq!(err.kind(), ErrorKind::IndexVersionMismatch);

        let err = check_stored_space(&info(384, Distance::Euclid), &space).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexVersionMismatch);

        let err = check_stored_space(&info(768, Distance::Cosine), &space).unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 384, want: 768 }));
    }

    #[tokio::test]
    async fn new_does_not_touch_network() {
        let cfg = RagConfig::new_default("http://127.0.0.1:6334", "lemans_data");
        let idx = QdrantIndex::new(&cfg, "hash:blake3-384").unwrap();
        assert_eq!(idx.space().size, 384);
        assert_eq!(idx.collection(), "lemans_data");
    }
}
