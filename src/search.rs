use async_trait::async_trait;
use qdrant_client::qdrant::with_payload_selector::SelectorOptions;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchPoints,
    UpsertPointsBuilder, Value, VectorParamsBuilder, WithPayloadSelector,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;

use crate::config::Config;
use crate::embeddings::EmbeddingClient;
use crate::error::Result;
use crate::models::FunctionMatch;
use crate::registry::FunctionRegistry;

#[cfg(test)]
use mockall::automock;

/// Matching layer the HTTP handlers talk to. Mocked in handler tests.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Best registered function for a free-text query, or None when nothing
    /// clears the similarity threshold.
    async fn retrieve(&self, query: &str) -> Result<Option<FunctionMatch>>;

    /// Number of indexed function points.
    async fn indexed_count(&self) -> Result<u64>;
}

/// Qdrant-backed nearest-neighbor search over registered function
/// descriptions.
pub struct QdrantSearch {
    client: Qdrant,
    embedder: EmbeddingClient,
    collection: String,
    dimensions: usize,
    threshold: f32,
}

impl QdrantSearch {
    pub fn new(cfg: &Config, embedder: EmbeddingClient) -> Result<Self> {
        tracing::info!("Connecting to Qdrant at {}", cfg.qdrant_url());

        // Disable version check to avoid a startup failure against older
        // servers; search behavior is unaffected.
        let client = Qdrant::from_url(&cfg.qdrant_url())
            .timeout(std::time::Duration::from_secs(5))
            .skip_compatibility_check()
            .build()?;

        Ok(Self {
            client,
            embedder,
            collection: cfg.qdrant.collection.clone(),
            dimensions: cfg.openai.embedding_dimensions,
            threshold: cfg.qdrant.similarity_threshold,
        })
    }

    /// Create the collection if it does not exist. Idempotent.
    pub async fn ensure_collection(&self) -> Result<()> {
        if self.client.collection_exists(&self.collection).await? {
            return Ok(());
        }
        tracing::info!(
            "Creating Qdrant collection '{}' ({} dimensions, cosine)",
            self.collection,
            self.dimensions
        );
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(self.dimensions as u64, Distance::Cosine),
                ),
            )
            .await?;
        Ok(())
    }

    /// Embed every registered description and upsert one point per function.
    /// Skipped when the collection already holds points, matching startup
    /// seeding semantics.
    pub async fn index_registry(&self, registry: &FunctionRegistry) -> Result<()> {
        let count = self.count_points().await?;
        if count > 0 {
            tracing::info!("Collection already holds {} points, skipping indexing", count);
            return Ok(());
        }
        if registry.is_empty() {
            return Ok(());
        }

        let mut points = Vec::with_capacity(registry.len());
        for (idx, spec) in registry.iter().enumerate() {
            let embedding = self.embedder.embed(spec.description).await?;
            let payload = Payload::try_from(serde_json::json!({
                "name": spec.name,
                "description": spec.description,
            }))?;
            points.push(PointStruct::new(idx as u64, embedding, payload));
        }

        tracing::info!("Indexing {} functions into '{}'", points.len(), self.collection);
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await?;
        Ok(())
    }

    async fn count_points(&self) -> Result<u64> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await?;
        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }
}

#[async_trait]
impl VectorSearch for QdrantSearch {
    async fn retrieve(&self, query: &str) -> Result<Option<FunctionMatch>> {
        let query_embedding = self.embedder.embed(query).await?;

        let search_request = SearchPoints {
            collection_name: self.collection.clone(),
            vector: query_embedding,
            limit: 1,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(SelectorOptions::Enable(true)),
            }),
            with_vectors: Some(false.into()),
            score_threshold: Some(self.threshold),
            ..Default::default()
        };

        let search_result = self.client.search_points(search_request).await?;

        let Some(best) = search_result.result.into_iter().next() else {
            return Ok(None);
        };

        let Some(name) = payload_str(&best.payload, "name") else {
            tracing::warn!("Indexed point {:?} has no 'name' payload", best.id);
            return Ok(None);
        };
        let description = payload_str(&best.payload, "description").unwrap_or_default();

        tracing::info!(
            "Best match for query: {} (score {:.3}, threshold {})",
            name,
            best.score,
            self.threshold
        );

        Ok(Some(FunctionMatch {
            name,
            description,
            score: best.score,
        }))
    }

    async fn indexed_count(&self) -> Result<u64> {
        self.count_points().await
    }
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)?.kind.as_ref()? {
        qdrant_client::qdrant::value::Kind::StringValue(s) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::value::Kind;

    fn string_value(s: &str) -> Value {
        Value {
            kind: Some(Kind::StringValue(s.to_string())),
        }
    }

    #[test]
    fn test_payload_str_extracts_string() {
        let mut payload = HashMap::new();
        payload.insert("name".to_string(), string_value("open_chrome"));
        assert_eq!(payload_str(&payload, "name").as_deref(), Some("open_chrome"));
    }

    #[test]
    fn test_payload_str_missing_key() {
        let payload = HashMap::new();
        assert!(payload_str(&payload, "name").is_none());
    }

    #[test]
    fn test_payload_str_wrong_kind() {
        let mut payload = HashMap::new();
        payload.insert(
            "name".to_string(),
            Value {
                kind: Some(Kind::IntegerValue(7)),
            },
        );
        assert!(payload_str(&payload, "name").is_none());
    }
}
