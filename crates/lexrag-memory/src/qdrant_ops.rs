//! Qdrant-backed [`VectorStore`].

use std::collections::HashMap;

use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
    DeletePointsBuilder, FieldType, Filter, PointStruct, ScoredPoint, SearchParamsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder, point_id::PointIdOptions,
    value::Kind, vectors_config,
};
use qdrant_client::{Qdrant, QdrantError};

use crate::vector_store::{
    BoxFuture, CollectionSchema, Distance, FieldCondition, FieldValue, ScoredVectorPoint,
    VectorFilter, VectorPoint, VectorStore, VectorStoreError,
};

/// Payload fields that get an integer index when a collection is created.
const INDEXED_FIELDS: &[&str] = &["document_id"];

/// gRPC codes meaning the server could not be reached or did not answer in time.
const DEADLINE_EXCEEDED: i32 = 4;
const UNAVAILABLE: i32 = 14;

#[derive(Clone)]
pub struct QdrantStore {
    client: Qdrant,
    url: String,
    exact: bool,
}

impl std::fmt::Debug for QdrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantStore")
            .field("url", &self.url)
            .field("exact", &self.exact)
            .finish_non_exhaustive()
    }
}

impl QdrantStore {
    /// Create a client for the Qdrant gRPC endpoint at `url`. No request is sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: &str) -> Result<Self, VectorStoreError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| VectorStoreError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_owned(),
            exact: true,
        })
    }

    /// Toggle exact (brute-force) search. HNSW is used when disabled.
    #[must_use]
    pub fn with_exact_search(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    async fn schema(&self, collection: &str) -> Result<Option<CollectionSchema>, VectorStoreError> {
        let exists = self
            .client
            .collection_exists(collection)
            .await
            .map_err(|e| classify(&e, VectorStoreError::Collection))?;
        if !exists {
            return Ok(None);
        }
        let info = self
            .client
            .collection_info(collection)
            .await
            .map_err(|e| classify(&e, VectorStoreError::Collection))?;
        let config = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);
        match config {
            Some(vectors_config::Config::Params(params)) => Ok(Some(CollectionSchema {
                dimensions: params.size,
                distance: distance_from_qdrant(params.distance),
            })),
            _ => Err(VectorStoreError::Collection(format!(
                "collection {collection} does not use a single unnamed vector"
            ))),
        }
    }

    async fn create(&self, collection: &str, schema: CollectionSchema) -> Result<(), VectorStoreError> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection).vectors_config(VectorParamsBuilder::new(
                    schema.dimensions,
                    distance_to_qdrant(schema.distance),
                )),
            )
            .await
            .map_err(|e| classify(&e, VectorStoreError::Collection))?;

        for field in INDEXED_FIELDS {
            self.client
                .create_field_index(
                    CreateFieldIndexCollectionBuilder::new(collection, *field, FieldType::Integer)
                        .wait(true),
                )
                .await
                .map_err(|e| classify(&e, VectorStoreError::Collection))?;
        }
        tracing::info!(collection, %schema, "created qdrant collection");
        Ok(())
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorStoreError> {
        let qdrant_points = points
            .into_iter()
            .map(|p| {
                let payload = json_to_payload(p.payload)?;
                Ok(PointStruct::new(p.id, p.vector, payload))
            })
            .collect::<Result<Vec<_>, VectorStoreError>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, qdrant_points).wait(true))
            .await
            .map_err(|e| classify(&e, VectorStoreError::Upsert))?;
        Ok(())
    }

    async fn search_points(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> Result<Vec<ScoredVectorPoint>, VectorStoreError> {
        let mut builder = SearchPointsBuilder::new(collection, vector, limit)
            .with_payload(true)
            .params(SearchParamsBuilder::default().exact(self.exact));
        if let Some(f) = filter {
            builder = builder.filter(vector_filter_to_qdrant(f));
        }
        let results = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| classify(&e, VectorStoreError::Search))?;
        Ok(results.result.into_iter().map(scored_point_to_vector).collect())
    }
}

impl VectorStore for QdrantStore {
    fn collection_info(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<Option<CollectionSchema>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move { self.schema(&collection).await })
    }

    fn create_collection(
        &self,
        collection: &str,
        schema: CollectionSchema,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move { self.create(&collection, schema).await })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.client
                .delete_collection(collection.as_str())
                .await
                .map_err(|e| classify(&e, VectorStoreError::Collection))?;
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move { self.upsert_points(&collection, points).await })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move { self.search_points(&collection, vector, limit, filter).await })
    }

    fn delete_by_filter(
        &self,
        collection: &str,
        filter: VectorFilter,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.client
                .delete_points(
                    DeletePointsBuilder::new(collection.as_str())
                        .points(vector_filter_to_qdrant(filter))
                        .wait(true),
                )
                .await
                .map_err(|e| classify(&e, VectorStoreError::Delete))?;
            Ok(())
        })
    }

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let response = self
                .client
                .count(CountPointsBuilder::new(collection.as_str()).exact(true))
                .await
                .map_err(|e| classify(&e, VectorStoreError::Collection))?;
            Ok(response.result.map_or(0, |r| r.count))
        })
    }
}

/// Map unreachable-server failures to `Connection`, everything else through `wrap`.
fn classify(err: &QdrantError, wrap: fn(String) -> VectorStoreError) -> VectorStoreError {
    if let QdrantError::ResponseError { status, .. } = err
        && matches!(status.code() as i32, DEADLINE_EXCEEDED | UNAVAILABLE)
    {
        return VectorStoreError::Connection(err.to_string());
    }
    wrap(err.to_string())
}

fn distance_to_qdrant(distance: Distance) -> qdrant_client::qdrant::Distance {
    match distance {
        Distance::Cosine => qdrant_client::qdrant::Distance::Cosine,
        Distance::Dot => qdrant_client::qdrant::Distance::Dot,
        Distance::Euclid => qdrant_client::qdrant::Distance::Euclid,
        Distance::Manhattan => qdrant_client::qdrant::Distance::Manhattan,
    }
}

fn distance_from_qdrant(raw: i32) -> Distance {
    match qdrant_client::qdrant::Distance::try_from(raw) {
        Ok(qdrant_client::qdrant::Distance::Dot) => Distance::Dot,
        Ok(qdrant_client::qdrant::Distance::Euclid) => Distance::Euclid,
        Ok(qdrant_client::qdrant::Distance::Manhattan) => Distance::Manhattan,
        _ => Distance::Cosine,
    }
}

fn json_to_payload(
    payload: HashMap<String, serde_json::Value>,
) -> Result<HashMap<String, qdrant_client::qdrant::Value>, VectorStoreError> {
    serde_json::from_value(serde_json::Value::Object(payload.into_iter().collect()))
        .map_err(|e| VectorStoreError::Serialization(e.to_string()))
}

fn vector_filter_to_qdrant(filter: VectorFilter) -> Filter {
    Filter::must(filter.must.into_iter().map(field_condition_to_qdrant))
}

fn field_condition_to_qdrant(cond: FieldCondition) -> Condition {
    match cond.value {
        FieldValue::Integer(v) => Condition::matches(cond.field, v),
        FieldValue::Text(v) => Condition::matches(cond.field, v),
    }
}

fn scored_point_to_vector(point: ScoredPoint) -> ScoredVectorPoint {
    let payload: HashMap<String, serde_json::Value> = point
        .payload
        .into_iter()
        .filter_map(|(k, v)| {
            let json_val = match v.kind? {
                Kind::StringValue(s) => serde_json::Value::String(s),
                Kind::IntegerValue(i) => serde_json::Value::Number(i.into()),
                Kind::DoubleValue(d) => {
                    serde_json::Number::from_f64(d).map(serde_json::Value::Number)?
                }
                Kind::BoolValue(b) => serde_json::Value::Bool(b),
                _ => return None,
            };
            Some((k, json_val))
        })
        .collect();

    let id = match point.id.and_then(|pid| pid.point_id_options) {
        Some(PointIdOptions::Uuid(u)) => u,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    };

    ScoredVectorPoint {
        id,
        score: point.score,
        payload,
    }
}
