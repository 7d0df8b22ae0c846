use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::error::IndexError;
use crate::types::{ChunkPayload, RetrievalResult};
use crate::vector_store::{CollectionSchema, Distance, VectorFilter, VectorPoint, VectorStore};

pub const DEFAULT_COLLECTION: &str = "legal_documents";
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 64;

static LAST_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Reserve `n` consecutive insertion sequence numbers and return the first.
///
/// Sequences follow wall-clock microseconds across processes and strictly increase
/// within one.
fn reserve_sequences(n: usize) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_micros()).unwrap_or(u64::MAX));
    let n = n as u64;
    let (Ok(prev) | Err(prev)) =
        LAST_SEQUENCE.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(last.max(now).saturating_add(n))
        });
    prev.max(now)
}

/// Collection-scoped chunk index over a [`VectorStore`] backend.
///
/// Operations taking `collection: Option<&str>` fall back to the default collection
/// fixed at construction.
#[derive(Clone)]
pub struct VectorIndex {
    store: Arc<dyn VectorStore>,
    default_collection: String,
    upsert_batch_size: usize,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("default_collection", &self.default_collection)
            .field("upsert_batch_size", &self.upsert_batch_size)
            .finish_non_exhaustive()
    }
}

impl VectorIndex {
    #[must_use]
    pub fn new(store: Arc<dyn VectorStore>, default_collection: impl Into<String>) -> Self {
        Self {
            store,
            default_collection: default_collection.into(),
            upsert_batch_size: DEFAULT_UPSERT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_upsert_batch_size(mut self, size: usize) -> Self {
        self.upsert_batch_size = size.max(1);
        self
    }

    #[must_use]
    pub fn default_collection(&self) -> &str {
        &self.default_collection
    }

    pub(crate) fn resolve<'a>(&'a self, collection: Option<&'a str>) -> &'a str {
        collection.unwrap_or(&self.default_collection)
    }

    /// Create `name` if absent. A no-op when it exists with the same schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaConflict` if the collection exists with other dimensions or
    /// metric, `Unavailable` if the backend cannot be reached.
    pub async fn ensure_collection(
        &self,
        name: &str,
        dimensions: u64,
        distance: Distance,
    ) -> Result<(), IndexError> {
        let wanted = CollectionSchema {
            dimensions,
            distance,
        };
        if let Some(existing) = self.store.collection_info(name).await? {
            return check_schema(name, wanted, existing);
        }
        if let Err(e) = self.store.create_collection(name, wanted).await {
            // Lost a creation race: accept the winner's collection if it matches.
            match self.store.collection_info(name).await? {
                Some(existing) => return check_schema(name, wanted, existing),
                None => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Index `chunks` of one document; point `i` gets `chunk_index = i`.
    ///
    /// Creates the collection with the embeddings' dimensionality and cosine distance
    /// if it does not exist. Points are uploaded in order, in batches of
    /// `upsert_batch_size`.
    ///
    /// # Errors
    ///
    /// - `InputMismatch` when lengths differ (nothing is written)
    /// - `DimensionMismatch` when embeddings disagree on dimensionality
    /// - `SchemaConflict` when the collection has another schema
    /// - `PartialWrite` listing failed chunk positions when some batches fail
    /// - `Unavailable` when the backend cannot be reached and nothing was written
    pub async fn store_chunks(
        &self,
        document_id: i64,
        chunks: &[String],
        embeddings: &[Vec<f32>],
        collection: Option<&str>,
    ) -> Result<usize, IndexError> {
        if chunks.len() != embeddings.len() {
            return Err(IndexError::InputMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }
        let Some(first) = embeddings.first() else {
            return Ok(0);
        };
        let dims = first.len();
        if dims == 0 {
            return Err(IndexError::InvalidArgument("embeddings are empty".into()));
        }
        if let Some((index, bad)) = embeddings.iter().enumerate().find(|(_, e)| e.len() != dims) {
            return Err(IndexError::DimensionMismatch {
                index,
                expected: dims,
                actual: bad.len(),
            });
        }

        let collection = self.resolve(collection);
        self.ensure_collection(collection, dims as u64, Distance::Cosine)
            .await?;
        let first_sequence = reserve_sequences(chunks.len());

        let mut written = 0;
        let mut failed = Vec::new();
        let mut unavailable = None;

        let batches = chunks
            .chunks(self.upsert_batch_size)
            .zip(embeddings.chunks(self.upsert_batch_size));
        for (batch_no, (texts, vectors)) in batches.enumerate() {
            let offset = batch_no * self.upsert_batch_size;
            let points = texts
                .iter()
                .zip(vectors)
                .enumerate()
                .map(|(i, (text, vector))| {
                    let chunk_index = offset + i;
                    let sequence = first_sequence + chunk_index as u64;
                    build_point(document_id, chunk_index, sequence, text, vector)
                })
                .collect::<Result<Vec<_>, _>>()?;

            match self.store.upsert(collection, points).await {
                Ok(()) => written += texts.len(),
                Err(e) => {
                    tracing::warn!(
                        collection,
                        document_id,
                        batch = batch_no,
                        "chunk upload failed: {e}"
                    );
                    if e.is_connection() {
                        unavailable = Some(e.to_string());
                    }
                    failed.extend(offset..offset + texts.len());
                }
            }
        }

        if failed.is_empty() {
            tracing::debug!(collection, document_id, written, "stored chunks");
            return Ok(written);
        }
        if written == 0
            && let Some(msg) = unavailable
        {
            return Err(IndexError::Unavailable(msg));
        }
        Err(IndexError::PartialWrite { written, failed })
    }

    /// Up to `top_k` chunks by descending cosine similarity, optionally restricted to
    /// one document. Equal scores keep insertion order. A missing or empty collection
    /// yields no results.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for `top_k == 0`, `DimensionMismatch` when the query
    /// does not fit the collection, `Unavailable` if the backend cannot be reached.
    pub async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
        collection: Option<&str>,
        document_id: Option<i64>,
    ) -> Result<Vec<RetrievalResult>, IndexError> {
        if top_k == 0 {
            return Err(IndexError::InvalidArgument("top_k must be at least 1".into()));
        }
        let collection = self.resolve(collection);
        let Some(schema) = self.store.collection_info(collection).await? else {
            return Ok(Vec::new());
        };
        if query_vector.len() as u64 != schema.dimensions {
            return Err(IndexError::DimensionMismatch {
                index: 0,
                expected: usize::try_from(schema.dimensions).unwrap_or(usize::MAX),
                actual: query_vector.len(),
            });
        }

        let filter = document_id.map(|id| VectorFilter::integer("document_id", id));
        let hits = self
            .store
            .search(collection, query_vector.to_vec(), top_k as u64, filter)
            .await?;

        let mut ranked = hits
            .into_iter()
            .map(|hit| -> Result<(ChunkPayload, f32), IndexError> {
                let payload: ChunkPayload = serde_json::from_value(serde_json::Value::Object(
                    hit.payload.into_iter().collect(),
                ))?;
                Ok((payload, hit.score))
            })
            .collect::<Result<Vec<_>, _>>()?;
        // Backends order equal scores arbitrarily (Qdrant by point id).
        ranked.sort_by(|(a, a_score), (b, b_score)| {
            b_score
                .total_cmp(a_score)
                .then(a.sequence.cmp(&b.sequence))
        });

        Ok(ranked
            .into_iter()
            .map(|(payload, score)| RetrievalResult::from_payload(payload, score))
            .collect())
    }

    /// Remove every point of `document_id`. A missing collection is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion or cannot be reached.
    pub async fn delete_document(
        &self,
        document_id: i64,
        collection: Option<&str>,
    ) -> Result<(), IndexError> {
        let collection = self.resolve(collection);
        if self.store.collection_info(collection).await?.is_none() {
            return Ok(());
        }
        self.store
            .delete_by_filter(collection, VectorFilter::integer("document_id", document_id))
            .await?;
        tracing::info!(collection, document_id, "deleted document chunks");
        Ok(())
    }

    /// Number of points in the collection, zero when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    pub async fn count(&self, collection: Option<&str>) -> Result<u64, IndexError> {
        let collection = self.resolve(collection);
        if self.store.collection_info(collection).await?.is_none() {
            return Ok(0);
        }
        Ok(self.store.count(collection).await?)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion or cannot be reached.
    pub async fn delete_collection(&self, collection: Option<&str>) -> Result<(), IndexError> {
        let collection = self.resolve(collection);
        self.store.delete_collection(collection).await?;
        Ok(())
    }
}

fn check_schema(
    name: &str,
    expected: CollectionSchema,
    actual: CollectionSchema,
) -> Result<(), IndexError> {
    if expected == actual {
        Ok(())
    } else {
        Err(IndexError::SchemaConflict {
            collection: name.to_owned(),
            expected,
            actual,
        })
    }
}

fn build_point(
    document_id: i64,
    chunk_index: usize,
    sequence: u64,
    text: &str,
    vector: &[f32],
) -> Result<VectorPoint, IndexError> {
    let payload = ChunkPayload {
        document_id,
        chunk_index,
        text: text.to_owned(),
        chunk_length: text.chars().count(),
        sequence,
    };
    let serde_json::Value::Object(map) = serde_json::to_value(payload)? else {
        return Err(IndexError::InvalidArgument("payload is not an object".into()));
    };
    Ok(VectorPoint {
        id: Uuid::new_v4().to_string(),
        vector: vector.to_vec(),
        payload: map.into_iter().collect::<HashMap<_, _>>(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use lexrag_llm::embed::{EmbeddingModel, HashingEmbedModel};

    use super::*;
    use crate::in_memory_store::InMemoryVectorStore;
    use crate::vector_store::{BoxFuture, ScoredVectorPoint, VectorStoreError};

    fn memory_index() -> (Arc<InMemoryVectorStore>, VectorIndex) {
        let store = Arc::new(InMemoryVectorStore::new());
        let index = VectorIndex::new(Arc::clone(&store) as Arc<dyn VectorStore>, "docs");
        (store, index)
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    fn embed(items: &[String]) -> Vec<Vec<f32>> {
        HashingEmbedModel::new(64).embed_batch(items).unwrap()
    }

    /// Delegates to an in-memory store but fails the upsert batches listed in `fail`.
    /// With `reverse_hits`, search results come back in reverse order.
    struct FlakyStore {
        inner: InMemoryVectorStore,
        fail: Vec<usize>,
        connection: bool,
        reverse_hits: bool,
        calls: AtomicUsize,
    }

    impl FlakyStore {
        fn new(fail: Vec<usize>, connection: bool) -> Self {
            Self {
                inner: InMemoryVectorStore::new(),
                fail,
                connection,
                reverse_hits: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl VectorStore for FlakyStore {
        fn collection_info(
            &self,
            collection: &str,
        ) -> BoxFuture<'_, Result<Option<CollectionSchema>, VectorStoreError>> {
            self.inner.collection_info(collection)
        }

        fn create_collection(
            &self,
            collection: &str,
            schema: CollectionSchema,
        ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
            self.inner.create_collection(collection, schema)
        }

        fn delete_collection(
            &self,
            collection: &str,
        ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
            self.inner.delete_collection(collection)
        }

        fn upsert(
            &self,
            collection: &str,
            points: Vec<VectorPoint>,
        ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.contains(&call) {
                let err = if self.connection {
                    VectorStoreError::Connection("connection refused".into())
                } else {
                    VectorStoreError::Upsert("rejected".into())
                };
                return Box::pin(async move { Err(err) });
            }
            self.inner.upsert(collection, points)
        }

        fn search(
            &self,
            collection: &str,
            vector: Vec<f32>,
            limit: u64,
            filter: Option<VectorFilter>,
        ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
            let hits = self.inner.search(collection, vector, limit, filter);
            if !self.reverse_hits {
                return hits;
            }
            Box::pin(async move {
                let mut hits = hits.await?;
                hits.reverse();
                Ok(hits)
            })
        }

        fn delete_by_filter(
            &self,
            collection: &str,
            filter: VectorFilter,
        ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
            self.inner.delete_by_filter(collection, filter)
        }

        fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, VectorStoreError>> {
            self.inner.count(collection)
        }
    }

    #[tokio::test]
    async fn length_mismatch_writes_nothing() {
        let (store, index) = memory_index();
        let chunks = texts(&["a", "b", "c"]);
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0]];

        let err = index
            .store_chunks(1, &chunks, &embeddings, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IndexError::InputMismatch {
                chunks: 3,
                embeddings: 2
            }
        ));
        assert!(store.collection_info("docs").await.unwrap().is_none());
        assert_eq!(index.count(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ensure_collection_is_idempotent() {
        let (_, index) = memory_index();
        index.ensure_collection("docs", 3, Distance::Cosine).await.unwrap();
        index.ensure_collection("docs", 3, Distance::Cosine).await.unwrap();
    }

    #[tokio::test]
    async fn ensure_collection_rejects_other_dimensions() {
        let (_, index) = memory_index();
        index.ensure_collection("docs", 3, Distance::Cosine).await.unwrap();
        let err = index
            .ensure_collection("docs", 4, Distance::Cosine)
            .await
            .unwrap_err();
        match err {
            IndexError::SchemaConflict {
                collection,
                expected,
                actual,
            } => {
                assert_eq!(collection, "docs");
                assert_eq!(expected.dimensions, 4);
                assert_eq!(actual.dimensions, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ensure_collection_rejects_other_metric() {
        let (_, index) = memory_index();
        index.ensure_collection("docs", 3, Distance::Dot).await.unwrap();
        let err = index
            .ensure_collection("docs", 3, Distance::Cosine)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::SchemaConflict { .. }));
    }

    #[tokio::test]
    async fn store_into_conflicting_collection_writes_nothing() {
        let (store, index) = memory_index();
        index.ensure_collection("docs", 3, Distance::Cosine).await.unwrap();
        let chunks = texts(&["The lessee pays rent monthly."]);
        let err = index
            .store_chunks(1, &chunks, &embed(&chunks), None)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::SchemaConflict { .. }));
        assert_eq!(store.count("docs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let (store, index) = memory_index();
        assert_eq!(index.store_chunks(1, &[], &[], None).await.unwrap(), 0);
        assert!(store.collection_info("docs").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inconsistent_embedding_dimensions_rejected() {
        let (_, index) = memory_index();
        let chunks = texts(&["a", "b"]);
        let err = index
            .store_chunks(1, &chunks, &[vec![1.0, 0.0], vec![1.0]], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                index: 1,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn stored_chunk_is_top_hit_for_its_own_embedding() {
        let (_, index) = memory_index();
        let chunks = texts(&[
            "The tenant shall pay rent on the first day of each month.",
            "This agreement is governed by the laws of the State of New York.",
            "Either party may terminate with thirty days written notice.",
        ]);
        let embeddings = embed(&chunks);

        let written = index
            .store_chunks(5, &chunks, &embeddings, None)
            .await
            .unwrap();
        assert_eq!(written, 3);

        let results = index.search(&embeddings[1], 3, None, None).await.unwrap();
        assert_eq!(results[0].text, chunks[1]);
        assert_eq!(results[0].chunk_index, 1);
        assert_eq!(results[0].document_id, 5);
        assert_eq!(results[0].chunk_length, chunks[1].chars().count());
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn points_get_fresh_uuids() {
        let (store, index) = memory_index();
        let chunks = texts(&["first clause", "second clause"]);
        index
            .store_chunks(1, &chunks, &embed(&chunks), None)
            .await
            .unwrap();
        let hits = store
            .search("docs", embed(&chunks)[0].clone(), 10, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_ne!(hits[0].id, hits[1].id);
        assert!(hits.iter().all(|h| Uuid::parse_str(&h.id).is_ok()));
    }

    #[tokio::test]
    async fn document_filter_excludes_other_documents() {
        let (_, index) = memory_index();
        let doc1 = texts(&["rent is due monthly", "late fees apply after five days"]);
        let doc2 = texts(&["rent is due monthly", "the deposit is refundable"]);
        index.store_chunks(1, &doc1, &embed(&doc1), None).await.unwrap();
        index.store_chunks(2, &doc2, &embed(&doc2), None).await.unwrap();

        let query = &embed(&texts(&["rent is due monthly"]))[0];
        let results = index.search(query, 10, None, Some(2)).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.document_id == 2));
    }

    #[tokio::test]
    async fn missing_or_empty_collection_returns_nothing() {
        let (_, index) = memory_index();
        assert!(index.search(&[1.0, 0.0], 3, None, None).await.unwrap().is_empty());

        index.ensure_collection("docs", 2, Distance::Cosine).await.unwrap();
        assert!(index.search(&[1.0, 0.0], 3, None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_top_k_rejected() {
        let (_, index) = memory_index();
        let err = index.search(&[1.0], 0, None, None).await.unwrap_err();
        assert!(matches!(err, IndexError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn query_dimension_must_match_collection() {
        let (_, index) = memory_index();
        index.ensure_collection("docs", 3, Distance::Cosine).await.unwrap();
        let err = index.search(&[1.0, 0.0], 1, None, None).await.unwrap_err();
        assert!(matches!(err, IndexError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn equal_scores_follow_chunk_order() {
        let (_, index) = memory_index();
        let chunks = texts(&["one", "two", "three"]);
        let same = vec![vec![0.6, 0.8]; 3];
        index.store_chunks(1, &chunks, &same, None).await.unwrap();

        let results = index.search(&[0.6, 0.8], 3, None, None).await.unwrap();
        let order: Vec<_> = results.iter().map(|r| r.chunk_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn equal_scores_follow_insertion_order_across_documents() {
        let store = Arc::new(FlakyStore {
            reverse_hits: true,
            ..FlakyStore::new(Vec::new(), false)
        });
        let index = VectorIndex::new(store as Arc<dyn VectorStore>, "docs");
        let same = vec![vec![0.6, 0.8]; 2];
        index
            .store_chunks(9, &texts(&["nine-a", "nine-b"]), &same, None)
            .await
            .unwrap();
        index
            .store_chunks(4, &texts(&["four-a", "four-b"]), &same, None)
            .await
            .unwrap();

        let results = index.search(&[0.6, 0.8], 4, None, None).await.unwrap();
        let order: Vec<_> = results
            .iter()
            .map(|r| (r.document_id, r.chunk_index))
            .collect();
        assert_eq!(order, vec![(9, 0), (9, 1), (4, 0), (4, 1)]);
    }

    #[test]
    fn reserved_sequences_never_overlap() {
        let a = reserve_sequences(3);
        let b = reserve_sequences(1);
        let c = reserve_sequences(0);
        let d = reserve_sequences(2);
        assert!(b >= a + 3);
        assert!(c > b);
        assert!(d >= c);
    }

    #[tokio::test]
    async fn explicit_collection_overrides_default() {
        let (store, index) = memory_index();
        let chunks = texts(&["indemnification clause"]);
        index
            .store_chunks(1, &chunks, &embed(&chunks), Some("other"))
            .await
            .unwrap();
        assert!(store.collection_info("docs").await.unwrap().is_none());
        assert_eq!(index.count(Some("other")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn partial_failure_reports_failed_positions() {
        let store = Arc::new(FlakyStore::new(vec![1], false));
        let index = VectorIndex::new(Arc::clone(&store) as Arc<dyn VectorStore>, "docs")
            .with_upsert_batch_size(2);
        let chunks = texts(&["c0", "c1", "c2", "c3", "c4"]);

        let err = index
            .store_chunks(1, &chunks, &embed(&chunks), None)
            .await
            .unwrap_err();

        match err {
            IndexError::PartialWrite { written, failed } => {
                assert_eq!(written, 3);
                assert_eq!(failed, vec![2, 3]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.inner.count("docs").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        let store = Arc::new(FlakyStore::new(vec![0, 1, 2], true));
        let index = VectorIndex::new(store as Arc<dyn VectorStore>, "docs").with_upsert_batch_size(2);
        let chunks = texts(&["c0", "c1", "c2"]);

        let err = index
            .store_chunks(1, &chunks, &embed(&chunks), None)
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Unavailable(_)));
    }

    #[tokio::test]
    async fn delete_document_removes_only_that_document() {
        let (_, index) = memory_index();
        let chunks = texts(&["alpha clause", "beta clause"]);
        index.store_chunks(1, &chunks, &embed(&chunks), None).await.unwrap();
        index.store_chunks(2, &chunks, &embed(&chunks), None).await.unwrap();

        index.delete_document(1, None).await.unwrap();

        assert_eq!(index.count(None).await.unwrap(), 2);
        let query = &embed(&chunks)[0];
        let results = index.search(query, 10, None, None).await.unwrap();
        assert!(results.iter().all(|r| r.document_id == 2));
    }

    #[tokio::test]
    async fn delete_document_on_missing_collection_is_ok() {
        let (_, index) = memory_index();
        index.delete_document(1, None).await.unwrap();
    }

    #[test]
    fn debug_shows_default_collection() {
        let (_, index) = memory_index();
        assert!(format!("{index:?}").contains("docs"));
    }
}
