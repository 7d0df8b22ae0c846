use std::collections::HashMap;
use std::sync::RwLock;

use crate::vector_store::{
    BoxFuture, CollectionSchema, Distance, FieldValue, ScoredVectorPoint, VectorFilter,
    VectorPoint, VectorStore, VectorStoreError,
};

struct StoredPoint {
    id: String,
    vector: Vec<f32>,
    payload: HashMap<String, serde_json::Value>,
}

struct InMemoryCollection {
    schema: CollectionSchema,
    /// Insertion order; re-upserting an id replaces it in place.
    points: Vec<StoredPoint>,
}

/// Exact-scan vector store kept in process memory.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, InMemoryCollection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore")
            .finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn score(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        Distance::Cosine => cosine_similarity(a, b),
        Distance::Dot => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        Distance::Euclid => -a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
        Distance::Manhattan => -a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum::<f32>(),
    }
}

fn matches_filter(payload: &HashMap<String, serde_json::Value>, filter: &VectorFilter) -> bool {
    filter.must.iter().all(|cond| {
        payload
            .get(&cond.field)
            .is_some_and(|val| field_matches(val, &cond.value))
    })
}

fn field_matches(val: &serde_json::Value, expected: &FieldValue) -> bool {
    match expected {
        FieldValue::Integer(i) => val.as_i64() == Some(*i),
        FieldValue::Text(s) => val.as_str() == Some(s.as_str()),
    }
}

impl VectorStore for InMemoryVectorStore {
    fn collection_info(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<Option<CollectionSchema>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(cols.get(&collection).map(|c| c.schema))
        })
    }

    fn create_collection(
        &self,
        collection: &str,
        schema: CollectionSchema,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            if cols.contains_key(&collection) {
                return Err(VectorStoreError::Collection(format!(
                    "collection {collection} already exists"
                )));
            }
            cols.insert(
                collection,
                InMemoryCollection {
                    schema,
                    points: Vec::new(),
                },
            );
            Ok(())
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.remove(&collection);
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Upsert(format!("collection {collection} not found"))
            })?;
            let dims = col.schema.dimensions;
            if let Some(bad) = points.iter().find(|p| p.vector.len() as u64 != dims) {
                return Err(VectorStoreError::Upsert(format!(
                    "point {} has {} dims, collection expects {dims}",
                    bad.id,
                    bad.vector.len()
                )));
            }
            for p in points {
                let stored = StoredPoint {
                    id: p.id,
                    vector: p.vector,
                    payload: p.payload,
                };
                match col.points.iter_mut().find(|sp| sp.id == stored.id) {
                    Some(existing) => *existing = stored,
                    None => col.points.push(stored),
                }
            }
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<VectorFilter>,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;

            let empty_filter = VectorFilter::default();
            let f = filter.as_ref().unwrap_or(&empty_filter);

            let mut scored: Vec<ScoredVectorPoint> = col
                .points
                .iter()
                .filter(|sp| matches_filter(&sp.payload, f))
                .map(|sp| ScoredVectorPoint {
                    id: sp.id.clone(),
                    score: score(col.schema.distance, &vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            // Stable: equal scores keep insertion order.
            scored.sort_by(|a, b| b.score.total_cmp(&a.score));
            scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }

    fn delete_by_filter(
        &self,
        collection: &str,
        filter: VectorFilter,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Delete(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Delete(format!("collection {collection} not found"))
            })?;
            col.points.retain(|sp| !matches_filter(&sp.payload, &filter));
            Ok(())
        })
    }

    fn count(&self, collection: &str) -> BoxFuture<'_, Result<u64, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(cols
                .get(&collection)
                .map_or(0, |c| c.points.len() as u64))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COSINE3: CollectionSchema = CollectionSchema {
        dimensions: 3,
        distance: Distance::Cosine,
    };

    fn point(id: &str, vector: Vec<f32>, doc: i64) -> VectorPoint {
        VectorPoint {
            id: id.into(),
            vector,
            payload: HashMap::from([("document_id".into(), serde_json::json!(doc))]),
        }
    }

    #[tokio::test]
    async fn create_and_describe_collection() {
        let store = InMemoryVectorStore::new();
        assert!(store.collection_info("test").await.unwrap().is_none());
        store.create_collection("test", COSINE3).await.unwrap();
        assert_eq!(store.collection_info("test").await.unwrap(), Some(COSINE3));
    }

    #[tokio::test]
    async fn create_twice_fails() {
        let store = InMemoryVectorStore::new();
        store.create_collection("test", COSINE3).await.unwrap();
        assert!(store.create_collection("test", COSINE3).await.is_err());
    }

    #[tokio::test]
    async fn delete_collection_removes() {
        let store = InMemoryVectorStore::new();
        store.create_collection("test", COSINE3).await.unwrap();
        store.delete_collection("test").await.unwrap();
        assert!(store.collection_info("test").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_and_search() {
        let store = InMemoryVectorStore::new();
        store.create_collection("test", COSINE3).await.unwrap();
        store
            .upsert(
                "test",
                vec![
                    point("a", vec![1.0, 0.0, 0.0], 1),
                    point("b", vec![0.0, 1.0, 0.0], 1),
                ],
            )
            .await
            .unwrap();

        let results = store
            .search("test", vec![1.0, 0.0, 0.0], 2, None)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
        assert!((results[0].score - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn upsert_wrong_dimensions_rejected() {
        let store = InMemoryVectorStore::new();
        store.create_collection("test", COSINE3).await.unwrap();
        let err = store
            .upsert("test", vec![point("a", vec![1.0, 0.0], 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::Upsert(_)));
        assert_eq!(store.count("test").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn upsert_same_id_replaces_in_place() {
        let store = InMemoryVectorStore::new();
        store.create_collection("test", COSINE3).await.unwrap();
        store
            .upsert("test", vec![point("a", vec![1.0, 0.0, 0.0], 1)])
            .await
            .unwrap();
        store
            .upsert("test", vec![point("a", vec![0.0, 1.0, 0.0], 2)])
            .await
            .unwrap();
        assert_eq!(store.count("test").await.unwrap(), 1);
        let results = store
            .search("test", vec![0.0, 1.0, 0.0], 1, None)
            .await
            .unwrap();
        assert_eq!(results[0].payload["document_id"], 2);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new();
        store.create_collection("test", COSINE3).await.unwrap();
        let points = ["p0", "p1", "p2", "p3"]
            .iter()
            .map(|id| point(id, vec![0.0, 0.0, 1.0], 1))
            .collect();
        store.upsert("test", points).await.unwrap();

        let results = store
            .search("test", vec![0.0, 0.0, 1.0], 3, None)
            .await
            .unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);
    }

    #[tokio::test]
    async fn search_with_filter() {
        let store = InMemoryVectorStore::new();
        store.create_collection("test", COSINE3).await.unwrap();
        store
            .upsert(
                "test",
                vec![
                    point("a", vec![1.0, 0.0, 0.0], 1),
                    point("b", vec![0.9, 0.1, 0.0], 2),
                ],
            )
            .await
            .unwrap();

        let results = store
            .search(
                "test",
                vec![1.0, 0.0, 0.0],
                10,
                Some(VectorFilter::integer("document_id", 2)),
            )
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "b");
    }

    #[tokio::test]
    async fn search_missing_collection_errors() {
        let store = InMemoryVectorStore::new();
        let err = store
            .search("nope", vec![1.0, 0.0, 0.0], 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::Search(_)));
    }

    #[tokio::test]
    async fn delete_by_filter_removes_matching_points() {
        let store = InMemoryVectorStore::new();
        store.create_collection("test", COSINE3).await.unwrap();
        store
            .upsert(
                "test",
                vec![
                    point("a", vec![1.0, 0.0, 0.0], 1),
                    point("b", vec![0.0, 1.0, 0.0], 2),
                    point("c", vec![0.0, 0.0, 1.0], 1),
                ],
            )
            .await
            .unwrap();

        store
            .delete_by_filter("test", VectorFilter::integer("document_id", 1))
            .await
            .unwrap();

        assert_eq!(store.count("test").await.unwrap(), 1);
        let results = store
            .search("test", vec![1.0, 0.0, 0.0], 10, None)
            .await
            .unwrap();
        assert_eq!(results[0].id, "b");
    }

    #[tokio::test]
    async fn count_missing_collection_is_zero() {
        let store = InMemoryVectorStore::default();
        assert_eq!(store.count("any").await.unwrap(), 0);
    }

    #[test]
    fn cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &b)).abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_similarity_zero_vector() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn euclid_prefers_closer_points() {
        let q = [0.0, 0.0];
        assert!(score(Distance::Euclid, &q, &[1.0, 0.0]) > score(Distance::Euclid, &q, &[3.0, 0.0]));
    }

    #[test]
    fn debug_format() {
        let store = InMemoryVectorStore::new();
        assert!(format!("{store:?}").contains("InMemoryVectorStore"));
    }
}
