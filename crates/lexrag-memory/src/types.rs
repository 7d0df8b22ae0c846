use serde::{Deserialize, Serialize};

/// A sentence-aligned span of one document, the atomic retrieval unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub document_id: i64,
    pub chunk_index: usize,
    pub text: String,
    /// Length of `text` in characters.
    pub length: usize,
}

/// Payload stored next to every indexed vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub document_id: i64,
    pub chunk_index: usize,
    pub text: String,
    pub chunk_length: usize,
    /// Insertion order within the collection, used to break score ties. Points
    /// written without one read back as 0.
    #[serde(default)]
    pub sequence: u64,
}

/// A chunk returned from similarity search. `score` is cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub document_id: i64,
    pub chunk_index: usize,
    pub chunk_length: usize,
    pub score: f32,
}

impl RetrievalResult {
    #[must_use]
    pub fn from_payload(payload: ChunkPayload, score: f32) -> Self {
        Self {
            text: payload.text,
            document_id: payload.document_id,
            chunk_index: payload.chunk_index,
            chunk_length: payload.chunk_length,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_flat() {
        let payload = ChunkPayload {
            document_id: 7,
            chunk_index: 2,
            text: "The lease term is twelve months.".into(),
            chunk_length: 32,
            sequence: 11,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["document_id"], 7);
        assert_eq!(json["chunk_index"], 2);
        assert_eq!(json["chunk_length"], 32);
        assert_eq!(json["sequence"], 11);
    }

    #[test]
    fn payload_without_sequence_reads_as_zero() {
        let payload: ChunkPayload = serde_json::from_value(serde_json::json!({
            "document_id": 7,
            "chunk_index": 0,
            "text": "Older point.",
            "chunk_length": 12,
        }))
        .unwrap();
        assert_eq!(payload.sequence, 0);
    }

    #[test]
    fn retrieval_result_from_payload() {
        let payload = ChunkPayload {
            document_id: 1,
            chunk_index: 0,
            text: "x".into(),
            chunk_length: 1,
            sequence: 0,
        };
        let r = RetrievalResult::from_payload(payload, 0.9);
        assert_eq!(r.document_id, 1);
        assert!((r.score - 0.9).abs() < f32::EPSILON);
    }
}
