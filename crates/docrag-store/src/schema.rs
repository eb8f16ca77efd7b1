use serde_json::{json, Value};

/// Painless script for shifted cosine scoring; keeps scores in `[0, 2]`.
pub const SCORE_SCRIPT: &str = "cosineSimilarity(params.query_vector, 'vector') + 1.0";

/// Fixed index mapping: analysed `text`, free-form `metadata` (with an exact
/// `source` and `ingest_generation` for replacement by file) and a
/// cosine-indexed `vector` of `dims`.
pub fn index_mapping(dims: usize) -> Value {
    json!({
        "mappings": {
            "properties": {
                "text": { "type": "text" },
                "metadata": {
                    "type": "object",
                    "properties": {
                        "source": { "type": "keyword" },
                        "page": { "type": "integer" },
                        "ingest_generation": { "type": "keyword" }
                    }
                },
                "vector": {
                    "type": "dense_vector",
                    "dims": dims,
                    "index": true,
                    "similarity": "cosine"
                }
            }
        }
    })
}
