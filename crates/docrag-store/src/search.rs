use serde::Deserialize;
use serde_json::{json, Value};

use docrag_core::types::SearchResult;

use crate::schema::SCORE_SCRIPT;
use crate::writer::StoredDocument;

/// Exact script-score query over every record, top `k` by shifted cosine.
pub fn script_score_query(vector: &[f32], k: usize) -> Value {
    json!({
        "size": k,
        "_source": ["text", "metadata"],
        "query": {
            "script_score": {
                "query": { "match_all": {} },
                "script": {
                    "source": SCORE_SCRIPT,
                    "params": { "query_vector": vector }
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub hits: Hits,
}

#[derive(Debug, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
pub struct Hit {
    #[serde(rename = "_score")]
    pub score: Option<f32>,
    #[serde(rename = "_source")]
    pub source: StoredDocument,
}

impl SearchResponse {
    /// Hits as results, best first, at most `k`.
    pub fn into_results(self, k: usize) -> Vec<SearchResult> {
        let mut results: Vec<SearchResult> = self
            .hits
            .hits
            .into_iter()
            .map(|hit| SearchResult { text: hit.source.text, metadata: hit.source.metadata, score: hit.score.unwrap_or(0.0) })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);
        results
    }
}
