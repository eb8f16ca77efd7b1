use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use docrag_core::types::{DocumentChunk, Metadata};
use docrag_core::{Error, Result};

/// Stored `_source` of one record.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredDocument {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vector: Vec<f32>,
}

/// Appends one action line and one source line to an NDJSON bulk body.
pub fn push_action(body: &mut String, index: &str, chunk: &DocumentChunk, vector: Vec<f32>) -> Result<()> {
    let action = json!({ "index": { "_index": index } });
    let doc = StoredDocument { text: chunk.text.clone(), metadata: chunk.metadata.clone(), vector };
    let doc = serde_json::to_string(&doc).map_err(|e| Error::Backend(e.to_string()))?;
    body.push_str(&action.to_string());
    body.push('\n');
    body.push_str(&doc);
    body.push('\n');
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
pub struct BulkItem {
    pub status: u16,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl BulkResponse {
    /// `(stored, rejected)` item counts.
    pub fn tally(&self) -> (usize, usize) {
        let stored = self
            .items
            .iter()
            .flat_map(|item| item.values())
            .filter(|item| (200..300).contains(&item.status) && item.error.is_none())
            .count();
        (stored, self.items.len() - stored)
    }

    pub fn first_error(&self) -> Option<String> {
        self.items.iter().flat_map(|item| item.values()).find_map(|item| item.error.as_ref().map(|e| e.to_string()))
    }
}
