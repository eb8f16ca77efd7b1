//! Sentence embeddings for documents and queries.
//!
//! `SentenceEmbedder` runs a BERT-family encoder (all-MiniLM-L6-v2 by default)
//! through candle with masked mean pooling. `FakeEmbedder` is selected with
//! `APP_USE_FAKE_EMBEDDINGS=1` or `embedding.use_fake = true` for fast,
//! deterministic runs without model weights.
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;
use tracing::{info, warn};

use docrag_core::config::EmbeddingConfig;
pub use docrag_core::traits::Embedder;

pub mod device;
pub mod fake;
pub mod pool;
pub mod tokenize;

pub use fake::FakeEmbedder;
pub use pool::{l2_normalize, masked_mean, masked_mean_l2};

pub struct SentenceEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize }

impl SentenceEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = device::select_device();
        info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;
        let dim = config.hidden_size;
        info!(dim, "embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let (input_ids, attention_mask) = tokenize::tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        if emb.len() != self.dim {
            return Err(anyhow!("expected {} dimensions, model produced {}", self.dim, emb.len()));
        }
        Ok(emb)
    }
}

impl Embedder for SentenceEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_text(t)).collect()
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the weights file is not modified while the model is alive.
        return Ok(unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DTYPE, device)? });
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let weights = candle_core::pickle::read_all(&pickle)?;
        let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
        return Ok(VarBuilder::from_tensors(weights_map, DTYPE, device));
    }
    Err(anyhow!("no model.safetensors or pytorch_model.bin in {}", model_dir.display()))
}

fn fake_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    if config.use_fake || fake_requested() {
        info!(dim = config.dimension, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(config.dimension)));
    }
    let model_dir = resolve_model_dir(config)?;
    let embedder = SentenceEmbedder::load(&model_dir, config.max_len)?;
    if embedder.dim() != config.dimension {
        warn!(configured = config.dimension, actual = embedder.dim(), "embedding dimension differs from config; using the model's");
    }
    Ok(Arc::new(embedder))
}

fn resolve_model_dir(config: &EmbeddingConfig) -> Result<std::path::PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = std::path::PathBuf::from(&dir);
        if p.exists() { info!(dir = %p.display(), "using APP_MODEL_DIR"); return Ok(p); }
    }
    let p = config.resolved_model_dir();
    if p.exists() { return Ok(p); }
    Err(anyhow!("Could not locate model directory for '{}' (looked in {})", config.model, p.display()))
}
