use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Token ids and attention mask as `[1, T]` tensors, truncated to `max_len`.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len { ids.truncate(max_len); mask.truncate(max_len); }
    let len = ids.len();
    let input_ids = Tensor::from_vec(ids, (1, len), device)?;
    let attention_mask = Tensor::from_vec(mask, (1, len), device)?;
    Ok((input_ids, attention_mask))
}
