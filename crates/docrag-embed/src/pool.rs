use anyhow::{ensure, Result};
use candle_core::{DType, Tensor, D};

/// Average of the token states in `hidden` `[B,T,H]` where `attention_mask`
/// `[B,T]` is non-zero. A row with no unmasked token pools to zeros.
pub fn masked_mean(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    ensure!(hidden.rank() == 3, "hidden shape must be [B,T,H], got {:?}", hidden.dims());
    let (batch, tokens, _) = hidden.dims3()?;
    ensure!(
        attention_mask.dims() == [batch, tokens],
        "attention mask shape {:?} does not match [{batch}, {tokens}]",
        attention_mask.dims()
    );
    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&mask.unsqueeze(2)?)?.sum(1)?;
    let counts = mask.sum_keepdim(1)?.maximum(1f64)?;
    Ok(summed.broadcast_div(&counts)?)
}

/// Scales every row of `[B,H]` to unit length; zero rows stay zero.
pub fn l2_normalize(rows: &Tensor) -> Result<Tensor> {
    ensure!(rows.rank() == 2, "expected [B,H], got {:?}", rows.dims());
    let eps = if rows.dtype() == DType::F16 { 1e-6 } else { 1e-12 };
    let norms = rows.sqr()?.sum_keepdim(D::Minus1)?.sqrt()?.maximum(eps)?;
    Ok(rows.broadcast_div(&norms)?)
}

/// Sentence embedding: masked mean followed by L2 normalisation.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    l2_normalize(&masked_mean(hidden, attention_mask)?)
}
