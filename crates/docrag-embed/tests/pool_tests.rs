use candle_core::{DType, Device, Tensor};
use docrag_embed::{l2_normalize, masked_mean, masked_mean_l2};

fn rows(t: &Tensor) -> Vec<Vec<f32>> { t.to_vec2().unwrap() }

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (a, b) in actual.iter().zip(expected) {
        assert!((a - b).abs() < 1e-5, "{actual:?} != {expected:?}");
    }
}

#[test]
fn each_row_uses_its_own_mask() {
    let dev = Device::Cpu;
    // [2, 3, 2]: row 0 keeps tokens 0 and 1, row 1 keeps only token 2.
    let hidden = Tensor::from_slice(
        &[1.0f32, 3.0, 3.0, 5.0, 100.0, 100.0, 9.0, 9.0, 9.0, 9.0, 0.0, 2.0],
        (2, 3, 2),
        &dev,
    )
    .unwrap();
    let mask = Tensor::from_slice(&[1u32, 1, 0, 0, 0, 1], (2, 3), &dev).unwrap();

    let mean = rows(&masked_mean(&hidden, &mask).unwrap());
    assert_close(&mean[0], &[2.0, 4.0]);
    assert_close(&mean[1], &[0.0, 2.0]);

    let pooled = rows(&masked_mean_l2(&hidden, &mask).unwrap());
    let n = 20f32.sqrt();
    assert_close(&pooled[0], &[2.0 / n, 4.0 / n]);
    assert_close(&pooled[1], &[0.0, 1.0]);
}

#[test]
fn fully_masked_row_pools_to_zeros() {
    let dev = Device::Cpu;
    let hidden = Tensor::ones((1, 2, 3), DType::F32, &dev).unwrap();
    let mask = Tensor::zeros((1, 2), DType::F32, &dev).unwrap();

    let pooled = rows(&masked_mean_l2(&hidden, &mask).unwrap());

    assert_close(&pooled[0], &[0.0, 0.0, 0.0]);
    assert!(pooled[0].iter().all(|v| v.is_finite()));
}

#[test]
fn normalized_rows_have_unit_length() {
    let dev = Device::Cpu;
    let t = Tensor::from_slice(&[3.0f32, 4.0, 0.0, 5.0], (2, 2), &dev).unwrap();

    let out = rows(&l2_normalize(&t).unwrap());

    assert_close(&out[0], &[0.6, 0.8]);
    assert_close(&out[1], &[0.0, 1.0]);
}

#[test]
fn shape_errors_are_reported() {
    let dev = Device::Cpu;
    let flat = Tensor::zeros((2, 4), DType::F32, &dev).unwrap();
    let hidden = Tensor::zeros((2, 3, 4), DType::F32, &dev).unwrap();

    assert!(masked_mean(&flat, &Tensor::ones((2, 4), DType::F32, &dev).unwrap()).is_err());
    assert!(masked_mean(&hidden, &Tensor::ones((2, 2), DType::F32, &dev).unwrap()).is_err());
    assert!(l2_normalize(&hidden).is_err());
}
