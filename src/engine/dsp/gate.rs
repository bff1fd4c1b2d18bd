//! Soft noise gate. Each block is judged on its own RMS; there is no envelope
//! carried between blocks, so a signal hovering at the threshold can chatter.

pub const DEFAULT_THRESHOLD: f32 = 0.005;

pub fn rms(block: &[f32]) -> f32 {
  if block.is_empty() { return 0.0; }
  let sum: f64 = block.iter().map(|&x| (x as f64) * (x as f64)).sum();
  (sum / block.len() as f64).sqrt() as f32
}

/// Scales a block whose RMS is under `threshold` by `(rms / threshold)^2`;
/// louder blocks pass through untouched.
pub fn apply(block: &mut [f32], threshold: f32) {
  let level = rms(block);
  if level < threshold {
    let gain = (level / threshold).powi(2);
    for x in block.iter_mut() { *x *= gain; }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_silence_stays_silent() {
    let mut block = vec![0.0f32; 2048];
    apply(&mut block, DEFAULT_THRESHOLD);
    assert!(block.iter().all(|&x| x == 0.0));
  }

  #[test]
  fn test_loud_block_passes_unchanged() {
    let original: Vec<f32> = (0..2048).map(|i| if i % 2 == 0 { 0.1 } else { -0.1 }).collect();
    let mut block = original.clone();
    apply(&mut block, DEFAULT_THRESHOLD);
    assert_eq!(block, original);
  }

  #[test]
  fn test_quiet_block_is_attenuated_quadratically() {
    // constant magnitude 0.0025 has RMS exactly half the threshold
    let mut block: Vec<f32> = (0..1024).map(|i| if i % 2 == 0 { 0.0025 } else { -0.0025 }).collect();
    apply(&mut block, DEFAULT_THRESHOLD);
    for &x in &block {
      assert!((x.abs() - 0.0025 * 0.25).abs() < 1e-7);
    }
  }

  #[test]
  fn test_empty_block() {
    let mut block: Vec<f32> = Vec::new();
    apply(&mut block, DEFAULT_THRESHOLD);
    assert!(block.is_empty());
  }
}
