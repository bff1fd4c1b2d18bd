use std::time::{SystemTime, UNIX_EPOCH};

use super::filter::BiquadCascadeFilter;
use crate::error::ConfigError;

const BAND_LOW: f32 = 400.0;
const BAND_HIGH: f32 = 3000.0;
const NOISE_SIGMA: f32 = 0.005;
const DRIVE: f32 = 2.0;
pub const RADIO_LIMIT: f32 = 0.7;

// xorshift32 feeding a Box-Muller gaussian
struct NoiseSource {
  state: u32,
  spare: Option<f32>,
}

impl NoiseSource {
  fn seeded() -> Self {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.subsec_nanos()).unwrap_or(0x9e37_79b9);
    Self { state: nanos | 1, spare: None }
  }

  #[inline]
  fn next_u32(&mut self) -> u32 {
    let mut x = self.state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    self.state = x;
    x
  }

  // uniform in (0, 1]
  #[inline]
  fn next_unit(&mut self) -> f32 {
    ((self.next_u32() >> 8) as f32 + 1.0) / 16_777_216.0
  }

  fn next_gaussian(&mut self) -> f32 {
    if let Some(z) = self.spare.take() { return z; }
    let u1 = self.next_unit();
    let u2 = self.next_unit();
    let r = (-2.0 * u1.ln()).sqrt();
    let theta = std::f32::consts::TAU * u2;
    self.spare = Some(r * theta.sin());
    r * theta.cos()
  }
}

/// Band-limited, noisy, overdriven "walkie-talkie" voice.
pub struct Radio {
  band: BiquadCascadeFilter,
  noise: NoiseSource,
}

impl Radio {
  pub fn new(sample_rate: u32) -> Result<Self, ConfigError> {
    Ok(Self {
      band: BiquadCascadeFilter::bandpass(4, BAND_LOW, BAND_HIGH, sample_rate)?,
      noise: NoiseSource::seeded(),
    })
  }

  pub fn apply(&mut self, block: &mut [f32]) {
    self.band.apply(block);
    for x in block.iter_mut() {
      let noisy = *x + self.noise.next_gaussian() * NOISE_SIGMA;
      *x = (noisy * DRIVE).clamp(-RADIO_LIMIT, RADIO_LIMIT);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_output_is_hard_limited() {
    let mut radio = Radio::new(44_100).unwrap();
    let mut block: Vec<f32> = (0..8192).map(|i| 5.0 * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 44_100.0).sin()).collect();
    radio.apply(&mut block);
    assert!(block.iter().all(|x| x.abs() <= RADIO_LIMIT));
    assert!(block.iter().any(|x| x.abs() == RADIO_LIMIT));
  }

  #[test]
  fn test_silence_turns_into_low_noise() {
    let mut radio = Radio::new(44_100).unwrap();
    let mut block = vec![0.0f32; 44_100];
    radio.apply(&mut block);
    let mean = block.iter().sum::<f32>() / block.len() as f32;
    let std = (block.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / block.len() as f32).sqrt();
    assert!(mean.abs() < 1e-3);
    // noise sigma doubled by the drive stage
    assert!((std - NOISE_SIGMA * DRIVE).abs() < 1e-3, "std {std}");
  }

  #[test]
  fn test_gaussian_source_statistics() {
    let mut noise = NoiseSource { state: 12345, spare: None };
    let n = 100_000;
    let samples: Vec<f32> = (0..n).map(|_| noise.next_gaussian()).collect();
    let mean = samples.iter().sum::<f32>() / n as f32;
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n as f32;
    assert!(mean.abs() < 0.02);
    assert!((var - 1.0).abs() < 0.03);
  }
}
