//! Butterworth IIR filters evaluated as a cascade of second-order sections.
//!
//! Each section runs in transposed direct form II with its two history words kept
//! in `f64`, so filtering a stream block by block gives the same result as
//! filtering it in one call.

use std::f64::consts::PI;

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug)]
struct Section {
  b0: f64,
  b1: f64,
  b2: f64,
  a1: f64,
  a2: f64,
  z1: f64,
  z2: f64,
}

impl Section {
  // RBJ cookbook low-pass, normalized by a0
  fn lowpass(w0: f64, q: f64) -> Self {
    let (sin_w0, cos_w0) = w0.sin_cos();
    let alpha = sin_w0 / (2.0 * q);
    let a0 = 1.0 + alpha;
    let b1 = (1.0 - cos_w0) / a0;
    Self { b0: b1 * 0.5, b1, b2: b1 * 0.5, a1: -2.0 * cos_w0 / a0, a2: (1.0 - alpha) / a0, z1: 0.0, z2: 0.0 }
  }

  fn highpass(w0: f64, q: f64) -> Self {
    let (sin_w0, cos_w0) = w0.sin_cos();
    let alpha = sin_w0 / (2.0 * q);
    let a0 = 1.0 + alpha;
    let b0 = (1.0 + cos_w0) * 0.5 / a0;
    Self { b0, b1: -2.0 * b0, b2: b0, a1: -2.0 * cos_w0 / a0, a2: (1.0 - alpha) / a0, z1: 0.0, z2: 0.0 }
  }

  #[inline]
  fn tick(&mut self, x: f64) -> f64 {
    let y = self.b0 * x + self.z1;
    self.z1 = self.b1 * x - self.a1 * y + self.z2;
    self.z2 = self.b2 * x - self.a2 * y;
    y
  }
}

#[derive(Clone, Copy)]
enum Response {
  Low,
  High,
}

/// Stateful Butterworth filter. Coefficients are fixed at construction; the
/// history (two words per section) is carried from one `apply` call to the next.
#[derive(Clone, Debug)]
pub struct BiquadCascadeFilter {
  sections: Vec<Section>,
}

impl BiquadCascadeFilter {
  /// Butterworth high-pass of the given (even) order.
  pub fn highpass(order: usize, cutoff: f32, sample_rate: u32) -> Result<Self, ConfigError> {
    let sections = butterworth(Response::High, order, cutoff, sample_rate)?;
    Ok(Self { sections })
  }

  /// Butterworth low-pass of the given (even) order.
  pub fn lowpass(order: usize, cutoff: f32, sample_rate: u32) -> Result<Self, ConfigError> {
    let sections = butterworth(Response::Low, order, cutoff, sample_rate)?;
    Ok(Self { sections })
  }

  /// Band-pass built as a high-pass at `low` followed by a low-pass at `high`,
  /// each of the given order.
  pub fn bandpass(order: usize, low: f32, high: f32, sample_rate: u32) -> Result<Self, ConfigError> {
    if low >= high {
      return Err(ConfigError::InvertedBand { low, high });
    }
    let mut band = Self::highpass(order, low, sample_rate)?;
    band.sections.extend(Self::lowpass(order, high, sample_rate)?.sections);
    Ok(band)
  }

  /// Filters `block` in place, continuing from the state left by the previous call.
  pub fn apply(&mut self, block: &mut [f32]) {
    for x in block.iter_mut() {
      let mut y = *x as f64;
      for s in self.sections.iter_mut() {
        y = s.tick(y);
      }
      *x = y as f32;
    }
  }

  /// Number of history words carried between blocks.
  pub fn history_len(&self) -> usize {
    self.sections.len() * 2
  }

  pub fn reset(&mut self) {
    for s in self.sections.iter_mut() {
      s.z1 = 0.0;
      s.z2 = 0.0;
    }
  }
}

fn butterworth(response: Response, order: usize, cutoff: f32, sample_rate: u32) -> Result<Vec<Section>, ConfigError> {
  if order == 0 || order % 2 != 0 {
    return Err(ConfigError::InvalidOrder(order));
  }
  if sample_rate == 0 {
    return Err(ConfigError::InvalidSampleRate(sample_rate));
  }
  let nyquist = sample_rate as f32 * 0.5;
  if !(cutoff > 0.0 && cutoff < nyquist) {
    return Err(ConfigError::CutoffOutOfRange { cutoff, nyquist });
  }
  let w0 = 2.0 * PI * cutoff as f64 / sample_rate as f64;
  let n = order as f64;
  let sections = (1..=order / 2)
    .map(|k| {
      // pole-pair quality factor of the analog Butterworth prototype
      let q = 1.0 / (2.0 * ((2.0 * k as f64 - 1.0) * PI / (2.0 * n)).sin());
      match response {
        Response::Low => Section::lowpass(w0, q),
        Response::High => Section::highpass(w0, q),
      }
    })
    .collect();
  Ok(sections)
}
