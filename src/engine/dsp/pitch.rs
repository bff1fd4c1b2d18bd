//! Time-domain pitch shifter built from two crossfaded read taps on one delay buffer.
//!
//! The taps sweep through a fixed 60 ms window half a period apart. Each tap's
//! weight reaches zero exactly where its read offset jumps, so the wrap is never
//! heard. The window costs a fixed amount of latency and some smearing.

use std::f64::consts::PI;

const BUFFER_SECONDS: f64 = 0.2;
const WINDOW_SECONDS: f64 = 0.06;

pub const PITCH_UP_SEMITONES: f32 = 7.0;
pub const PITCH_DOWN_SEMITONES: f32 = -5.0;

pub struct PitchShifter {
  buf: Vec<f32>,
  wr: usize,
  // normalized sweep position, always in [0, 1)
  phase: f64,
  window: usize,
}

#[inline]
fn wrap_unit(x: f64) -> f64 {
  let w = x.rem_euclid(1.0);
  // rem_euclid can round up to exactly 1.0 for tiny negative inputs
  if w >= 1.0 { 0.0 } else { w }
}

impl PitchShifter {
  pub fn new(sample_rate: u32) -> Self {
    let sr = sample_rate as f64;
    let window = ((WINDOW_SECONDS * sr) as usize).max(2);
    let len = ((BUFFER_SECONDS * sr) as usize).max(window + 2);
    Self { buf: vec![0.0; len], wr: 0, phase: 0.0, window }
  }

  pub fn phase(&self) -> f64 { self.phase }

  /// Read window length in samples.
  pub fn window(&self) -> usize { self.window }

  #[inline]
  fn read_interpolated(&self, pos: f64) -> f32 {
    let len = self.buf.len();
    let i0 = (pos.floor() as usize) % len;
    let i1 = (i0 + 1) % len;
    let frac = (pos - pos.floor()) as f32;
    (1.0 - frac) * self.buf[i0] + frac * self.buf[i1]
  }

  pub fn apply(&mut self, block: &mut [f32], semitones: f32) {
    let n = block.len();
    if n == 0 { return; }
    let len = self.buf.len();

    // write the whole block first, wrapping at the buffer end
    let start = self.wr;
    for &x in block.iter() {
      self.buf[self.wr] = x;
      self.wr += 1;
      if self.wr >= len { self.wr = 0; }
    }

    let factor = 2f64.powf(semitones as f64 / 12.0);
    let rate = 1.0 - factor;
    let window = self.window as f64;
    let inc = rate / window;
    let base = self.phase;
    let len_f = len as f64;

    let mut last = base;
    for (i, out) in block.iter_mut().enumerate() {
      let p1 = wrap_unit(base + inc * i as f64);
      let p2 = wrap_unit(p1 + 0.5);
      let written = ((start + i) % len) as f64;
      let pos1 = (written - p1 * window).rem_euclid(len_f);
      let pos2 = (written - p2 * window).rem_euclid(len_f);
      let tap1 = self.read_interpolated(pos1);
      let tap2 = self.read_interpolated(pos2);
      let w1 = (p1 * PI - PI / 2.0).cos().powi(2) as f32;
      *out = w1 * tap1 + (1.0 - w1) * tap2;
      last = p1;
    }
    self.phase = wrap_unit(last + inc);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SR: u32 = 44_100;

  fn sine(freq: f32, len: usize) -> Vec<f32> {
    (0..len).map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin()).collect()
  }

  fn zero_crossings(block: &[f32]) -> usize {
    block.windows(2).filter(|w| (w[0] < 0.0) != (w[1] < 0.0)).count()
  }

  #[test]
  fn test_zero_semitones_is_a_fixed_delay() {
    let mut ps = PitchShifter::new(SR);
    assert_eq!(ps.window(), 2646);
    let offset = ps.window() / 2;
    let input = sine(440.0, 2048 * 4);
    let mut output = input.clone();
    for block in output.chunks_mut(2048) {
      ps.apply(block, 0.0);
    }
    assert_eq!(ps.phase(), 0.0);
    for i in offset..input.len() {
      assert!((output[i] - input[i - offset]).abs() < 1e-4, "sample {i}");
    }
  }

  #[test]
  fn test_phase_stays_in_unit_interval() {
    let mut ps = PitchShifter::new(SR);
    let mut block = sine(220.0, 2048);
    for k in 0..50 {
      let semis = if k % 2 == 0 { PITCH_UP_SEMITONES } else { PITCH_DOWN_SEMITONES };
      ps.apply(&mut block, semis);
      assert!(ps.phase() >= 0.0 && ps.phase() < 1.0);
    }
  }

  #[test]
  fn test_pitch_up_raises_frequency() {
    let mut ps = PitchShifter::new(SR);
    let input = sine(440.0, SR as usize * 2);
    let mut output = input.clone();
    for block in output.chunks_mut(2048) {
      ps.apply(block, PITCH_UP_SEMITONES);
    }
    let tail = SR as usize;
    let ratio = zero_crossings(&output[tail..]) as f32 / zero_crossings(&input[tail..]) as f32;
    assert!(ratio > 1.3 && ratio < 1.7, "ratio {ratio}");
  }

  #[test]
  fn test_pitch_down_lowers_frequency() {
    let mut ps = PitchShifter::new(SR);
    let input = sine(440.0, SR as usize * 2);
    let mut output = input.clone();
    for block in output.chunks_mut(2048) {
      ps.apply(block, PITCH_DOWN_SEMITONES);
    }
    let tail = SR as usize;
    let ratio = zero_crossings(&output[tail..]) as f32 / zero_crossings(&input[tail..]) as f32;
    assert!(ratio > 0.6 && ratio < 0.85, "ratio {ratio}");
  }

  #[test]
  fn test_block_by_block_matches_single_pass() {
    let input = sine(330.0, 4096);

    let mut whole = PitchShifter::new(SR);
    let mut expected = input.clone();
    whole.apply(&mut expected, PITCH_UP_SEMITONES);

    let mut chunked = PitchShifter::new(SR);
    let mut actual = input;
    for block in actual.chunks_mut(1024) {
      chunked.apply(block, PITCH_UP_SEMITONES);
    }
    for (a, b) in actual.iter().zip(expected.iter()) {
      assert!((a - b).abs() < 1e-4);
    }
  }
}
