/// Fixed-capacity circular sample buffer with a single write cursor.
///
/// Reading the current slot before writing to it returns the sample written one
/// full ring length earlier.
#[derive(Clone, Debug)]
pub struct DelayLine {
  buf: Vec<f32>,
  wr: usize,
}

impl DelayLine {
  pub fn new(capacity: usize) -> Self {
    Self { buf: vec![0.0; capacity.max(1)], wr: 0 }
  }

  #[inline]
  pub fn capacity(&self) -> usize { self.buf.len() }

  #[inline]
  pub fn write_index(&self) -> usize { self.wr }

  /// Sample written `offset` steps before the current write slot.
  #[inline]
  pub fn read(&self, offset: usize) -> f32 {
    let len = self.buf.len();
    self.buf[(self.wr + len - offset % len) % len]
  }

  /// Oldest sample in the ring, i.e. the slot about to be overwritten.
  #[inline]
  pub fn read_current(&self) -> f32 { self.buf[self.wr] }

  /// Store `x` in the current slot and advance.
  #[inline]
  pub fn write(&mut self, x: f32) {
    self.buf[self.wr] = x;
    self.wr += 1;
    if self.wr >= self.buf.len() { self.wr = 0; }
  }
}

pub const ECHO_DELAY_SECONDS: f32 = 0.4;
pub const ECHO_FEEDBACK: f32 = 0.4;
const ECHO_MAX_SECONDS: f32 = 2.0;

/// Recirculating echo: the feedback path is written back into the line, so every
/// repeat is attenuated by `feedback` relative to the previous one.
pub struct Echo {
  line: DelayLine,
  sr: f32,
}

impl Echo {
  pub fn new(sample_rate: u32) -> Self {
    let sr = sample_rate as f32;
    Self { line: DelayLine::new((sr * ECHO_MAX_SECONDS) as usize), sr }
  }

  pub fn apply(&mut self, block: &mut [f32]) {
    self.apply_with(block, ECHO_DELAY_SECONDS, ECHO_FEEDBACK);
  }

  pub fn apply_with(&mut self, block: &mut [f32], delay_seconds: f32, feedback: f32) {
    let delay = ((delay_seconds.max(0.0) * self.sr) as usize).min(self.line.capacity());
    for x in block.iter_mut() {
      let delayed = self.line.read(delay);
      let y = *x + delayed * feedback;
      self.line.write(y);
      *x = y;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_delay_line_wraps_write_index() {
    let mut line = DelayLine::new(4);
    for i in 0..10 {
      assert!(line.write_index() < line.capacity());
      line.write(i as f32);
    }
    assert_eq!(line.write_index(), 10 % 4);
  }

  #[test]
  fn test_read_current_is_one_ring_behind() {
    let mut line = DelayLine::new(3);
    line.write(1.0);
    line.write(2.0);
    line.write(3.0);
    assert_eq!(line.read_current(), 1.0);
    line.write(4.0);
    assert_eq!(line.read_current(), 2.0);
    assert_eq!(line.read(1), 4.0);
    assert_eq!(line.read(2), 3.0);
  }

  #[test]
  fn test_echo_impulse_repeats_with_feedback() {
    let sr = 1000;
    let mut echo = Echo::new(sr);
    let delay = (ECHO_DELAY_SECONDS * sr as f32) as usize;
    let mut stream = vec![0.0f32; delay * 3 + 1];
    stream[0] = 1.0;
    echo.apply(&mut stream);

    assert!((stream[0] - 1.0).abs() < 1e-6);
    assert!((stream[delay] - ECHO_FEEDBACK).abs() < 1e-6);
    assert!((stream[2 * delay] - ECHO_FEEDBACK * ECHO_FEEDBACK).abs() < 1e-6);
    assert!(stream[delay / 2].abs() < 1e-6);
  }

  #[test]
  fn test_echo_block_by_block_matches_single_pass() {
    let sr = 8000;
    let signal: Vec<f32> = (0..sr as usize).map(|i| ((i * 7919) % 13) as f32 / 13.0 - 0.5).collect();

    let mut whole = Echo::new(sr);
    let mut expected = signal.clone();
    whole.apply(&mut expected);

    let mut chunked = Echo::new(sr);
    let mut actual = signal;
    for block in actual.chunks_mut(333) {
      chunked.apply(block);
    }
    assert_eq!(actual, expected);
  }
}
