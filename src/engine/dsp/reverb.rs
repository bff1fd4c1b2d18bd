use super::delay::DelayLine;

// Mutually incommensurate comb lengths avoid a periodic, metallic ring.
const COMB_SECONDS: [f64; 4] = [0.0297, 0.0371, 0.0411, 0.0437];
const COMB_FEEDBACK: f32 = 0.7;
const DRY: f32 = 0.5;
const WET: f32 = 0.5;

/// Four parallel feedback combs averaged into the wet signal, mixed 50/50 with dry.
pub struct ReverbUnit {
  combs: [DelayLine; 4],
}

impl ReverbUnit {
  pub fn new(sample_rate: u32) -> Self {
    let sr = sample_rate as f64;
    Self { combs: COMB_SECONDS.map(|s| DelayLine::new((s * sr) as usize)) }
  }

  pub fn comb_lengths(&self) -> [usize; 4] {
    [self.combs[0].capacity(), self.combs[1].capacity(), self.combs[2].capacity(), self.combs[3].capacity()]
  }

  pub fn apply(&mut self, block: &mut [f32]) {
    for x in block.iter_mut() {
      let dry = *x;
      let mut sum = 0.0f32;
      for comb in self.combs.iter_mut() {
        let delayed = comb.read_current();
        comb.write(dry + delayed * COMB_FEEDBACK);
        sum += delayed;
      }
      *x = DRY * dry + WET * (sum * 0.25);
    }
  }
}
