use std::f32::consts::FRAC_PI_2;

pub const DEFAULT_GAIN: f32 = 10.0;

// largest f32 below 1.0; atan saturates to exactly pi/2 for huge inputs
const CEILING: f32 = 1.0 - f32::EPSILON / 2.0;

/// Arctangent soft clipper, output strictly inside (-1, 1).
pub fn apply(block: &mut [f32], gain: f32) {
  for x in block.iter_mut() {
    *x = ((*x * gain).atan() / FRAC_PI_2).clamp(-CEILING, CEILING);
  }
}
