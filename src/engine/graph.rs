use std::sync::Arc;

use crate::config::EngineSettings;
use crate::engine::dsp::{
  delay::Echo,
  distortion,
  filter::BiquadCascadeFilter,
  gate,
  pitch::{PitchShifter, PITCH_DOWN_SEMITONES, PITCH_UP_SEMITONES},
  radio::Radio,
  reverb::ReverbUnit,
};
use crate::engine::effects::EffectKind;
use crate::engine::state::SharedState;
use crate::error::ConfigError;

pub const PRE_FILTER_ORDER: usize = 4;
pub const PRE_FILTER_CUTOFF: f32 = 100.0;
/// Final hard clip applied to every output block.
pub const OUTPUT_LIMIT: f32 = 0.9;

/// Per-block voice pipeline: high-pass, gate, selected effect, soundpad overlay.
///
/// Owns every piece of DSP state; the only thing it reads from other threads is
/// the [`SharedState`], once per block.
pub struct EffectEngine {
  shared: Arc<SharedState>,
  pre_filter: BiquadCascadeFilter,
  echo: Echo,
  pitch: PitchShifter,
  radio: Radio,
  reverb: ReverbUnit,
  gate_threshold: f32,
  soundpad_chunk: Vec<f32>,
  soundpad_len: usize,
  last_effect: EffectKind,
}

impl EffectEngine {
  pub fn new(settings: EngineSettings, shared: Arc<SharedState>) -> Result<Self, ConfigError> {
    let sr = settings.sample_rate;
    Ok(Self {
      shared,
      pre_filter: BiquadCascadeFilter::highpass(PRE_FILTER_ORDER, PRE_FILTER_CUTOFF, sr)?,
      echo: Echo::new(sr),
      pitch: PitchShifter::new(sr),
      radio: Radio::new(sr)?,
      reverb: ReverbUnit::new(sr),
      gate_threshold: gate::DEFAULT_THRESHOLD,
      soundpad_chunk: vec![0.0; settings.block_size],
      soundpad_len: 0,
      last_effect: EffectKind::None,
    })
  }

  pub fn shared(&self) -> &Arc<SharedState> { &self.shared }

  /// Effect used for the most recent block.
  pub fn last_effect(&self) -> EffectKind { self.last_effect }

  /// Soundpad contribution mixed into the most recent block.
  pub fn soundpad_chunk(&self) -> &[f32] { &self.soundpad_chunk[..self.soundpad_len] }

  /// Runs the pipeline over `block` in place. The block length is preserved;
  /// the final output clip is left to the caller.
  pub fn process(&mut self, block: &mut [f32]) {
    // read once so the whole block goes through a single effect
    let effect = self.shared.effect();
    self.last_effect = effect;

    self.pre_filter.apply(block);
    gate::apply(block, self.gate_threshold);

    match effect {
      EffectKind::None => {}
      EffectKind::Echo => self.echo.apply(block),
      EffectKind::PitchUp => self.pitch.apply(block, PITCH_UP_SEMITONES),
      EffectKind::PitchDown => self.pitch.apply(block, PITCH_DOWN_SEMITONES),
      EffectKind::Radio => self.radio.apply(block),
      EffectKind::Reverb => self.reverb.apply(block),
      EffectKind::Distortion => distortion::apply(block, distortion::DEFAULT_GAIN),
    }

    let n = block.len();
    if self.soundpad_chunk.len() < n {
      // only reached when a caller hands over a block larger than configured
      log::warn!("block of {} samples exceeds configured size {}", n, self.soundpad_chunk.len());
      self.soundpad_chunk.resize(n, 0.0);
    }
    let chunk = &mut self.soundpad_chunk[..n];
    self.shared.soundpad().next_chunk(chunk);
    for (x, s) in block.iter_mut().zip(chunk.iter()) {
      *x += *s;
    }
    self.soundpad_len = n;
  }
}

/// Hard clip to `[-limit, limit]`.
#[inline]
pub fn clip_output(block: &mut [f32], limit: f32) {
  for x in block.iter_mut() {
    *x = x.clamp(-limit, limit);
  }
}
