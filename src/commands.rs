use std::sync::Arc;

use crate::clip::{resample, SoundLibrary};
use crate::engine::effects::EffectKind;
use crate::engine::state::SharedState;
use crate::error::{ClipError, ClipResult};

pub use crate::engine::soundpad::SoundpadStatus as Status;

/// Control surface over the running engine. Every call completes synchronously
/// and only touches [`SharedState`]; a later call simply overwrites an earlier one.
#[derive(Clone)]
pub struct Controller {
  shared: Arc<SharedState>,
  library: SoundLibrary,
  sample_rate: u32,
}

impl Controller {
  pub fn new(shared: Arc<SharedState>, library: SoundLibrary, sample_rate: u32) -> Self {
    Self { shared, library, sample_rate }
  }

  pub fn shared(&self) -> &Arc<SharedState> { &self.shared }

  pub fn library(&self) -> &SoundLibrary { &self.library }

  /// Selects an effect by name. Unknown names select `none`; the applied
  /// effect is returned.
  pub fn set_effect(&self, name: &str) -> EffectKind {
    let kind = EffectKind::from_name(name);
    if kind.name() != name.trim().to_ascii_lowercase() {
      log::warn!("Unknown effect '{}', using '{}'", name, kind);
    }
    self.shared.set_effect(kind);
    log::info!("Effect set to {}", kind);
    kind
  }

  pub fn effect(&self) -> EffectKind { self.shared.effect() }

  /// Starts a mono clip recorded at `sample_rate`, resampling it to the engine
  /// rate first. A clip that is empty, before or after resampling, is rejected
  /// and leaves playback as it was.
  pub fn play_sound(&self, samples: &[f32], sample_rate: u32) -> ClipResult<usize> {
    let clip = if sample_rate == self.sample_rate { samples.to_vec() } else { resample(samples, sample_rate, self.sample_rate) };
    if clip.is_empty() {
      return Err(ClipError::Empty);
    }
    let len = self.shared.soundpad().play_mono(clip);
    log::info!("Soundpad playing {} samples", len);
    Ok(len)
  }

  /// Looks up, decodes and plays a clip from the sound library. Nothing
  /// changes if any step fails.
  pub fn play_sound_id(&self, id: &str) -> ClipResult<usize> {
    let clip = self.library.load(id)?;
    let rate = clip.sample_rate;
    self.play_sound(&clip.samples, rate)
  }

  pub fn stop_sound(&self) {
    self.shared.soundpad().stop();
    log::info!("Soundpad stopped");
  }

  /// Clamped to [0, 1]; non-finite values reset to the default. Returns the applied volume.
  pub fn set_volume(&self, volume: f32) -> f32 { self.shared.soundpad().set_volume(volume) }

  pub fn status(&self) -> Status { self.shared.soundpad().status() }

  pub fn sounds(&self) -> Vec<String> { self.library.list() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::soundpad::DEFAULT_VOLUME;

  fn controller() -> Controller {
    Controller::new(SharedState::new(EffectKind::None, DEFAULT_VOLUME), SoundLibrary::new("/no/such/dir"), 44_100)
  }

  #[test]
  fn test_set_effect_falls_back_to_none() {
    let c = controller();
    assert_eq!(c.set_effect("reverb"), EffectKind::Reverb);
    assert_eq!(c.effect(), EffectKind::Reverb);
    assert_eq!(c.set_effect("chipmunk"), EffectKind::None);
    assert_eq!(c.effect(), EffectKind::None);
  }

  #[test]
  fn test_play_stop_and_status() {
    let c = controller();
    assert_eq!(c.status(), Status { playing: false, volume: DEFAULT_VOLUME });
    assert_eq!(c.play_sound(&[0.1; 441], 44_100).unwrap(), 441);
    assert!(c.status().playing);
    c.stop_sound();
    assert!(!c.status().playing);
  }

  #[test]
  fn test_play_sound_resamples_to_engine_rate() {
    let c = controller();
    assert_eq!(c.play_sound(&[0.1; 22_050], 22_050).unwrap(), 44_100);
  }

  #[test]
  fn test_failures_leave_playback_untouched() {
    let c = controller();
    c.play_sound(&[0.1; 4410], 44_100).unwrap();
    assert!(matches!(c.play_sound(&[], 44_100), Err(ClipError::Empty)));
    assert!(matches!(c.play_sound_id("airhorn"), Err(ClipError::NotFound(_))));
    assert!(c.status().playing);
  }

  #[test]
  fn test_clip_resampled_to_nothing_is_rejected() {
    let c = controller();
    c.play_sound(&[0.1; 4410], 44_100).unwrap();
    assert!(matches!(c.play_sound(&[0.5], 48_000), Err(ClipError::Empty)));
    assert!(c.status().playing);
  }

  #[test]
  fn test_volume_clamps() {
    let c = controller();
    assert_eq!(c.set_volume(2.0), 1.0);
    assert_eq!(c.set_volume(f32::INFINITY), DEFAULT_VOLUME);
    assert_eq!(c.status().volume, DEFAULT_VOLUME);
  }

  #[test]
  fn test_status_serializes() {
    let c = controller();
    let json = serde_json::to_string(&c.status()).unwrap();
    assert_eq!(json, r#"{"playing":false,"volume":0.7}"#);
  }
}
