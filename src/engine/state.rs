use std::sync::Arc;

use super::effects::{EffectKind, EffectSlot};
use super::soundpad::SoundpadMixer;

/// The only state the control side and the audio thread share: the requested
/// effect (atomic) and the soundpad (short lock). All DSP state stays owned by
/// the engine on the audio thread.
#[derive(Debug, Default)]
pub struct SharedState {
  effect: EffectSlot,
  soundpad: SoundpadMixer,
}

impl SharedState {
  pub fn new(effect: EffectKind, volume: f32) -> Arc<Self> {
    Arc::new(Self { effect: EffectSlot::new(effect), soundpad: SoundpadMixer::new(volume) })
  }

  #[inline]
  pub fn effect(&self) -> EffectKind { self.effect.load() }

  pub fn set_effect(&self, kind: EffectKind) { self.effect.store(kind) }

  pub fn soundpad(&self) -> &SoundpadMixer { &self.soundpad }
}
