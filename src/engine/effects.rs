use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// The voice effect applied after the pre-filter and gate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EffectKind {
  #[default]
  None = 0,
  Echo = 1,
  PitchUp = 2,
  PitchDown = 3,
  Radio = 4,
  Reverb = 5,
  Distortion = 6,
}

impl EffectKind {
  pub const ALL: [EffectKind; 7] = [
    EffectKind::None,
    EffectKind::Echo,
    EffectKind::PitchUp,
    EffectKind::PitchDown,
    EffectKind::Radio,
    EffectKind::Reverb,
    EffectKind::Distortion,
  ];

  /// Parses an effect identifier. Anything unrecognized selects `None`.
  pub fn from_name(name: &str) -> Self {
    match name.trim().to_ascii_lowercase().as_str() {
      "echo" => EffectKind::Echo,
      "pitch_up" => EffectKind::PitchUp,
      "pitch_down" => EffectKind::PitchDown,
      "radio" => EffectKind::Radio,
      "reverb" => EffectKind::Reverb,
      "distortion" => EffectKind::Distortion,
      _ => EffectKind::None,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      EffectKind::None => "none",
      EffectKind::Echo => "echo",
      EffectKind::PitchUp => "pitch_up",
      EffectKind::PitchDown => "pitch_down",
      EffectKind::Radio => "radio",
      EffectKind::Reverb => "reverb",
      EffectKind::Distortion => "distortion",
    }
  }

  fn from_index(index: u8) -> Self {
    Self::ALL.get(index as usize).copied().unwrap_or_default()
  }
}

impl std::fmt::Display for EffectKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// Lock-free holder for the selected effect, written by the control side and
/// read once per block by the audio thread.
#[derive(Debug, Default)]
pub struct EffectSlot(AtomicU8);

impl EffectSlot {
  pub fn new(kind: EffectKind) -> Self { Self(AtomicU8::new(kind as u8)) }

  #[inline]
  pub fn load(&self) -> EffectKind { EffectKind::from_index(self.0.load(Ordering::Acquire)) }

  #[inline]
  pub fn store(&self, kind: EffectKind) { self.0.store(kind as u8, Ordering::Release) }
}
