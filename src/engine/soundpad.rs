use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

pub const CLIP_PEAK: f32 = 0.7;
pub const DEFAULT_VOLUME: f32 = 0.7;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SoundpadStatus {
  pub playing: bool,
  pub volume: f32,
}

#[derive(Debug)]
struct SoundpadState {
  clip: Vec<f32>,
  cursor: usize,
  playing: bool,
  volume: f32,
}

/// Overlay clip player shared between the control side and the audio thread.
///
/// Every method takes the lock only long enough to swap or copy plain data, so
/// both sides always see a whole clip. A finished clip is only marked idle on the
/// audio thread; its storage is released by the next `play`/`stop` call.
#[derive(Debug)]
pub struct SoundpadMixer {
  state: Mutex<SoundpadState>,
}

impl SoundpadMixer {
  pub fn new(volume: f32) -> Self {
    Self {
      state: Mutex::new(SoundpadState { clip: Vec::new(), cursor: 0, playing: false, volume: clamp_volume(volume) }),
    }
  }

  // the state is plain data and consistent at every unlock, so a poisoned lock is still usable
  fn lock(&self) -> MutexGuard<'_, SoundpadState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Installs an interleaved clip with `channels` channels, downmixed to mono and
  /// peak-normalized to [`CLIP_PEAK`]. Returns the clip length in samples.
  pub fn play(&self, samples: &[f32], channels: usize) -> usize {
    self.play_mono(prepare_clip(samples, channels))
  }

  /// Installs an already mono clip, normalizing it in place before taking the lock.
  pub fn play_mono(&self, mut clip: Vec<f32>) -> usize {
    normalize(&mut clip);
    let len = clip.len();
    let old = {
      let mut st = self.lock();
      st.cursor = 0;
      st.playing = len > 0;
      std::mem::replace(&mut st.clip, clip)
    };
    drop(old);
    len
  }

  pub fn stop(&self) {
    let old = {
      let mut st = self.lock();
      st.cursor = 0;
      st.playing = false;
      std::mem::take(&mut st.clip)
    };
    drop(old);
  }

  /// Sets the playback volume, clamped to [0, 1]. Returns the applied value.
  pub fn set_volume(&self, volume: f32) -> f32 {
    let v = clamp_volume(volume);
    self.lock().volume = v;
    v
  }

  pub fn status(&self) -> SoundpadStatus {
    let st = self.lock();
    SoundpadStatus { playing: st.playing, volume: st.volume }
  }

  pub fn is_playing(&self) -> bool { self.lock().playing }

  /// Fills `out` with the next stretch of the clip scaled by the volume, padding
  /// with silence past the end. Returns how many clip samples were consumed.
  /// Never allocates.
  pub fn next_chunk(&self, out: &mut [f32]) -> usize {
    let mut st = self.lock();
    if !st.playing {
      out.fill(0.0);
      return 0;
    }
    let start = st.cursor;
    let n = (st.clip.len() - start).min(out.len());
    let vol = st.volume;
    for (o, s) in out[..n].iter_mut().zip(&st.clip[start..start + n]) {
      *o = s * vol;
    }
    out[n..].fill(0.0);
    st.cursor += n;
    if st.cursor >= st.clip.len() {
      st.playing = false;
      st.cursor = 0;
    }
    n
  }
}

impl Default for SoundpadMixer {
  fn default() -> Self { Self::new(DEFAULT_VOLUME) }
}

fn clamp_volume(v: f32) -> f32 {
  if v.is_finite() { v.clamp(0.0, 1.0) } else { DEFAULT_VOLUME }
}

/// Averages interleaved frames down to one channel.
pub fn prepare_clip(samples: &[f32], channels: usize) -> Vec<f32> {
  let channels = channels.max(1);
  if channels == 1 {
    return samples.to_vec();
  }
  samples
    .chunks_exact(channels)
    .map(|frame| frame.iter().sum::<f32>() / channels as f32)
    .collect()
}

fn normalize(clip: &mut [f32]) {
  let peak = clip.iter().fold(0.0f32, |m, x| m.max(x.abs()));
  if peak > 0.0 {
    let gain = CLIP_PEAK / peak;
    for s in clip.iter_mut() { *s *= gain; }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_idle_mixer_returns_silence() {
    let mixer = SoundpadMixer::default();
    let mut out = vec![1.0f32; 64];
    assert_eq!(mixer.next_chunk(&mut out), 0);
    assert!(out.iter().all(|&x| x == 0.0));
    assert!(!mixer.status().playing);
  }

  #[test]
  fn test_clip_is_normalized_and_scaled_by_volume() {
    let mixer = SoundpadMixer::new(0.5);
    mixer.play(&[0.1, -0.2, 0.05], 1);
    let mut out = vec![0.0f32; 3];
    mixer.next_chunk(&mut out);
    assert!((out[1] + CLIP_PEAK * 0.5).abs() < 1e-6);
    assert!((out[0] - CLIP_PEAK * 0.25).abs() < 1e-6);
  }

  #[test]
  fn test_stereo_clip_is_downmixed() {
    let clip = prepare_clip(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2);
    assert_eq!(clip, vec![0.5, 0.5, 0.0]);
  }

  #[test]
  fn test_short_clip_is_zero_padded_then_idle() {
    let mixer = SoundpadMixer::new(1.0);
    mixer.play(&vec![0.25f32; 100], 1);
    assert!(mixer.status().playing);
    let mut out = vec![9.0f32; 2048];
    assert_eq!(mixer.next_chunk(&mut out), 100);
    assert!(out[..100].iter().all(|&x| (x - CLIP_PEAK).abs() < 1e-6));
    assert!(out[100..].iter().all(|&x| x == 0.0));
    assert!(!mixer.status().playing);

    assert_eq!(mixer.next_chunk(&mut out), 0);
    assert!(out.iter().all(|&x| x == 0.0));
  }

  #[test]
  fn test_clip_spanning_several_chunks() {
    let mixer = SoundpadMixer::new(1.0);
    mixer.play(&vec![0.7f32; 5000], 1);
    let mut out = vec![0.0f32; 2048];
    assert_eq!(mixer.next_chunk(&mut out), 2048);
    assert!(mixer.is_playing());
    assert_eq!(mixer.next_chunk(&mut out), 2048);
    assert_eq!(mixer.next_chunk(&mut out), 904);
    assert!(!mixer.is_playing());
  }

  #[test]
  fn test_stop_and_replay_restart_from_the_top() {
    let mixer = SoundpadMixer::new(1.0);
    mixer.play(&[0.1, 0.2, 0.3, 0.4], 1);
    let mut out = vec![0.0f32; 2];
    mixer.next_chunk(&mut out);
    mixer.stop();
    assert!(!mixer.is_playing());
    assert_eq!(mixer.next_chunk(&mut out), 0);

    mixer.play(&[0.1, 0.2, 0.3, 0.4], 1);
    mixer.next_chunk(&mut out);
    assert!((out[0] - 0.175).abs() < 1e-6);
  }

  #[test]
  fn test_silent_and_empty_clips() {
    let mixer = SoundpadMixer::new(1.0);
    mixer.play(&vec![0.0f32; 100], 1);
    assert!(mixer.is_playing());
    let mut out = vec![1.0f32; 2048];
    assert_eq!(mixer.next_chunk(&mut out), 100);
    assert!(out.iter().all(|&x| x == 0.0));
    assert!(!mixer.is_playing());

    assert_eq!(mixer.play(&[], 1), 0);
    assert!(!mixer.is_playing());
  }

  #[test]
  fn test_concurrent_control_never_tears_a_chunk() {
    use std::sync::atomic::{AtomicBool, Ordering};

    let mixer = SoundpadMixer::new(1.0);
    let done = AtomicBool::new(false);
    // both clips normalize to a constant of +/- CLIP_PEAK
    let up = vec![0.3f32; 1000];
    let down = vec![-0.9f32; 1000];
    let allowed = [CLIP_PEAK, -CLIP_PEAK, CLIP_PEAK * 0.5, -CLIP_PEAK * 0.5];

    std::thread::scope(|scope| {
      scope.spawn(|| {
        for i in 0..2000 {
          match i % 3 {
            0 => { mixer.play(&up, 1); }
            1 => { mixer.play(&down, 1); }
            _ => mixer.stop(),
          }
          mixer.set_volume(if i % 2 == 0 { 1.0 } else { 0.5 });
        }
        done.store(true, Ordering::Release);
      });

      let mut out = vec![0.0f32; 256];
      while !done.load(Ordering::Acquire) {
        let n = mixer.next_chunk(&mut out);
        assert!(n <= out.len());
        if n > 0 {
          let first = out[0];
          assert!(allowed.iter().any(|v| (first - v).abs() < 1e-6), "unexpected sample {first}");
          assert!(out[..n].iter().all(|&x| x == first), "chunk mixes clips or volumes");
        }
        assert!(out[n..].iter().all(|&x| x == 0.0));
      }
    });
  }

  #[test]
  fn test_volume_is_clamped() {
    let mixer = SoundpadMixer::default();
    assert_eq!(mixer.set_volume(1.5), 1.0);
    assert_eq!(mixer.set_volume(-0.2), 0.0);
    assert_eq!(mixer.set_volume(f32::NAN), DEFAULT_VOLUME);
    assert_eq!(mixer.status().volume, DEFAULT_VOLUME);
  }
}
