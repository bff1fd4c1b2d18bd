//! Error types shared across the engine, the clip loader and the control surface.

use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration problems. These are fatal: the audio loop is not entered.
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("filter cutoff {cutoff}Hz must lie strictly between 0 and Nyquist ({nyquist}Hz)")]
  CutoffOutOfRange { cutoff: f32, nyquist: f32 },

  #[error("band-pass low edge {low}Hz must be below high edge {high}Hz")]
  InvertedBand { low: f32, high: f32 },

  #[error("filter order must be a positive even number, got {0}")]
  InvalidOrder(usize),

  #[error("invalid sample rate: {0}")]
  InvalidSampleRate(u32),

  #[error("invalid block size: {0}")]
  InvalidBlockSize(usize),

  #[error("failed to read config {path}: {source}")]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse config {path}: {source}")]
  Parse { path: PathBuf, source: serde_json::Error },
}

/// Audio device and stream failures. Recoverable: the controller stays usable, just silent.
#[derive(Error, Debug)]
pub enum AudioError {
  #[error("no {0} device available")]
  NoDevice(&'static str),

  #[error("audio device not found: {0}")]
  DeviceNotFound(String),

  #[error("failed to get device config: {0}")]
  ConfigError(String),

  #[error("failed to build audio stream: {0}")]
  StreamBuildError(String),

  #[error("failed to start audio stream: {0}")]
  StreamPlayError(String),
}

/// Soundpad clip loading failures. The mixer state is left untouched when one occurs.
#[derive(Error, Debug)]
pub enum ClipError {
  #[error("sound not found: {0}")]
  NotFound(String),

  #[error("failed to open {path}: {source}")]
  Open { path: PathBuf, source: std::io::Error },

  #[error("unsupported audio format: {0}")]
  Unsupported(String),

  #[error("failed to decode audio: {0}")]
  Decode(String),

  #[error("clip contains no samples")]
  Empty,
}

/// Offline render failures.
#[derive(Error, Debug)]
pub enum RenderError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("wav error: {0}")]
  Wav(#[from] hound::Error),

  #[error("unsupported wav format: {bits}-bit {format:?}")]
  Format { bits: u16, format: hound::SampleFormat },

  #[error("input contains no samples")]
  Empty,
}

pub type AudioResult<T> = Result<T, AudioError>;
pub type ClipResult<T> = Result<T, ClipError>;
